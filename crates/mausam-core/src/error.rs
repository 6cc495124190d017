//! Centralized error taxonomy for the Mausam service.
//!
//! Every failure that reaches the HTTP boundary is one of four kinds:
//! - `NotFound`: the input was understood but no location matched
//! - `UpstreamUnavailable`: a provider answered non-2xx or could not be reached
//! - `InvalidInput`: a required parameter is missing or empty
//! - `Unclassified`: anything else (malformed payloads, local failures)

use thiserror::Error;

/// Top-level application error type.
///
/// Crate-local errors (weather, assistant) convert into this type. The
/// carried message is what API clients see in the `detail` field.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unclassified(String),
}

impl AppError {
    /// HTTP status code for this error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::UpstreamUnavailable(_) => 502,
            AppError::InvalidInput(_) => 400,
            AppError::Unclassified(_) => 500,
        }
    }
}

/// Extension trait for classifying reqwest errors.
pub trait ReqwestErrorExt {
    /// Classify this error, naming the provider it came from.
    fn into_app_error(self, service: &str) -> AppError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_app_error(self, service: &str) -> AppError {
        if self.is_timeout() {
            AppError::UpstreamUnavailable(format!("{} request timed out", service))
        } else if let Some(status) = self.status() {
            AppError::UpstreamUnavailable(format!(
                "{} error: {}",
                service,
                status.as_u16()
            ))
        } else if self.is_decode() {
            AppError::Unclassified(format!("{} returned an unreadable response: {}", service, self))
        } else if self.is_connect() || self.is_request() {
            AppError::UpstreamUnavailable(format!("Upstream error: {}", self))
        } else {
            AppError::Unclassified(format!("{} failed: {}", service, self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::UpstreamUnavailable("x".into()).status_code(), 502);
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(AppError::Unclassified("x".into()).status_code(), 500);
    }

    #[test]
    fn test_display_is_the_detail_message() {
        let err = AppError::NotFound("Location not found: Atlantis".into());
        assert_eq!(err.to_string(), "Location not found: Atlantis");
    }
}
