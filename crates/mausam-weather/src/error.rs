//! Weather and geocoding error types.

use mausam_core::{AppError, ReqwestErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Location not found: {0}. Please check spelling and try again.")]
    LocationNotFound(String),

    #[error("{service} error: {status}")]
    UpstreamStatus { service: &'static str, status: u16 },

    #[error("{service} network error: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WeatherError {
    /// Wrap a transport failure, naming the provider it came from.
    pub(crate) fn network(service: &'static str, source: reqwest::Error) -> Self {
        Self::Network { service, source }
    }
}

/// Turn a non-2xx provider response into `UpstreamStatus`.
pub(crate) fn ensure_success(
    response: reqwest::Response,
    service: &'static str,
) -> Result<reqwest::Response, WeatherError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::debug!("{} returned status {}", service, status);
        Err(WeatherError::UpstreamStatus {
            service,
            status: status.as_u16(),
        })
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        let message = e.to_string();
        match e {
            WeatherError::LocationNotFound(_) => AppError::NotFound(message),
            WeatherError::UpstreamStatus { .. } => AppError::UpstreamUnavailable(message),
            WeatherError::Network { service, source } => source.into_app_error(service),
            WeatherError::Parse(_) => AppError::Unclassified(message),
            WeatherError::InvalidInput(msg) => AppError::InvalidInput(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = WeatherError::LocationNotFound("atlantis".into());
        assert!(err.to_string().contains("atlantis"));
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 404);
    }

    #[test]
    fn test_upstream_status_maps_to_502() {
        let err = WeatherError::UpstreamStatus {
            service: "Geocoding service",
            status: 503,
        };
        assert_eq!(err.to_string(), "Geocoding service error: 503");
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 502);
    }

    #[test]
    fn test_parse_maps_to_500() {
        let app: AppError = WeatherError::Parse("bad latitude".into()).into();
        assert_eq!(app.status_code(), 500);
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let app: AppError = WeatherError::InvalidInput("state is required".into()).into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.to_string(), "state is required");
    }
}
