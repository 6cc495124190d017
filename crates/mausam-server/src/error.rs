//! Error to HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mausam_core::AppError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Handler error: any [`AppError`] rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl ApiError {
    /// Malformed or missing query parameters.
    pub fn bad_query(rejection: QueryRejection) -> Self {
        Self(AppError::InvalidInput(rejection.body_text()))
    }

    /// Unreadable JSON request body.
    pub fn bad_json(rejection: JsonRejection) -> Self {
        Self(AppError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self.0 {
            AppError::UpstreamUnavailable(_) | AppError::Unclassified(_) => {
                tracing::error!("Request failed ({}): {}", status, self.0)
            }
            AppError::NotFound(_) | AppError::InvalidInput(_) => {
                tracing::info!("Request rejected ({}): {}", status, self.0)
            }
        }

        let body = ErrorBody {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
