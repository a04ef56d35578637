//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Report(ReportError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Report(err) => match &err {
                ReportError::InvalidWindow { .. } => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("INVALID_WINDOW", err.to_string()),
                ),
                ReportError::InvalidDate(_) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("INVALID_DATE", err.to_string()),
                ),
                ReportError::UnknownMetric(_) => (
                    StatusCode::NOT_FOUND,
                    ApiError::new("UNKNOWN_METRIC", err.to_string()),
                ),
                ReportError::FetchFailure(cause) => {
                    tracing::error!(error = %cause, context = %cause.context(), "fetch failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("FETCH_FAILURE", "failed to load report data")
                            .with_details(cause.to_string()),
                    )
                }
            },
        };

        (status, Json(error)).into_response()
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::Report(err)
    }
}

impl From<crate::db::repository::RepositoryError> for AppError {
    fn from(err: crate::db::repository::RepositoryError) -> Self {
        AppError::Report(ReportError::FetchFailure(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RepositoryError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_report_error_status_codes() {
        assert_eq!(
            status_of(ReportError::InvalidDate("2025-13-01".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ReportError::UnknownMetric("beds".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepositoryError::timeout("live store").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
