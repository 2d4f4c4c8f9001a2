pub mod results;
pub mod runs;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::error::StatisticError;

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Redis(String),
    BadRequest(String),
    Internal(String),
    AlreadyRunning,
}

impl From<StatisticError> for AppError {
    fn from(e: StatisticError) -> Self {
        match e {
            StatisticError::InvalidArgument(msg) => Self::BadRequest(msg),
            StatisticError::NotFound(msg) => Self::NotFound(msg),
            StatisticError::Redis(e) => Self::Redis(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Redis(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Redis: {msg}"))
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::AlreadyRunning => {
                (StatusCode::CONFLICT, "A run is already in progress".into())
            }
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        }

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormatError, LifecycleError};

    #[test]
    fn statistic_errors_map_to_statuses() {
        let cases = [
            (StatisticError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (StatisticError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                StatisticError::Format { line: 2, source: FormatError::FieldCount { found: 1 } },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (LifecycleError::NotAttached.into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::from(error).into_response().status(), status);
        }
        assert_eq!(AppError::AlreadyRunning.into_response().status(), StatusCode::CONFLICT);
    }
}
