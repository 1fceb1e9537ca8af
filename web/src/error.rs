//! HTTP error mapping.
//!
//! [`AppError`] turns a [`BookingError`] into a status code, a stable error
//! code and a caller-safe message, and renders as a JSON body through
//! Axum's `IntoResponse`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hydra_core::BookingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned by web handlers.
///
/// The message is what the caller sees. For server errors the original
/// error is kept in `source` for the log line only.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create an error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 400 with `BAD_REQUEST`.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 500 with `INTERNAL_SERVER_ERROR`.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", message)
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Caller-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::InvalidArgument(_) => Self::bad_request(message),
            BookingError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            BookingError::CapacityExceeded { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "CAPACITY_EXCEEDED", message)
            }
            BookingError::SlotConflict { .. } => {
                Self::new(StatusCode::CONFLICT, "SLOT_CONFLICT", message)
            }
            BookingError::InvalidState { .. } => {
                Self::new(StatusCode::CONFLICT, "INVALID_STATE", message)
            }
            BookingError::Cancelled => {
                Self::new(StatusCode::REQUEST_TIMEOUT, "TIMEOUT", "Request was cancelled")
            }
            BookingError::Storage(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "The service is temporarily unavailable",
            )
            .with_source(err),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// JSON error body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = ?source,
                    "Request failed"
                ),
                None => tracing::error!(status = %self.status, code = self.code, "Request failed"),
            }
        } else {
            tracing::debug!(status = %self.status, code = self.code, message = %self.message, "Request rejected");
        }

        let body = ErrorBody {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hydra_core::{
        BookingAction, BookingId, BookingStatus, EntityKind, StorageError, Utc, VenueId,
    };

    #[test]
    fn caller_errors_keep_their_message() {
        let cases = [
            (
                BookingError::InvalidArgument("Party size must be greater than 0".to_string()),
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
            ),
            (
                BookingError::not_found(EntityKind::Venue, VenueId::new()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                BookingError::CapacityExceeded {
                    party_size: 9,
                    capacity: 4,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "CAPACITY_EXCEEDED",
            ),
            (
                BookingError::SlotConflict {
                    venue_id: VenueId::new(),
                    start_utc: Utc::now(),
                    end_utc: Utc::now(),
                },
                StatusCode::CONFLICT,
                "SLOT_CONFLICT",
            ),
            (
                BookingError::InvalidState {
                    booking_id: BookingId::new(),
                    current: BookingStatus::Seated,
                    action: BookingAction::Cancel,
                },
                StatusCode::CONFLICT,
                "INVALID_STATE",
            ),
        ];

        for (err, status, code) in cases {
            let expected = err.to_string();
            let app = AppError::from(err);
            assert_eq!(app.status(), status);
            assert_eq!(app.code(), code);
            assert_eq!(app.message(), expected);
        }
    }

    #[test]
    fn cancelled_is_a_timeout() {
        let app = AppError::from(BookingError::Cancelled);
        assert_eq!(app.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(app.code(), "TIMEOUT");
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let app = AppError::from(BookingError::Storage(StorageError::Database(
            "password authentication failed for user \"hydra\"".to_string(),
        )));

        assert_eq!(app.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!app.message().contains("password"));
        assert!(std::error::Error::source(&app).is_some());
    }

    #[tokio::test]
    async fn renders_json_body() {
        let response = AppError::bad_request("Start time must be before end time").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            ErrorBody {
                code: "BAD_REQUEST".to_string(),
                message: "Start time must be before end time".to_string(),
            }
        );
    }
}
