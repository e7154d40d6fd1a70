//! Server and API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use super::api::ErrorResponse;
use crate::conversation::UnknownPhase;
use crate::feedback::{FeedbackError, ValidationError};

/// Errors that can occur while starting or running the server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Server error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Errors returned to HTTP callers as JSON `{"error": ...}` bodies.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    UnknownPhase(#[from] UnknownPhase),

    #[error("No analytics for module: {0}")]
    NoAnalytics(String),

    #[error(transparent)]
    Storage(FeedbackError),
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::Validation(v) => Self::Validation(v),
            other => Self::Storage(other),
        }
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) | Self::UnknownPhase(_) | Self::NoAnalytics(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let fields = match &self {
            Self::Validation(v) => v.fields().into_iter().map(String::from).collect(),
            _ => Vec::new(),
        };
        let body = ErrorResponse {
            error: self.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}
