//! HTTP error responses.
//!
//! Every failure is rendered as `{ "message": ... }` with a status code that
//! says who is at fault.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gmailsend_core::{AuthUrlError, SendError};
use serde::Serialize;
use tracing::error;

/// Error returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request is malformed or was refused.
    #[error("{0}")]
    BadRequest(String),

    /// An upload exceeds the size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The server is misconfigured or hit a local failure.
    #[error("{0}")]
    Internal(String),
}

/// JSON body for messages and errors.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    /// Human-readable text.
    pub message: String,
}

impl ApiError {
    /// Builds an internal error from anything displayable.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "{self}");
        }
        (
            status,
            Json(MessageBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<SendError> for ApiError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::AttachmentRejected(reason) => Self::BadRequest(reason),
            SendError::AttachmentTooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            other => Self::BadRequest(format!("Failed to send email: {other}")),
        }
    }
}

impl From<AuthUrlError> for ApiError {
    fn from(err: AuthUrlError) -> Self {
        Self::internal(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let message = err.body_text();
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::BadRequest(message)
        }
    }
}
