//! MIME building and parsing errors.

use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or reading back a message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A Content-Type value could not be parsed.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// An encoded body or raw payload is not valid base64.
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A text body is not valid UTF-8.
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// A multipart Content-Type carries no boundary parameter.
    #[error("multipart content type has no boundary")]
    MissingBoundary,

    /// The multipart body does not follow its boundary layout.
    #[error("Malformed multipart body: {0}")]
    InvalidMultipart(String),

    /// The builder was asked for a message without a required header.
    #[error("Header {0} is required")]
    MissingHeader(String),

    /// Other structural problem.
    #[error("Parse error: {0}")]
    Parse(String),
}
