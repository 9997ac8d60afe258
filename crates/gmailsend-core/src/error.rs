//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur while assembling the services.
#[derive(Debug, Error)]
pub enum Error {
    /// Client secrets could not be loaded.
    #[error("Credentials error: {0}")]
    Credentials(#[from] crate::credentials::CredentialsError),

    /// `OAuth2` setup failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] gmailsend_oauth::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
