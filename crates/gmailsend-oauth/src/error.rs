//! Errors from the consent flow and the token store.

use std::io;

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between the consent URL and a stored token.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The token file could not be read or written.
    #[error("Token file error: {0}")]
    Io(#[from] io::Error),

    /// The token endpoint could not be reached.
    #[error("Token endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A token record or endpoint reply is not the JSON we expect.
    #[error("Unexpected JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The token endpoint refused the request.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// `OAuth2` error code such as `invalid_grant`.
        error: String,
        /// Text the provider attached to the code.
        description: String,
    },

    /// Endpoints or scopes are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An endpoint URL does not parse.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Builds [`Error::OAuth`] from an error code and its description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }
}
