//! Single-record token storage on local disk.

use super::{Token, TokenState};
use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed store holding at most one token.
///
/// Every save overwrites the whole file. There is no locking: concurrent
/// exchanges race and the last writer wins.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored token.
    ///
    /// A missing file is [`TokenState::Absent`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<TokenState> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored token");
                return Ok(TokenState::Absent);
            }
            Err(e) => return Err(e.into()),
        };

        let token: Token = serde_json::from_str(&contents)?;
        Ok(TokenState::Present(token))
    }

    /// Persists a token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string(token)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "Stored token");
        Ok(())
    }

    /// Reports whether a token record exists.
    ///
    /// This is a presence check only: neither the contents nor the expiry
    /// of the record are consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's existence cannot be determined.
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }
}
