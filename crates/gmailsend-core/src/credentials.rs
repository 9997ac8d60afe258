//! Google OAuth client secrets.
//!
//! Reads the JSON file downloaded from the Google Cloud console. Both the
//! `web` and `installed` application layouts are accepted; the first
//! redirect URI is the one used for the code flow.

use gmailsend_oauth::{OAuthClient, Provider};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Error type for credential loading.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid client-secret JSON.
    #[error("malformed client secrets: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither a `web` nor an `installed` section is present.
    #[error("client secrets contain neither a \"web\" nor an \"installed\" section")]
    MissingClient,

    /// No redirect URI is configured.
    #[error("client secrets list no redirect_uris")]
    MissingRedirectUri,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSecretEntry>,
    installed: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// Static OAuth client credentials, loaded once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Redirect URI registered for the code flow.
    pub redirect_uri: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl Credentials {
    /// Loads credentials from a client-secret JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not usable.
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let credentials = Self::from_json(&contents)?;
        debug!(path = %path.display(), client_id = %credentials.client_id, "Loaded client secrets");
        Ok(credentials)
    }

    /// Parses credentials from client-secret JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or incomplete.
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        let entry = file
            .web
            .or(file.installed)
            .ok_or(CredentialsError::MissingClient)?;
        let redirect_uri = entry
            .redirect_uris
            .into_iter()
            .next()
            .ok_or(CredentialsError::MissingRedirectUri)?;

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            redirect_uri,
        })
    }

    /// Builds an OAuth client for the given provider.
    #[must_use]
    pub fn oauth_client(&self, provider: Provider) -> OAuthClient {
        OAuthClient::new(&self.client_id, provider)
            .with_client_secret(&self.client_secret)
            .with_redirect_uri(&self.redirect_uri)
    }
}
