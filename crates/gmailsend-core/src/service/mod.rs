//! Core services for the HTTP surface.
//!
//! This module provides the service layer that bridges the HTTP handlers
//! with the `OAuth2` and MIME libraries and the Gmail REST API.

pub mod auth;
pub mod gmail;
pub mod send;

pub use crate::attachment::FileCleanupError;
pub use auth::{AuthService, AuthUrlError, CodeExchangeError};
pub use gmail::GmailClient;
pub use send::{EmailSender, OutgoingEmail, SendError, SendReceipt};

use crate::attachment::{UploadDir, UploadPolicy};
use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::Result;
use gmailsend_oauth::{Provider, TokenStore};
use tracing::info;

/// Every service wired to one configuration. The auth and send services
/// share a single token store.
#[derive(Debug, Clone)]
pub struct Services {
    /// Consent URL, code exchange and status.
    pub auth: AuthService,
    /// Send invoker.
    pub sender: EmailSender,
    /// Upload limits.
    pub policy: UploadPolicy,
    /// Where uploads are written.
    pub uploads: UploadDir,
}

impl Services {
    /// Loads the client secrets named by the config and wires the services
    /// against Google.
    ///
    /// # Errors
    ///
    /// Returns an error if the client secrets cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = Credentials::load(&config.credentials_path)?;
        Ok(Self::new(config, &credentials, Provider::google()?))
    }

    /// Wires the services from already loaded credentials.
    ///
    /// The token endpoint and the Gmail API are reached through one shared
    /// HTTP connection pool.
    #[must_use]
    pub fn new(config: &Config, credentials: &Credentials, provider: Provider) -> Self {
        let http = reqwest::Client::new();
        let store = TokenStore::new(&config.token_path);
        let oauth = credentials
            .oauth_client(provider)
            .with_http_client(http.clone());
        let gmail = GmailClient::new(&config.gmail_api_base).with_http_client(http);
        Self {
            auth: AuthService::with_client(oauth, store.clone()),
            sender: EmailSender::new(store, gmail),
            policy: UploadPolicy::new(config.max_attachments, config.max_attachment_bytes),
            uploads: UploadDir::new(&config.upload_dir),
        }
    }

    /// Creates the upload directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn prepare(&self) -> Result<()> {
        self.uploads.ensure().await?;
        info!(
            uploads = %self.uploads.root().display(),
            token = %self.auth.token_store().path().display(),
            "Services ready"
        );
        Ok(())
    }
}
