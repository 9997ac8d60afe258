//! Shared application state.

use anyhow::Context;
use axum::http::HeaderValue;
use gmailsend_core::{AuthService, Config, EmailSender, Services, UploadDir, UploadPolicy};
use std::sync::Arc;

/// State handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Consent URL, code exchange and status.
    pub auth: Arc<AuthService>,
    /// Send invoker.
    pub sender: Arc<EmailSender>,
    /// Runtime configuration.
    pub config: Arc<Config>,
    /// Upload limits.
    pub policy: Arc<UploadPolicy>,
    /// Where uploads are written.
    pub uploads: UploadDir,
    /// Origin allowed by CORS, validated up front.
    pub cors_origin: HeaderValue,
}

impl AppState {
    /// Builds the state from the configuration and its services.
    ///
    /// # Errors
    ///
    /// Returns an error if the CORS origin is not a valid header value.
    pub fn new(config: Config, services: Services) -> anyhow::Result<Self> {
        let cors_origin = HeaderValue::from_str(&config.cors_origin)
            .with_context(|| format!("invalid CORS origin {:?}", config.cors_origin))?;

        Ok(Self {
            auth: Arc::new(services.auth),
            sender: Arc::new(services.sender),
            policy: Arc::new(services.policy),
            uploads: services.uploads,
            config: Arc::new(config),
            cors_origin,
        })
    }

    /// Largest request body accepted by the send route: every attachment at
    /// its size limit plus room for the text fields.
    #[must_use]
    pub fn send_body_limit(&self) -> usize {
        self.policy
            .max_files
            .saturating_mul(self.policy.max_file_bytes)
            .saturating_add(1024 * 1024)
    }
}
