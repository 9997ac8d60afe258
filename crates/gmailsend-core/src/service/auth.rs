//! Authentication service.
//!
//! Wraps the authorization code flow and the token store: produces the
//! consent URL, trades the callback code for a token and answers whether a
//! token is on file.

use crate::credentials::Credentials;
use gmailsend_oauth::{AuthorizationCodeFlow, OAuthClient, Provider, TokenState, TokenStore};
use tracing::{info, warn};

/// The consent URL could not be built.
#[derive(Debug, thiserror::Error)]
pub enum AuthUrlError {
    /// The provider configuration is invalid.
    #[error("Cannot build authorization URL: {0}")]
    Provider(#[from] gmailsend_oauth::Error),
}

/// The authorization code could not be turned into a stored token.
#[derive(Debug, thiserror::Error)]
pub enum CodeExchangeError {
    /// The callback carried no code.
    #[error("Authorization code is missing")]
    MissingCode,

    /// Google refused the code or could not be reached.
    #[error("Code exchange failed: {0}")]
    Rejected(gmailsend_oauth::Error),

    /// The token was issued but could not be written.
    #[error("Cannot persist token: {0}")]
    Persist(gmailsend_oauth::Error),
}

/// OAuth operations for the single local user.
#[derive(Debug, Clone)]
pub struct AuthService {
    flow: AuthorizationCodeFlow,
    store: TokenStore,
}

impl AuthService {
    /// Creates the service from client credentials.
    #[must_use]
    pub fn new(credentials: &Credentials, provider: Provider, store: TokenStore) -> Self {
        Self::with_client(credentials.oauth_client(provider), store)
    }

    /// Creates the service around an already configured client.
    #[must_use]
    pub const fn with_client(client: OAuthClient, store: TokenStore) -> Self {
        Self {
            flow: AuthorizationCodeFlow::new(client),
            store,
        }
    }

    /// Returns the consent URL for offline access with the send scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider configuration is invalid.
    pub fn auth_url(&self) -> Result<String, AuthUrlError> {
        Ok(self.flow.authorization_url(None)?.into())
    }

    /// Exchanges an authorization code and persists the resulting token,
    /// replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty, is rejected by Google, or the
    /// token cannot be saved.
    pub async fn exchange_code(&self, code: &str) -> Result<(), CodeExchangeError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CodeExchangeError::MissingCode);
        }

        let token = self.flow.exchange_code(code).await.map_err(|e| {
            warn!("Authorization code exchange failed: {e}");
            CodeExchangeError::Rejected(e)
        })?;
        if token.refresh_token.is_none() {
            warn!("Google issued no refresh token; re-consent may be needed later");
        }

        self.store
            .save(&token)
            .await
            .map_err(CodeExchangeError::Persist)?;
        info!(path = %self.store.path().display(), "Stored Gmail token");
        Ok(())
    }

    /// Returns true if a token record exists. Neither its contents nor its
    /// expiry are checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the token file's existence cannot be determined.
    pub async fn is_authenticated(&self) -> gmailsend_oauth::Result<bool> {
        self.store.is_authenticated().await
    }

    /// Loads the stored token state.
    ///
    /// # Errors
    ///
    /// Returns an error if the token file exists but cannot be read.
    pub async fn token_state(&self) -> gmailsend_oauth::Result<TokenState> {
        self.store.load().await
    }

    /// Returns the token store.
    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.store
    }
}
