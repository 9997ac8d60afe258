//! The registered client and its code redemption call.

mod code;

pub use code::AuthorizationCodeFlow;

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Form body for the `authorization_code` grant.
#[derive(Debug, Serialize)]
struct CodeGrant<'a> {
    grant_type: &'static str,
    code: &'a str,
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

/// An application registered with the provider.
#[derive(Clone)]
pub struct OAuthClient {
    /// Client ID issued by the provider.
    pub client_id: String,
    /// Client secret; web applications always have one.
    pub client_secret: Option<String>,
    /// Where the provider sends the browser back with `?code=`.
    pub redirect_uri: Option<String>,
    /// Endpoints and default scopes.
    pub provider: Provider,
    http_client: Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("redirect_uri", &self.redirect_uri)
            .field("provider", &self.provider.name)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Creates a client with no secret and no redirect URI.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI. It must match one registered with the provider.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Uses a shared HTTP client instead of a dedicated one.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Redeems a one-time authorization code at the token endpoint.
    pub(crate) async fn exchange_code(&self, code: &str) -> Result<Token> {
        let grant = CodeGrant {
            grant_type: "authorization_code",
            code,
            client_id: &self.client_id,
            client_secret: self.client_secret.as_deref(),
            redirect_uri: self.redirect_uri.as_deref(),
        };

        debug!(provider = %self.provider.name, token_url = %self.provider.token_url, "Redeeming authorization code");

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&grant)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let reply: TokenResponse = response.json().await?;
            return Ok(Token::from_response(reply));
        }

        let body = response.text().await?;
        // Google answers with a JSON error object; proxies may not
        Err(serde_json::from_str::<ErrorResponse>(&body).map_or_else(
            |_| Error::oauth_error(status.as_str(), body.trim()),
            ErrorResponse::into_error,
        ))
    }
}
