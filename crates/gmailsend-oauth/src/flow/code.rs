//! Consent redirect and code redemption.

use super::OAuthClient;
use crate::error::Result;
use crate::token::Token;
use url::Url;

/// The two halves of a web sign-in.
///
/// The browser is sent to [`AuthorizationCodeFlow::authorization_url`] and
/// Google redirects back with a one-time code, which
/// [`AuthorizationCodeFlow::exchange_code`] trades for a [`Token`].
#[derive(Debug, Clone)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
}

impl AuthorizationCodeFlow {
    /// Wraps a configured client.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client }
    }

    /// Consent page URL asking for offline access.
    ///
    /// `scopes` overrides the provider defaults. No `state` or PKCE values
    /// are added, so repeated calls return the same URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider configuration is invalid.
    pub fn authorization_url(&self, scopes: Option<&[String]>) -> Result<Url> {
        let client = &self.client;
        client.provider.validate()?;

        let scope = scopes
            .unwrap_or(client.provider.default_scopes.as_slice())
            .join(" ");

        let mut url = client.provider.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &client.client_id)
            .append_pair("response_type", "code")
            .extend_pairs(client.redirect_uri.iter().map(|uri| ("redirect_uri", uri)))
            .extend_pairs((!scope.is_empty()).then_some(("scope", scope.as_str())));

        Ok(url)
    }

    /// Redeems the code Google appended to the redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is invalid, expired or already used,
    /// or if the token endpoint cannot be reached.
    pub async fn exchange_code(&self, code: &str) -> Result<Token> {
        self.client.exchange_code(code).await
    }
}
