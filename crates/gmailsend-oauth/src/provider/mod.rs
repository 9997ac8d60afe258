//! Authorization server endpoints.
//!
//! Only Google is wired up; [`Provider::new`] exists so tests can point the
//! flow at a local mock server.

use crate::error::{Error, Result};
use url::Url;

/// Scope that allows sending mail and nothing else.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Where the browser is sent for consent and where codes are redeemed.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Display name used in logs.
    pub name: String,
    /// Consent page.
    pub auth_url: Url,
    /// Code redemption endpoint.
    pub token_url: Url,
    /// Scopes requested when the caller names none.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Describes an authorization server by its two endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if either endpoint does not parse.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        let auth_url = Url::parse(auth_url.as_ref())?;
        let token_url = Url::parse(token_url.as_ref())?;
        Ok(Self {
            name: name.into(),
            auth_url,
            token_url,
            default_scopes: Vec::new(),
        })
    }

    /// Replaces the scopes requested by default.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Google, asking for [`GMAIL_SEND_SCOPE`] only.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the endpoints are constants.
    pub fn google() -> Result<Self> {
        Ok(Self::new("Google", GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL)?
            .with_default_scopes(vec![GMAIL_SEND_SCOPE.to_string()]))
    }

    /// Checks that both endpoints are hierarchical URLs and at least one
    /// default scope is set.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.auth_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "auth_url {} is not a hierarchical URL",
                self.auth_url
            )));
        }
        if self.token_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "token_url {} is not a hierarchical URL",
                self.token_url
            )));
        }
        if self.default_scopes.is_empty() {
            return Err(Error::InvalidConfig("no default scopes".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert_eq!(provider.default_scopes, vec![GMAIL_SEND_SCOPE.to_string()]);
        provider.validate().unwrap();
    }

    #[test]
    fn test_custom_provider() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap()
        .with_default_scopes(vec!["email".to_string()]);

        assert_eq!(provider.name, "Custom");
        provider.validate().unwrap();
    }

    #[test]
    fn test_provider_without_scopes_is_invalid() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap();
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_provider_rejects_bad_url() {
        assert!(matches!(
            Provider::new("Bad", "not a url", "https://auth.example.com/token"),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn test_provider_rejects_opaque_url() {
        let provider = Provider::new("Opaque", "mailto:a@b.com", "https://auth.example.com/token")
            .unwrap()
            .with_default_scopes(vec!["email".to_string()]);
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }
}
