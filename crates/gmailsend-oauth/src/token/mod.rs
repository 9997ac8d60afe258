//! Tokens as issued by the token endpoint and as kept on disk.

mod store;

pub use store::TokenStore;

use crate::error::Error;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Margin applied by [`Token::is_expired`].
const EXPIRY_SKEW_SECS: i64 = 60;

/// The credential pair Gmail calls are made with.
///
/// This is also the on-disk record: absent fields are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer credential for API calls.
    pub access_token: String,
    /// Almost always `Bearer`.
    pub token_type: String,
    /// When the access token stops working, if the provider said.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Long-lived credential; Google only issues one with `access_type=offline`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Space separated scopes actually granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Token {
    /// Creates a token with only the access part set.
    #[must_use]
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_at: None,
            refresh_token: None,
            scope: None,
        }
    }

    /// Converts a token endpoint reply, turning `expires_in` into an
    /// absolute deadline.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        let TokenResponse {
            access_token,
            token_type,
            expires_in,
            refresh_token,
            scope,
        } = response;

        Self {
            access_token,
            token_type,
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(i64::from(secs))),
            refresh_token,
            scope,
        }
    }

    /// True once the deadline is less than a minute away.
    ///
    /// Informational only; nothing refuses to use an expired token.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= deadline)
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the granted scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Whether the service is signed in.
///
/// Presence of a record is all that counts; a stale token is still
/// [`TokenState::Present`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenState {
    /// Nothing stored yet.
    #[default]
    Absent,
    /// A record exists, possibly expired.
    Present(Token),
}

impl TokenState {
    /// True for [`TokenState::Present`].
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// The stored token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        match self {
            Self::Present(token) => Some(token),
            Self::Absent => None,
        }
    }
}

/// Successful reply from the token endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Bearer credential.
    pub access_token: String,
    /// Credential type.
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
    /// Present on first consent with offline access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Error reply from the token endpoint (RFC 6749 section 5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Code such as `invalid_grant`.
    pub error: String,
    /// Optional explanation.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts the reply into [`Error::OAuth`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
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
    fn test_bare_token_never_expires() {
        let token = Token::new("ya29.a", "Bearer");
        assert_eq!(token.expires_at, None);
        assert_eq!(token.refresh_token, None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_expiry_skew() {
        let now = Utc::now();
        let inside_skew = Token::new("a", "Bearer").with_expires_at(now + Duration::seconds(30));
        let past = Token::new("a", "Bearer").with_expires_at(now - Duration::minutes(5));
        let later = Token::new("a", "Bearer").with_expires_at(now + Duration::hours(1));

        assert!(inside_skew.is_expired());
        assert!(past.is_expired());
        assert!(!later.is_expired());
    }

    #[test]
    fn test_google_reply_becomes_token() {
        let reply: TokenResponse = serde_json::from_str(
            r#"{
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "refresh_token": "1//refresh",
                "scope": "https://www.googleapis.com/auth/gmail.send",
                "token_type": "Bearer"
            }"#,
        )
        .unwrap();

        let token = Token::from_response(reply);
        assert_eq!(token.access_token, "ya29.fresh");
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
        let deadline = token.expires_at.unwrap();
        assert!(deadline > Utc::now() + Duration::minutes(59));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_json_omits_missing_fields() {
        let json = serde_json::to_value(Token::new("a", "Bearer")).unwrap();
        assert_eq!(json, serde_json::json!({ "access_token": "a", "token_type": "Bearer" }));
    }

    #[test]
    fn test_token_state() {
        assert!(!TokenState::Absent.is_present());
        assert!(TokenState::Absent.token().is_none());
        assert_eq!(TokenState::default(), TokenState::Absent);

        let state = TokenState::Present(Token::new("a", "Bearer").with_scope("send"));
        assert!(state.is_present());
        assert_eq!(state.token().unwrap().scope.as_deref(), Some("send"));
    }

    #[test]
    fn test_error_response_into_error() {
        let response: ErrorResponse =
            serde_json::from_str(r#"{"error":"invalid_grant"}"#).unwrap();
        assert!(matches!(
            response.into_error(),
            Error::OAuth { error, description } if error == "invalid_grant" && description.is_empty()
        ));
    }
}
