//! Gmail REST API client.
//!
//! Only `users.messages.send` is needed: the message is built locally and
//! handed over as a base64url `raw` payload.

use super::send::SendError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Request body for `users.messages.send`.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

/// Subset of the Gmail `Message` resource returned by a send.
#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Gmail API client.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    api_base: String,
}

impl GmailClient {
    /// Creates a client for the given API base, e.g.
    /// `https://gmail.googleapis.com/gmail/v1`.
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Uses a shared HTTP client instead of a dedicated one.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Sends a base64url-encoded message as the authenticated user.
    ///
    /// Returns the Gmail message ID.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Provider`] if Gmail rejects the message and
    /// [`SendError::Http`] if the request cannot be completed.
    pub async fn send_raw(&self, access_token: &str, raw: &str) -> Result<String, SendError> {
        let url = format!("{}/users/me/messages/send", self.api_base);
        debug!(%url, raw_len = raw.len(), "Calling Gmail send");

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&SendRequest { raw })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| body.trim().to_string());
            error!(status = status.as_u16(), %message, "Gmail rejected the message");
            return Err(SendError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendResponse = response.json().await?;
        Ok(sent.id)
    }
}
