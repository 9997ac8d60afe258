//! Send service.
//!
//! Builds the MIME message for an [`OutgoingEmail`], hands it to Gmail as
//! the signed-in user and removes the attachment temp files afterwards.

use super::gmail::GmailClient;
use crate::attachment::{AttachmentCleanup, AttachmentFile};
use gmailsend_mime::MessageBuilder;
use gmailsend_oauth::{TokenState, TokenStore};
use tracing::{debug, info};

/// Errors that can occur while sending.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// No token has been stored yet.
    #[error("Not authenticated with Gmail")]
    NotAuthenticated,

    /// The token file could not be read.
    #[error("Token store error: {0}")]
    TokenStore(#[from] gmailsend_oauth::Error),

    /// The message could not be built.
    #[error("Invalid message: {0}")]
    Message(#[from] gmailsend_mime::Error),

    /// An attachment temp file could not be read.
    #[error("Cannot read attachment {name}: {source}")]
    AttachmentRead {
        /// Original filename.
        name: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// An attachment violates the upload policy.
    #[error("{0}")]
    AttachmentRejected(String),

    /// An attachment exceeds the size limit.
    #[error("Attachment {name} exceeds the {limit} byte limit")]
    AttachmentTooLarge {
        /// Original filename.
        name: String,
        /// Limit in bytes.
        limit: usize,
    },

    /// Gmail refused the message (expired auth, bad recipient, quota).
    #[error("Gmail API error ({status}): {message}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Error message from Gmail.
        message: String,
    },

    /// The request to Gmail could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// An email to send. Transient: built per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body_text: String,
    /// Attachments in upload order.
    pub attachments: Vec<AttachmentFile>,
}

impl OutgoingEmail {
    /// Creates an email without attachments.
    #[must_use]
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        body_text: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body_text: body_text.into(),
            attachments: Vec::new(),
        }
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, file: AttachmentFile) -> Self {
        self.attachments.push(file);
        self
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Gmail message ID.
    pub message_id: String,
}

/// Sends email through Gmail using the stored token.
#[derive(Debug, Clone)]
pub struct EmailSender {
    store: TokenStore,
    gmail: GmailClient,
}

impl EmailSender {
    /// Creates a sender.
    #[must_use]
    pub const fn new(store: TokenStore, gmail: GmailClient) -> Self {
        Self { store, gmail }
    }

    /// Sends an email.
    ///
    /// Every attachment temp file is removed exactly once after the attempt,
    /// whether it succeeded or failed. Removal failures are only logged.
    /// There is no retry.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is stored, an attachment cannot be read,
    /// or Gmail rejects the message.
    pub async fn send(&self, email: OutgoingEmail) -> Result<SendReceipt, SendError> {
        let OutgoingEmail {
            to,
            subject,
            body_text,
            attachments,
        } = email;
        let cleanup = AttachmentCleanup::new(attachments);

        let result = self
            .deliver(&to, &subject, &body_text, cleanup.files())
            .await;

        drop(cleanup);
        result
    }

    async fn deliver(
        &self,
        to: &str,
        subject: &str,
        body_text: &str,
        attachments: &[AttachmentFile],
    ) -> Result<SendReceipt, SendError> {
        let token = match self.store.load().await? {
            TokenState::Present(token) => token,
            TokenState::Absent => return Err(SendError::NotAuthenticated),
        };
        if token.is_expired() {
            debug!("Stored access token looks expired; sending anyway");
        }

        let mut builder = MessageBuilder::new()
            .to(to)
            .subject(subject)
            .text_body(body_text);
        for file in attachments {
            builder = builder.attach(file.read_to_attachment().await?);
        }
        let raw = builder.build_raw()?;

        let message_id = self.gmail.send_raw(&token.access_token, &raw).await?;
        info!(%message_id, attachments = attachments.len(), "Email sent");

        Ok(SendReceipt { message_id })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gmailsend_mime::Message;
    use gmailsend_mime::encoding::decode_base64url;
    use gmailsend_oauth::Token;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    struct Fixture {
        dir: TempDir,
        server: MockServer,
        sender: EmailSender,
    }

    impl Fixture {
        async fn new(authenticated: bool) -> Self {
            let dir = TempDir::new().unwrap();
            let server = MockServer::start().await;
            let store = TokenStore::new(dir.path().join("token.json"));
            if authenticated {
                store
                    .save(&Token::new("ya29.token", "Bearer"))
                    .await
                    .unwrap();
            }
            let sender = EmailSender::new(store, GmailClient::new(server.uri()));
            Self {
                dir,
                server,
                sender,
            }
        }

        fn upload(&self, name: &str, mime_type: &str, contents: &[u8]) -> AttachmentFile {
            let path = self.dir.path().join(format!("upload-{name}"));
            std::fs::write(&path, contents).unwrap();
            AttachmentFile {
                original_name: name.to_string(),
                mime_type: mime_type.to_string(),
                path,
                size_bytes: contents.len() as u64,
            }
        }
    }

    fn raw_of(request: &Request) -> String {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let raw = body["raw"].as_str().unwrap();
        String::from_utf8(decode_base64url(raw).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_send_success_removes_attachments() {
        let fx = Fixture::new(true).await;
        Mock::given(method("POST"))
            .and(path("/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "abc123" })))
            .expect(1)
            .mount(&fx.server)
            .await;

        let notes = fx.upload("notes.txt", "text/plain", b"some notes");
        let image = fx.upload("pixel.png", "image/png", &[0x89, b'P', b'N', b'G']);
        let email = OutgoingEmail::new("a@b.com", "Hi", "Hello")
            .attach(notes.clone())
            .attach(image.clone());

        let receipt = fx.sender.send(email).await.unwrap();
        assert_eq!(receipt.message_id, "abc123");
        assert!(!notes.path.exists());
        assert!(!image.path.exists());

        let requests = fx.server.received_requests().await.unwrap();
        let text = raw_of(&requests[0]);
        assert!(text.starts_with("To: a@b.com\r\nSubject: Hi\r\n"));

        let message = Message::parse(&text).unwrap();
        assert_eq!(message.text_part().unwrap(), "Hello");
        let parts: Vec<_> = message.attachments().collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].filename(), Some("notes.txt"));
        assert_eq!(parts[0].decode_body().unwrap(), b"some notes");
        assert_eq!(parts[1].content_type().unwrap().essence(), "image/png");
        assert_eq!(parts[1].decode_body().unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_send_large_attachments_on_single_threaded_runtime() {
        let fx = Fixture::new(true).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "big" })))
            .mount(&fx.server)
            .await;

        let contents = vec![b'x'; 2 * 1024 * 1024];
        let files: Vec<_> = (0..3)
            .map(|i| fx.upload(&format!("part{i}.txt"), "text/plain", &contents))
            .collect();
        let email = files
            .iter()
            .cloned()
            .fold(OutgoingEmail::new("a@b.com", "Big", "See attached"), OutgoingEmail::attach);

        let receipt = fx.sender.send(email).await.unwrap();

        assert_eq!(receipt.message_id, "big");
        assert!(files.iter().all(|f| !f.path.exists()));

        let requests = fx.server.received_requests().await.unwrap();
        let message = Message::parse(&raw_of(&requests[0])).unwrap();
        assert_eq!(message.attachments().count(), 3);
    }

    #[tokio::test]
    async fn test_send_failure_still_removes_attachments() {
        let fx = Fixture::new(true).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": 400, "message": "Invalid To header" }
            })))
            .mount(&fx.server)
            .await;

        let file = fx.upload("a.pdf", "application/pdf", b"%PDF");
        let email = OutgoingEmail::new("not-an-address", "Hi", "Hello").attach(file.clone());

        let err = fx.sender.send(email).await.unwrap_err();
        assert!(matches!(err, SendError::Provider { status: 400, .. }));
        assert!(!file.path.exists());
    }

    #[tokio::test]
    async fn test_send_unauthenticated_removes_attachments() {
        let fx = Fixture::new(false).await;
        let file = fx.upload("a.txt", "text/plain", b"x");
        let email = OutgoingEmail::new("a@b.com", "Hi", "Hello").attach(file.clone());

        let err = fx.sender.send(email).await.unwrap_err();
        assert!(matches!(err, SendError::NotAuthenticated));
        assert!(!file.path.exists());
        assert!(fx.server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_attachments() {
        let fx = Fixture::new(true).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "x1" })))
            .mount(&fx.server)
            .await;

        let receipt = fx
            .sender
            .send(OutgoingEmail::new("a@b.com", "Hi", "Hello"))
            .await
            .unwrap();
        assert_eq!(receipt.message_id, "x1");

        let requests = fx.server.received_requests().await.unwrap();
        let message = Message::parse(&raw_of(&requests[0])).unwrap();
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.attachments().count(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_is_still_used() {
        let fx = Fixture::new(false).await;
        let expired = Token::new("old", "Bearer")
            .with_expires_at(chrono::Utc::now() - chrono::Duration::hours(1));
        TokenStore::new(fx.dir.path().join("token.json"))
            .save(&expired)
            .await
            .unwrap();
        Mock::given(method("POST"))
            .and(wiremock::matchers::header("authorization", "Bearer old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "y" })))
            .expect(1)
            .mount(&fx.server)
            .await;

        fx.sender
            .send(OutgoingEmail::new("a@b.com", "Hi", "Hello"))
            .await
            .unwrap();
    }
}
