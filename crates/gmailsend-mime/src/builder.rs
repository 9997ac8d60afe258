//! Multipart message building.
//!
//! Produces the `multipart/mixed` layout Gmail expects in the `raw` field:
//! one `text/plain` body part followed by one base64 part per attachment.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64, encode_base64url};
use crate::error::{Error, Result};
use crate::message::TransferEncoding;
use chrono::Utc;
use rand::Rng;

/// Content type used when neither the extension nor the upload declares one.
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Generates a boundary unique per message.
///
/// The millisecond timestamp keeps boundaries ordered in logs; the random
/// suffix separates messages built within the same millisecond.
#[must_use]
pub fn generate_boundary() -> String {
    let suffix: u64 = rand::thread_rng().r#gen();
    format!("boundary{}{suffix:016x}", Utc::now().timestamp_millis())
}

/// Resolves the content type of an attachment.
///
/// The filename extension wins; otherwise the type declared by the upload
/// is used, then `application/octet-stream`.
#[must_use]
pub fn resolve_mime_type(filename: &str, declared: Option<&str>) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .map(str::to_string)
        .or_else(|| {
            declared
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// An attachment with its content in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename shown to the recipient.
    pub filename: String,
    /// Resolved content type (e.g. `application/pdf`).
    pub content_type: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates a new attachment.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Builder for outgoing `multipart/mixed` messages.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    to: Option<String>,
    subject: String,
    text_body: String,
    attachments: Vec<Attachment>,
    boundary: Option<String>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipient.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = body.into();
        self
    }

    /// Appends an attachment. Attachments keep their insertion order.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Uses a fixed boundary instead of a generated one.
    #[must_use]
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Picks the boundary for this message.
    ///
    /// Generated boundaries are regenerated until they do not occur in the
    /// body text; a fixed boundary that collides is an error.
    fn resolve_boundary(&self) -> Result<String> {
        if let Some(boundary) = &self.boundary {
            if boundary.is_empty() || self.text_body.contains(boundary.as_str()) {
                return Err(Error::InvalidMultipart(format!(
                    "boundary {boundary:?} is empty or occurs in the message body"
                )));
            }
            return Ok(boundary.clone());
        }

        let mut boundary = generate_boundary();
        while self.text_body.contains(&boundary) {
            boundary = generate_boundary();
        }
        Ok(boundary)
    }

    /// Builds the message as CRLF-delimited MIME text.
    ///
    /// Attachment filenames are emitted verbatim inside the quoted
    /// `filename` parameter; embedded `"` characters are not escaped.
    ///
    /// # Errors
    ///
    /// Returns an error if no recipient is set or the boundary is unusable.
    pub fn build(&self) -> Result<String> {
        let to = self
            .to
            .as_deref()
            .ok_or_else(|| Error::MissingHeader("to".to_string()))?;
        let boundary = self.resolve_boundary()?;
        let delimiter = format!("--{boundary}");

        let mut lines: Vec<String> = vec![
            format!("To: {to}"),
            format!("Subject: {}", self.subject),
            "MIME-Version: 1.0".to_string(),
            format!("Content-Type: {}", ContentType::multipart_mixed(&boundary)),
            String::new(),
            delimiter.clone(),
            format!("Content-Type: {}", ContentType::text_plain()),
            format!("Content-Transfer-Encoding: {}", TransferEncoding::SevenBit),
            String::new(),
            self.text_body.clone(),
        ];

        for attachment in &self.attachments {
            lines.push(delimiter.clone());
            lines.push(format!("Content-Type: {}", attachment.content_type));
            lines.push(format!(
                "Content-Transfer-Encoding: {}",
                TransferEncoding::Base64
            ));
            lines.push(format!(
                "Content-Disposition: attachment; filename=\"{}\"",
                attachment.filename
            ));
            lines.push(String::new());
            lines.push(encode_base64(&attachment.data));
        }

        lines.push(format!("{delimiter}--"));

        Ok(lines.join("\r\n").trim().to_string())
    }

    /// Builds the message and base64url-encodes it for the Gmail `raw` field.
    ///
    /// # Errors
    ///
    /// Returns an error if [`MessageBuilder::build`] fails.
    pub fn build_raw(&self) -> Result<String> {
        Ok(encode_base64url(self.build()?.as_bytes()))
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
    use crate::encoding::decode_base64url;
    use crate::message::Message;
    use proptest::prelude::*;

    fn count_delimiters(text: &str, boundary: &str) -> usize {
        let delimiter = format!("--{boundary}");
        text.split("\r\n")
            .filter(|line| line.starts_with(&delimiter))
            .count()
    }

    #[test]
    fn test_build_simple_message() {
        let raw = MessageBuilder::new()
            .to("a@b.com")
            .subject("Hi")
            .text_body("Hello")
            .build_raw()
            .unwrap();

        let text = String::from_utf8(decode_base64url(&raw).unwrap()).unwrap();
        assert!(text.starts_with("To: a@b.com\r\nSubject: Hi\r\n"));
        assert!(text.contains("\r\n\r\nHello\r\n"));

        let message = Message::parse(&text).unwrap();
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.text_part().unwrap(), "Hello");
        assert_eq!(message.attachments().count(), 0);
    }

    #[test]
    fn test_build_exact_layout() {
        let text = MessageBuilder::new()
            .to("a@b.com")
            .subject("Hi")
            .text_body("Hello")
            .attach(Attachment::new("a.txt", "text/plain", b"abc".to_vec()))
            .boundary("b1")
            .build()
            .unwrap();

        let expected = concat!(
            "To: a@b.com\r\n",
            "Subject: Hi\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"b1\"\r\n",
            "\r\n",
            "--b1\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: 7bit\r\n",
            "\r\n",
            "Hello\r\n",
            "--b1\r\n",
            "Content-Type: text/plain\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "Content-Disposition: attachment; filename=\"a.txt\"\r\n",
            "\r\n",
            "YWJj\r\n",
            "--b1--"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_build_requires_recipient() {
        let err = MessageBuilder::new().subject("Hi").build().unwrap_err();
        assert!(matches!(err, Error::MissingHeader(h) if h == "to"));
    }

    #[test]
    fn test_build_rejects_colliding_fixed_boundary() {
        let result = MessageBuilder::new()
            .to("a@b.com")
            .text_body("contains --sep inside")
            .boundary("sep")
            .build();
        assert!(matches!(result, Err(Error::InvalidMultipart(_))));
    }

    #[test]
    fn test_build_empty_body_still_parses() {
        let text = MessageBuilder::new().to("a@b.com").build().unwrap();
        let message = Message::parse(&text).unwrap();
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.text_part().unwrap(), "");
    }

    #[test]
    fn test_filename_quotes_are_not_escaped() {
        let text = MessageBuilder::new()
            .to("a@b.com")
            .attach(Attachment::new("say \"hi\".txt", "text/plain", b"x".to_vec()))
            .build()
            .unwrap();
        assert!(text.contains("filename=\"say \"hi\".txt\""));
    }

    #[test]
    fn test_generate_boundary_unique() {
        let a = generate_boundary();
        let b = generate_boundary();
        assert!(a.starts_with("boundary"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_mime_type() {
        assert_eq!(resolve_mime_type("report.pdf", None), "application/pdf");
        assert_eq!(resolve_mime_type("photo.PNG", Some("text/plain")), "image/png");
        assert_eq!(resolve_mime_type("noext", Some("image/gif")), "image/gif");
        assert_eq!(resolve_mime_type("noext", Some("  ")), FALLBACK_MIME_TYPE);
        assert_eq!(resolve_mime_type("noext", None), FALLBACK_MIME_TYPE);
    }

    proptest! {
        #[test]
        fn prop_delimiter_count_is_attachments_plus_two(
            body in "[a-zA-Z0-9 .,!?]{0,200}",
            files in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..6),
        ) {
            let mut builder = MessageBuilder::new()
                .to("a@b.com")
                .subject("Prop")
                .text_body(body.clone())
                .boundary("propboundary");
            for (i, data) in files.iter().enumerate() {
                builder = builder.attach(Attachment::new(
                    format!("file{i}.bin"),
                    "application/octet-stream",
                    data.clone(),
                ));
            }

            let text = String::from_utf8(decode_base64url(&builder.build_raw().unwrap()).unwrap()).unwrap();
            prop_assert_eq!(count_delimiters(&text, "propboundary"), files.len() + 2);

            let message = Message::parse(&text).unwrap();
            prop_assert_eq!(message.text_part().unwrap(), body);

            let decoded: Vec<Vec<u8>> = message
                .attachments()
                .map(|p| p.decode_body().unwrap())
                .collect();
            prop_assert_eq!(decoded, files);
        }
    }
}
