//! Reading built messages back.
//!
//! The builder only writes; this side exists so callers and tests can check
//! what was produced, part by part.

use crate::content_type::ContentType;
use crate::encoding::decode_base64;
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// `Content-Transfer-Encoding` of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// `7bit`, used for the text body.
    SevenBit,
    /// `8bit`.
    EightBit,
    /// `base64`, used for every attachment.
    Base64,
    /// `quoted-printable`. Recognised but never decoded.
    QuotedPrintable,
    /// `binary`.
    Binary,
}

impl TransferEncoding {
    /// Reads a header value. Unknown values mean `7bit`, the RFC 2045 default.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }

    /// Header spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn content_type_of(headers: &Headers) -> Result<ContentType> {
    headers
        .get("content-type")
        .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
}

/// Splits raw text into its header block and body at the first blank line.
fn split_head_body(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n")
        .or_else(|| raw.split_once("\n\n"))
        .unwrap_or((raw, ""))
}

/// One section between boundary delimiters.
#[derive(Debug, Clone)]
pub struct Part {
    /// Headers of this part only.
    pub headers: Headers,
    /// Part body (raw bytes, still transfer-encoded).
    pub body: Vec<u8>,
}

impl Part {
    /// Wraps headers and an encoded body.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Parses a part from its raw text (headers, blank line, body).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (head, body) = split_head_body(raw);
        Self::new(Headers::parse(head), body.as_bytes().to_vec())
    }

    /// Declared content type; `text/plain` when the header is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the header does not parse.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Declared transfer encoding; `7bit` when the header is absent.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the `filename` parameter of the Content-Disposition header.
    ///
    /// The value is taken up to the closing quote; quotes inside the name
    /// are not unescaped.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        let disposition = self.headers.get("content-disposition")?;
        let (_, rest) = disposition.split_once("filename=")?;
        let rest = rest.trim();
        match rest.strip_prefix('"') {
            Some(quoted) => Some(quoted.rsplit_once('"').map_or(quoted, |(name, _)| name)),
            None => Some(rest.split(';').next().unwrap_or(rest).trim()),
        }
    }

    /// True when Content-Disposition starts with `attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|d| d.trim_start().to_lowercase().starts_with("attachment"))
    }

    /// Undoes the transfer encoding. Line breaks inside base64 are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid base64 and for quoted-printable bodies.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => {
                let compact: String = String::from_utf8_lossy(&self.body)
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                decode_base64(&compact)
            }
            TransferEncoding::QuotedPrintable => Err(Error::Parse(
                "quoted-printable bodies are not supported".to_string(),
            )),
            _ => Ok(self.body.clone()),
        }
    }

    /// Decoded body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the bytes are not UTF-8.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        String::from_utf8(decoded).map_err(Into::into)
    }
}

/// A whole message: top-level headers plus either parts or a single body.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level headers (To, Subject, MIME-Version, Content-Type).
    pub headers: Headers,
    /// Message parts (empty for single-part messages).
    pub parts: Vec<Part>,
    /// Body for single-part messages.
    pub body: Option<Vec<u8>>,
}

impl Message {
    /// Creates a single-part message.
    #[must_use]
    pub const fn single_part(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            parts: Vec::new(),
            body: Some(body),
        }
    }

    /// Creates a multipart message.
    #[must_use]
    pub const fn multipart(headers: Headers, parts: Vec<Part>) -> Self {
        Self {
            headers,
            parts,
            body: None,
        }
    }

    /// Parses a message from its MIME text.
    ///
    /// Multipart bodies are split on the boundary declared in the
    /// Content-Type header; the closing delimiter must be present.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is invalid, a multipart message
    /// has no boundary, or the closing delimiter is missing.
    pub fn parse(text: &str) -> Result<Self> {
        let (head, body) = split_head_body(text);
        let headers = Headers::parse(head);

        let content_type = content_type_of(&headers)?;

        if !content_type.is_multipart() {
            return Ok(Self::single_part(headers, body.as_bytes().to_vec()));
        }

        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        let delimiter = format!("--{boundary}");
        let terminator = format!("--{boundary}--");

        let mut parts = Vec::new();
        let mut current: Option<Vec<&str>> = None;
        let mut closed = false;

        for line in body.lines() {
            if line == terminator {
                if let Some(lines) = current.take() {
                    parts.push(Part::parse(&lines.join("\r\n")));
                }
                closed = true;
                break;
            }
            if line == delimiter {
                if let Some(lines) = current.take() {
                    parts.push(Part::parse(&lines.join("\r\n")));
                }
                current = Some(Vec::new());
                continue;
            }
            // Anything before the first delimiter is preamble
            if let Some(lines) = current.as_mut() {
                lines.push(line);
            }
        }

        if !closed {
            return Err(Error::InvalidMultipart(format!(
                "missing closing delimiter {terminator}"
            )));
        }

        Ok(Self::multipart(headers, parts))
    }

    /// Top-level content type; `text/plain` when the header is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the header does not parse.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// True for `multipart/*`.
    ///
    /// # Errors
    ///
    /// Returns an error if content type cannot be determined.
    pub fn is_multipart(&self) -> Result<bool> {
        Ok(self.content_type()?.is_multipart())
    }

    /// The `To` header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// The `Subject` header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Body text of a single-part message.
    ///
    /// # Errors
    ///
    /// Returns an error if this is a multipart message or decoding fails.
    pub fn body_text(&self) -> Result<String> {
        if !self.parts.is_empty() {
            return Err(Error::InvalidMultipart(
                "Use parts for multipart messages".to_string(),
            ));
        }

        let body = self
            .body
            .as_ref()
            .ok_or_else(|| Error::Parse("No body".to_string()))?;

        Part::new(self.headers.clone(), body.clone()).body_text()
    }

    /// Text of the first inline `text/plain` part.
    ///
    /// # Errors
    ///
    /// Returns an error if no text part is found or decoding fails.
    pub fn text_part(&self) -> Result<String> {
        for part in &self.parts {
            if part.is_attachment() {
                continue;
            }
            if part.content_type()?.essence() == "text/plain" {
                return part.body_text();
            }
        }

        Err(Error::Parse("No text/plain part found".to_string()))
    }

    /// Attachment parts in the order they were added.
    pub fn attachments(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|p| p.is_attachment())
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

    const MULTIPART: &str = concat!(
        "To: a@b.com\r\n",
        "Subject: Hi\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/mixed; boundary=\"xyz\"\r\n",
        "\r\n",
        "--xyz\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "Content-Transfer-Encoding: 7bit\r\n",
        "\r\n",
        "Hello\r\n",
        "--xyz\r\n",
        "Content-Type: text/plain\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "Content-Disposition: attachment; filename=\"notes.txt\"\r\n",
        "\r\n",
        "bm90ZXM=\r\n",
        "--xyz--"
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_parse_multipart() {
        let message = Message::parse(MULTIPART).unwrap();
        assert!(message.is_multipart().unwrap());
        assert_eq!(message.to(), Some("a@b.com"));
        assert_eq!(message.subject(), Some("Hi"));
        assert_eq!(message.parts.len(), 2);
        assert_eq!(message.text_part().unwrap(), "Hello");

        let attachments: Vec<_> = message.attachments().collect();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename(), Some("notes.txt"));
        assert_eq!(attachments[0].decode_body().unwrap(), b"notes");
    }

    #[test]
    fn test_parse_missing_terminator() {
        let truncated = MULTIPART.trim_end_matches("--xyz--");
        assert!(matches!(
            Message::parse(truncated),
            Err(Error::InvalidMultipart(_))
        ));
    }

    #[test]
    fn test_parse_missing_boundary() {
        let text = "Content-Type: multipart/mixed\r\n\r\nbody";
        assert!(matches!(Message::parse(text), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_parse_single_part() {
        let text = "Subject: Plain\r\nContent-Type: text/plain\r\n\r\nJust text";
        let message = Message::parse(text).unwrap();
        assert!(!message.is_multipart().unwrap());
        assert_eq!(message.body_text().unwrap(), "Just text");
        assert!(message.text_part().is_err());
    }

    #[test]
    fn test_part_filename_keeps_inner_quotes() {
        let mut headers = Headers::new();
        headers.add(
            "content-disposition",
            "attachment; filename=\"say \"hi\".txt\"",
        );
        let part = Part::new(headers, Vec::new());
        assert_eq!(part.filename(), Some("say \"hi\".txt"));
        assert!(part.is_attachment());
    }
}
