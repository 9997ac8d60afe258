//! # gmailsend-mime
//!
//! Multipart MIME message building and parsing for the Gmail `raw` send API.
//!
//! ## Features
//!
//! - **Message building**: `multipart/mixed` messages with a plain text body
//!   and any number of base64 attachments
//! - **Raw encoding**: base64url output ready for `users.messages.send`
//! - **Message parsing**: split a multipart message back into its parts
//! - **MIME type resolution**: extension lookup with a declared-type fallback
//!
//! ## Quick Start
//!
//! ### Building a Message
//!
//! ```ignore
//! use gmailsend_mime::{Attachment, MessageBuilder};
//!
//! let raw = MessageBuilder::new()
//!     .to("recipient@example.com")
//!     .subject("Report")
//!     .text_body("Please find the report attached.")
//!     .attach(Attachment::new("report.pdf", "application/pdf", pdf_bytes))
//!     .build_raw()?;
//!
//! // `raw` goes straight into `{"raw": ...}`
//! ```
//!
//! ### Parsing a Message
//!
//! ```ignore
//! use gmailsend_mime::{Message, encoding::decode_base64url};
//!
//! let text = String::from_utf8(decode_base64url(&raw)?)?;
//! let message = Message::parse(&text)?;
//! println!("Subject: {}", message.subject().unwrap_or("(no subject)"));
//! println!("Body: {}", message.text_part()?);
//! ```
//!
//! ### Resolving Attachment Types
//!
//! ```ignore
//! use gmailsend_mime::resolve_mime_type;
//!
//! assert_eq!(resolve_mime_type("notes.txt", None), "text/plain");
//! assert_eq!(resolve_mime_type("blob", Some("image/png")), "image/png");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use builder::{Attachment, MessageBuilder, generate_boundary, resolve_mime_type};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
