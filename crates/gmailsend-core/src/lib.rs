//! # gmailsend-core
//!
//! Core services for gmailsend.
//!
//! This crate provides:
//! - Configuration from `GMAILSEND_*` environment variables
//! - Google client-secret loading
//! - Uploaded attachment files, the upload policy and temp file cleanup
//! - The Gmail API client and the send service
//! - The authentication service (consent URL, code exchange, status)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod attachment;
pub mod config;
pub mod credentials;
mod error;
pub mod service;

pub use attachment::{AttachmentCleanup, AttachmentFile, UploadDir, UploadPolicy};
pub use config::{Config, ConfigError};
pub use credentials::{Credentials, CredentialsError};
pub use error::{Error, Result};
pub use service::{
    AuthService, AuthUrlError, CodeExchangeError, EmailSender, FileCleanupError, GmailClient,
    OutgoingEmail, SendError, SendReceipt, Services,
};
