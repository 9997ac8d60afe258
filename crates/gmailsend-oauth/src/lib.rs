//! # gmailsend-oauth
//!
//! `OAuth2` authorization code flow against Google, plus the single-record
//! token store that decides whether the service is signed in.
//!
//! ## Features
//!
//! - **Provider configuration**: Google endpoints with the send-only Gmail scope
//! - **Authorization Code Flow**: deterministic consent URL and code exchange
//! - **Token storage**: one JSON token file, overwritten on every exchange
//!
//! ## Quick Start
//!
//! ```ignore
//! use gmailsend_oauth::{AuthorizationCodeFlow, OAuthClient, Provider, TokenStore};
//!
//! let client = OAuthClient::new("your_client_id", Provider::google()?)
//!     .with_client_secret("your_secret")
//!     .with_redirect_uri("http://localhost:3000/authenticate");
//! let flow = AuthorizationCodeFlow::new(client);
//!
//! // Send the browser here
//! let url = flow.authorization_url(None)?;
//!
//! // Google redirects back with ?code=...
//! let token = flow.exchange_code("code_from_redirect").await?;
//!
//! let store = TokenStore::new("token.json");
//! store.save(&token).await?;
//! assert!(store.is_authenticated().await?);
//! ```
//!
//! ## Token State
//!
//! Signed-in state is [`TokenState::Present`] when a token record exists and
//! [`TokenState::Absent`] otherwise. Expiry is not consulted: an expired
//! access token still counts as present and is rejected by Gmail itself.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient};
pub use provider::Provider;
pub use token::{Token, TokenState, TokenStore};
