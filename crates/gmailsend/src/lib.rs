//! # gmailsend
//!
//! HTTP surface for signing in to Gmail and sending email with attachments.
//!
//! | route               | purpose                                         |
//! |---------------------|-------------------------------------------------|
//! | `GET /auth-url`     | consent URL as `{ "url": ... }`                 |
//! | `GET /auth-status`  | `{ "authenticated": bool }`                     |
//! | `GET /authenticate` | OAuth callback, redirects to the frontend       |
//! | `POST /email/send`  | multipart form with `to`, `subject`, `message`, `attachments` |
//! | `GET /`             | bundled form UI                                 |
//! | `GET /auth-success`, `GET /auth-error` | bundled landing pages        |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
