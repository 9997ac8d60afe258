//! Service configuration.
//!
//! Every setting comes from a `GMAILSEND_*` environment variable and has a
//! default suitable for running next to a local frontend dev server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Gmail REST API base.
pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Default frontend origin (the form UI dev server).
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Default maximum number of attachments per message.
pub const DEFAULT_MAX_ATTACHMENTS: usize = 5;

/// Default maximum size of a single attachment (10 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

const ENV_CREDENTIALS: &str = "GMAILSEND_CREDENTIALS";
const ENV_TOKEN_PATH: &str = "GMAILSEND_TOKEN_PATH";
const ENV_UPLOAD_DIR: &str = "GMAILSEND_UPLOAD_DIR";
const ENV_BIND_ADDR: &str = "GMAILSEND_BIND";
const ENV_FRONTEND_URL: &str = "GMAILSEND_FRONTEND_URL";
const ENV_CORS_ORIGIN: &str = "GMAILSEND_CORS_ORIGIN";
const ENV_GMAIL_API_BASE: &str = "GMAILSEND_GMAIL_API_BASE";
const ENV_MAX_ATTACHMENTS: &str = "GMAILSEND_MAX_ATTACHMENTS";
const ENV_MAX_ATTACHMENT_BYTES: &str = "GMAILSEND_MAX_ATTACHMENT_BYTES";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("{key}={value:?} is invalid: {reason}")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Google client-secret JSON file (read-only).
    pub credentials_path: PathBuf,
    /// Token file (read-write, single record).
    pub token_path: PathBuf,
    /// Directory for attachment temp files.
    pub upload_dir: PathBuf,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Base URL of the frontend; OAuth redirects land on its
    /// `/auth-success` and `/auth-error` pages.
    pub frontend_url: String,
    /// Origin allowed by CORS.
    pub cors_origin: String,
    /// Gmail REST API base URL.
    pub gmail_api_base: String,
    /// Maximum number of attachments per message.
    pub max_attachments: usize,
    /// Maximum size of a single attachment in bytes.
    pub max_attachment_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            upload_dir: PathBuf::from("uploads"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            cors_origin: DEFAULT_FRONTEND_URL.to_string(),
            gmail_api_base: DEFAULT_GMAIL_API_BASE.to_string(),
            max_attachments: DEFAULT_MAX_ATTACHMENTS,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    ///
    /// Unset or blank variables fall back to [`Config::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let frontend_url = get(ENV_FRONTEND_URL)
            .map_or(defaults.frontend_url, |url| url.trim_end_matches('/').to_string());
        let cors_origin = get(ENV_CORS_ORIGIN).unwrap_or_else(|| frontend_url.clone());

        Ok(Self {
            credentials_path: get(ENV_CREDENTIALS).map_or(defaults.credentials_path, PathBuf::from),
            token_path: get(ENV_TOKEN_PATH).map_or(defaults.token_path, PathBuf::from),
            upload_dir: get(ENV_UPLOAD_DIR).map_or(defaults.upload_dir, PathBuf::from),
            bind_addr: parse_or(ENV_BIND_ADDR, get(ENV_BIND_ADDR), defaults.bind_addr)?,
            frontend_url,
            cors_origin,
            gmail_api_base: get(ENV_GMAIL_API_BASE).map_or(defaults.gmail_api_base, |url| {
                url.trim_end_matches('/').to_string()
            }),
            max_attachments: parse_or(
                ENV_MAX_ATTACHMENTS,
                get(ENV_MAX_ATTACHMENTS),
                defaults.max_attachments,
            )?,
            max_attachment_bytes: parse_or(
                ENV_MAX_ATTACHMENT_BYTES,
                get(ENV_MAX_ATTACHMENT_BYTES),
                defaults.max_attachment_bytes,
            )?,
        })
    }

    /// Redirect target after a successful code exchange.
    #[must_use]
    pub fn auth_success_url(&self) -> String {
        format!("{}/auth-success", self.frontend_url)
    }

    /// Redirect target after a failed code exchange.
    #[must_use]
    pub fn auth_error_url(&self) -> String {
        format!("{}/auth-error", self.frontend_url)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.max_attachments, 5);
        assert_eq!(config.max_attachment_bytes, 10 * 1024 * 1024);
        assert_eq!(config.auth_success_url(), "http://localhost:5173/auth-success");
        assert_eq!(config.auth_error_url(), "http://localhost:5173/auth-error");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GMAILSEND_BIND", "0.0.0.0:8080"),
            ("GMAILSEND_FRONTEND_URL", "https://mail.example.com/"),
            ("GMAILSEND_TOKEN_PATH", "/var/lib/gmailsend/token.json"),
            ("GMAILSEND_MAX_ATTACHMENTS", "2"),
            ("GMAILSEND_UPLOAD_DIR", "  "),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.frontend_url, "https://mail.example.com");
        assert_eq!(config.cors_origin, "https://mail.example.com");
        assert_eq!(config.token_path, PathBuf::from("/var/lib/gmailsend/token.json"));
        assert_eq!(config.max_attachments, 2);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_invalid_value() {
        let err = Config::from_lookup(lookup(&[("GMAILSEND_MAX_ATTACHMENT_BYTES", "ten")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "GMAILSEND_MAX_ATTACHMENT_BYTES", .. }
        ));
    }
}
