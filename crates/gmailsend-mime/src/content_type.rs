//! `Content-Type` values.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Characters that force a parameter value into quotes (RFC 2045 tspecials).
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// A parsed or constructed `type/subtype; key=value` header value.
///
/// Type and subtype are lowercased on parse. Parameters are kept sorted so
/// the rendered header is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Top-level media type, `text` or `multipart` for example.
    pub main_type: String,
    /// Subtype such as `plain` or `mixed`.
    pub sub_type: String,
    /// Lowercased parameter names mapped to unquoted values.
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Creates a content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// `text/plain; charset=utf-8`, the body part type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// `multipart/mixed` delimited by `boundary`.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Sets a parameter, replacing any previous value.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// The `charset` parameter.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// The `boundary` parameter.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary")
    }

    /// True for any `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// True for any `text/*`.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Parses `type/subtype; key=value; key="quoted value"`.
    ///
    /// Parameters without `=` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if the value is empty or has no
    /// subtype.
    pub fn parse(s: &str) -> Result<Self> {
        let mut segments = s.split(';');

        let essence = segments
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidContentType("Empty content type".to_string()))?;

        let Some((main_type, sub_type)) = essence.split_once('/') else {
            return Err(Error::InvalidContentType(format!(
                "Missing subtype in {essence}"
            )));
        };
        let (main_type, sub_type) = (main_type.trim(), sub_type.trim());
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(essence.to_string()));
        }

        let parameters = segments
            .filter_map(|segment| segment.trim().split_once('='))
            .map(|(key, value)| {
                (
                    key.trim().to_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                )
            })
            .collect();

        Ok(Self {
            main_type: main_type.to_lowercase(),
            sub_type: sub_type.to_lowercase(),
            parameters,
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;

        for (key, value) in &self.parameters {
            // Boundaries are always quoted on the multipart header line
            let quote = key == "boundary"
                || value.contains(|c: char| c.is_whitespace() || TSPECIALS.contains(c));
            if quote {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_body_part_type() {
        let body = ContentType::text_plain();
        assert!(body.is_text());
        assert!(!body.is_multipart());
        assert_eq!(body.to_string(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_boundary_is_always_quoted() {
        let mixed = ContentType::multipart_mixed("boundary1700000000000");
        assert_eq!(mixed.boundary(), Some("boundary1700000000000"));
        assert_eq!(
            mixed.to_string(),
            "multipart/mixed; boundary=\"boundary1700000000000\""
        );
    }

    #[test]
    fn test_parse_normalises_case() {
        let parsed = ContentType::parse("Application/PDF; Name=scan.pdf").unwrap();
        assert_eq!(parsed.essence(), "application/pdf");
        assert_eq!(parsed.parameters.get("name").map(String::as_str), Some("scan.pdf"));
    }

    #[test]
    fn test_parse_unquotes_boundary() {
        let parsed = ContentType::parse("multipart/mixed; boundary=\"=_b1\"").unwrap();
        assert!(parsed.is_multipart());
        assert_eq!(parsed.boundary(), Some("=_b1"));

        let built = ContentType::multipart_mixed("x1");
        assert_eq!(ContentType::parse(&built.to_string()).unwrap(), built);
    }

    #[test]
    fn test_parse_rejects_missing_subtype() {
        for bad in ["text", "", "image/", "/png"] {
            assert!(ContentType::parse(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_values_with_specials_are_quoted() {
        let ct = ContentType::new("application", "octet-stream")
            .with_parameter("name", "q1 report.pdf")
            .with_parameter("charset", "utf-8");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(
            ct.to_string(),
            "application/octet-stream; charset=utf-8; name=\"q1 report.pdf\""
        );
    }
}
