//! MIME content type handling.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Characters that may not appear in an RFC 2045 token.
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx), kept sorted for stable output.
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Creates an application/octet-stream content type.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart content type with the given subtype
    /// (`mixed`, `related`, `alternative`, ...).
    #[must_use]
    pub fn multipart(sub_type: impl Into<String>) -> Self {
        Self::new("multipart", sub_type)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Returns the `type/subtype` pair without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks that both halves of the type are valid RFC 2045 tokens.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending half.
    pub fn validate(&self) -> Result<()> {
        if !is_token(&self.main_type) {
            return Err(Error::InvalidContentType(format!(
                "invalid main type {:?}",
                self.main_type
            )));
        }
        if !is_token(&self.sub_type) {
            return Err(Error::InvalidContentType(format!(
                "invalid subtype {:?}",
                self.sub_type
            )));
        }
        Ok(())
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, lacks a `/`, or either half
    /// is not a valid token.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        if type_str.is_empty() {
            return Err(Error::InvalidContentType("empty content type".to_string()));
        }

        let (main_type, sub_type) = type_str.split_once('/').ok_or_else(|| {
            Error::InvalidContentType(format!("missing subtype in {type_str:?}"))
        })?;

        let content_type = Self::new(
            main_type.trim().to_ascii_lowercase(),
            sub_type.trim().to_ascii_lowercase(),
        );
        content_type.validate()?;

        let mut content_type = content_type;
        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                content_type = content_type
                    .with_parameter(key.trim(), value.trim().trim_matches('"'));
            }
        }

        Ok(content_type)
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_graphic() && !TSPECIALS.contains(c))
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            if is_token(value) {
                write!(f, "; {key}={value}")?;
            } else {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; {key}=\"{escaped}\"")?;
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
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

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain();
        assert_eq!(ct.essence(), "text/plain");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert!(ct.is_text());
    }

    #[test]
    fn test_multipart() {
        let ct = ContentType::multipart("related").with_parameter("boundary", "b1");
        assert_eq!(ct.essence(), "multipart/related");
        assert_eq!(ct.boundary(), Some("b1"));
        assert!(ct.is_multipart());
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/Plain; Charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
    }

    #[test]
    fn test_parse_accepts_unregistered_types() {
        let ct = ContentType::parse("subtype/123").unwrap();
        assert_eq!(ct.essence(), "subtype/123");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("   ").is_err());
        assert!(ContentType::parse("xxx").is_err());
        assert!(ContentType::parse("text/").is_err());
        assert!(ContentType::parse("/plain").is_err());
        assert!(ContentType::parse("text/pl ain").is_err());
        assert!(ContentType::parse("text/plain/extra").is_err());
    }

    #[test]
    fn test_validate_constructed() {
        assert!(ContentType::new("image", "png").validate().is_ok());
        assert!(ContentType::new("", "png").validate().is_err());
        assert!(ContentType::new("image", "p@ng").validate().is_err());
    }

    #[test]
    fn test_display_sorted_and_quoted() {
        let ct = ContentType::new("image", "png")
            .with_parameter("name", "my logo.png")
            .with_parameter("charset", "utf-8");
        assert_eq!(
            ct.to_string(),
            "image/png; charset=utf-8; name=\"my logo.png\""
        );
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let ct = ContentType::text_html();
        let reparsed: ContentType = ct.to_string().parse().unwrap();
        assert_eq!(reparsed, ct);
    }
}
