//! MIME header handling.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// Ordered collection of email headers.
///
/// Lookups are case-insensitive; names keep the spelling they were added
/// with, and rendering preserves insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Validates a header field name (RFC 5322 `ftext`: printable ASCII
    /// except colon).
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains forbidden characters.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidHeader("empty header name".to_string()));
        }
        if !name.bytes().all(|b| (33..=126).contains(&b) && b != b':') {
            return Err(Error::InvalidHeader(format!("invalid header name {name:?}")));
        }
        Ok(())
    }

    /// Encodes a header value using RFC 2047 if needed.
    #[must_use]
    pub fn encode_value(value: &str) -> String {
        encode_rfc2047(value, "utf-8")
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
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
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_headers_display_keeps_order() {
        let mut headers = Headers::new();
        headers.add("X-B", "2");
        headers.add("X-A", "1");
        assert_eq!(headers.to_string(), "X-B: 2\r\nX-A: 1\r\n");
    }

    #[test]
    fn test_validate_name() {
        assert!(Headers::validate_name("X-Mailer").is_ok());
        assert!(Headers::validate_name("").is_err());
        assert!(Headers::validate_name("Bad Name").is_err());
        assert!(Headers::validate_name("Bad:Name").is_err());
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(Headers::encode_value("plain"), "plain");
        assert!(Headers::encode_value("déjà vu").starts_with("=?utf-8?B?"));
    }
}
