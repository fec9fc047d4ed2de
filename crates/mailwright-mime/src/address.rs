//! Email address types.

use crate::encoding::{encode_rfc2047, needs_rfc2047};
use crate::error::{Error, Result};
use std::fmt;

/// Characters that force a display name into a quoted string.
const NAME_SPECIALS: &str = "()<>[]:;@\\,.\"";

/// A bare `local@domain` email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    /// Validates an email address (basic validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr.chars().any(|c| c.is_whitespace() || c.is_control() || "<>".contains(c)) {
            return Err(Error::InvalidAddress(format!(
                "Address contains forbidden characters: {addr:?}"
            )));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("Address must contain @: {addr:?}")));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(
                "Address must have exactly one @".into(),
            ));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "Local and domain parts cannot be empty".into(),
            ));
        }

        if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
            return Err(Error::InvalidAddress(format!("Malformed domain: {domain:?}")));
        }

        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            address: Address::new(address)?,
        })
    }

    /// Parses `addr@example.com`, `<addr@example.com>` or
    /// `Display Name <addr@example.com>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle brackets are unbalanced or the address
    /// is invalid.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let Some(open) = input.rfind('<') else {
            return Self::new(input);
        };

        let close = input
            .rfind('>')
            .filter(|&close| close > open && close == input.len() - 1)
            .ok_or_else(|| Error::InvalidAddress(format!("Unbalanced angle brackets: {input:?}")))?;

        let address = Address::new(input[open + 1..close].trim())?;
        let name = input[..open].trim().trim_matches('"').trim();

        Ok(Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            address,
        })
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            None => write!(f, "{}", self.address),
            Some(name) if needs_rfc2047(name) => {
                write!(f, "{} <{}>", encode_rfc2047(name, "utf-8"), self.address)
            }
            Some(name) if name.contains(|c| NAME_SPECIALS.contains(c)) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
        }
    }
}

impl std::str::FromStr for Mailbox {
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
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in [
            "",
            "abcdef",
            "userexample.com",
            "@example.com",
            "user@",
            "a@b@c",
            "user name@example.com",
            "user@.example.com",
            "user@example..com",
        ] {
            assert!(Address::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_mailbox_parse_bare() {
        let mailbox = Mailbox::parse("  me@apache.org ").unwrap();
        assert_eq!(mailbox.address.as_str(), "me@apache.org");
        assert!(mailbox.name.is_none());
    }

    #[test]
    fn test_mailbox_parse_named() {
        let mailbox = Mailbox::parse("John Doe <jdoe@somewhere.org>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("John Doe"));
        assert_eq!(mailbox.address.as_str(), "jdoe@somewhere.org");

        let quoted = Mailbox::parse("\"Doe, John\" <jdoe@somewhere.org>").unwrap();
        assert_eq!(quoted.name.as_deref(), Some("Doe, John"));
    }

    #[test]
    fn test_mailbox_parse_angle_only() {
        let mailbox = Mailbox::parse("<jdoe@somewhere.org>").unwrap();
        assert!(mailbox.name.is_none());
    }

    #[test]
    fn test_mailbox_parse_unbalanced() {
        assert!(Mailbox::parse("John <jdoe@somewhere.org").is_err());
        assert!(Mailbox::parse("John <jdoe@somewhere.org> trailing").is_err());
    }

    #[test]
    fn test_mailbox_display() {
        let plain = Mailbox::with_name("John Doe", "john@example.com").unwrap();
        assert_eq!(plain.to_string(), "John Doe <john@example.com>");

        let quoted = Mailbox::with_name("Doe, John", "john@example.com").unwrap();
        assert_eq!(quoted.to_string(), "\"Doe, John\" <john@example.com>");

        let encoded = Mailbox::with_name("Jöhn", "john@example.com").unwrap();
        assert!(encoded.to_string().starts_with("=?utf-8?B?"));

        let bare = Mailbox::new("john@example.com").unwrap();
        assert_eq!(bare.to_string(), "john@example.com");
    }
}
