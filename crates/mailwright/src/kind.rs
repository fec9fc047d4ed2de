//! Message kinds and what each may do.

use std::fmt;

/// Operations a message kind supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Inline resources referenced by content-id.
    pub embedding: bool,
    /// Attachments.
    pub attachments: bool,
    /// Extra body parts beyond the main text.
    pub parts: bool,
    /// An HTML body.
    pub html: bool,
}

/// Kind of message being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Single text body.
    #[default]
    Plain,
    /// HTML body with optional text alternative and inline resources.
    Html,
    /// Arbitrary parts and attachments.
    Multipart,
}

impl MessageKind {
    /// Returns the capability set of this kind.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Plain => Capabilities {
                embedding: false,
                attachments: false,
                parts: false,
                html: false,
            },
            Self::Html => Capabilities {
                embedding: true,
                attachments: true,
                parts: true,
                html: true,
            },
            Self::Multipart => Capabilities {
                embedding: false,
                attachments: true,
                parts: true,
                html: false,
            },
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Html => write!(f, "html"),
            Self::Multipart => write!(f, "multipart"),
        }
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
    fn test_capabilities() {
        assert!(!MessageKind::Plain.capabilities().attachments);
        assert!(MessageKind::Html.capabilities().embedding);
        assert!(MessageKind::Multipart.capabilities().attachments);
        assert!(!MessageKind::Multipart.capabilities().embedding);
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(MessageKind::Html.to_string(), "html");
        assert_eq!(serde_json::to_string(&MessageKind::Multipart).unwrap(), "\"multipart\"");
        let kind: MessageKind = serde_json::from_str("\"plain\"").unwrap();
        assert_eq!(kind, MessageKind::Plain);
    }
}
