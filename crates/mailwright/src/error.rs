//! Error types for message composition.

use crate::kind::MessageKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while composing or building a message.
#[derive(Debug, Error)]
pub enum Error {
    /// A logical name was required but absent.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Content was missing or empty.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Content type was empty or not a well-formed `type/subtype`.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Disposition was neither `inline` nor `attachment`.
    #[error("Invalid disposition: {0}")]
    InvalidDisposition(String),

    /// Path does not exist.
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Path exists but is not a regular file.
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Remote resource could not be fetched.
    #[error("Unreachable resource {url}: {reason}")]
    UnreachableResource {
        /// The URL as given.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// Reading bytes from a file or data source failed.
    #[error("Unreadable source {name}: {source}")]
    UnreadableSource {
        /// Source name or path.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Resolved resource exceeds the configured size limit.
    #[error("Resource {identity} exceeds the {limit} byte limit ({size} bytes seen)")]
    ResourceTooLarge {
        /// Resource identity.
        identity: String,
        /// Announced size, or bytes read before reading stopped.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// Part index outside the container bounds.
    #[error("Index {index} out of range for {len} parts")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current part count.
        len: usize,
    },

    /// Sender missing or not parseable.
    #[error("Invalid sender: {0}")]
    InvalidSender(String),

    /// Recipient or reply-to address not parseable.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// To, Cc and Bcc are all empty.
    #[error("Message has no recipients")]
    NoRecipients,

    /// Name or content-id already bound to a different resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource identity was empty.
    #[error("Resource identity cannot be empty")]
    InvalidIdentity,

    /// Operation not available for this message kind.
    #[error("{kind} messages do not support {operation}")]
    Unsupported {
        /// Kind of the session.
        kind: MessageKind,
        /// Rejected operation.
        operation: &'static str,
    },

    /// Session was built; call `reset` before changing it.
    #[error("Message already built")]
    AlreadyBuilt,

    /// MIME assembly failed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailwright_mime::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
