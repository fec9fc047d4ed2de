//! # mailwright-mime
//!
//! MIME message assembly and rendering.
//!
//! ## Features
//!
//! - **Message generation**: Build RFC 5322 messages with nested multiparts
//! - **Encoding/Decoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//! - **Content types**: Parsing and validation of `type/subtype; params`
//! - **Addresses**: Mailbox parsing with optional display names
//!
//! ## Quick Start
//!
//! ```
//! use mailwright_mime::{ContentType, Mailbox, MessageBuilder, Part};
//!
//! # fn main() -> mailwright_mime::Result<()> {
//! let message = MessageBuilder::new()
//!     .from(Mailbox::parse("sender@example.com")?)
//!     .to(Mailbox::parse("Recipient <recipient@example.com>")?)
//!     .subject(Some("Test Message".to_string()))
//!     .body(Part::text("Hello, World!", ContentType::text_plain()))
//!     .build()?;
//!
//! let raw = message.to_string();
//! assert!(raw.contains("Subject: Test Message\r\n"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]

mod address;
mod builder;
mod content_type;
pub mod encoding;
mod error;
mod header;
mod message;
mod render;

pub use address::{Address, Mailbox};
pub use builder::MessageBuilder;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Body, Disposition, Message, Part, TransferEncoding};
