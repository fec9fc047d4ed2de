//! # mailwright
//!
//! Composition sessions for multipart email.
//!
//! An [`Email`] collects envelope fields, text and HTML bodies, extra parts,
//! attachments and inline resources, then builds a
//! [`mailwright_mime::Message`]. Inline resources are deduplicated by
//! identity: embedding the same URL, path or named data source twice
//! returns the same content-id and adds one part.
//!
//! ## Example
//!
//! ```
//! use mailwright::{DataSource, Email, Resource};
//!
//! # fn main() -> mailwright::Result<()> {
//! let mut email = Email::html();
//! email
//!     .set_from("Sender <sender@example.com>")?
//!     .add_to("recipient@example.com")?
//!     .set_subject(Some("Logo"))?;
//!
//! let logo = Resource::source(DataSource::from_bytes("logo.gif", b"GIF89a".to_vec()));
//! let cid = email.embed(&logo, Some("logo"))?;
//! assert_eq!(email.embed(&logo, Some("logo"))?, cid);
//!
//! email.set_html(&format!("<img src=\"cid:{cid}\">"))?;
//! let message = email.build()?;
//! assert_eq!(message.part_count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod attachment;
pub mod config;
pub mod container;
pub mod embed;
pub mod email;
pub mod error;
pub mod kind;
pub mod registry;
pub mod resolver;
pub mod resource;
pub mod validate;

pub use attachment::Attachment;
pub use config::{ComposeConfig, ComposeConfigBuilder};
pub use container::PartContainer;
pub use email::{Email, State};
pub use error::{Error, Result};
pub use kind::{Capabilities, MessageKind};
pub use registry::{ContentIdGenerator, ContentRegistry, Reservation};
pub use resolver::{DefaultResolver, Resolved, Resolver};
pub use resource::{DataSource, Resource};

pub use mailwright_mime;
pub use mailwright_mime::{ContentType, Disposition, Mailbox, Message, Part};
