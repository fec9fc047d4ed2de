//! MIME message structure and handling.

use crate::address::Mailbox;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::render;
use chrono::{DateTime, Utc};
use std::fmt;

/// Content disposition of a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Disposition {
    /// Displayed inline with the message body.
    Inline,
    /// Offered as a downloadable attachment.
    Attachment,
}

impl Disposition {
    /// Parses a disposition tag, ignoring ASCII case and surrounding space.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `inline` or `attachment`.
    pub fn parse(s: &str) -> Result<Self> {
        let tag = s.trim();
        if tag.eq_ignore_ascii_case("inline") {
            Ok(Self::Inline)
        } else if tag.eq_ignore_ascii_case("attachment") {
            Ok(Self::Attachment)
        } else {
            Err(Error::InvalidDisposition(format!(
                "expected \"inline\" or \"attachment\", got {s:?}"
            )))
        }
    }

    /// Returns the header token for this disposition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Disposition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Picks the encoding used when rendering a leaf body.
    ///
    /// Text that is short-lined ASCII and cannot collide with a boundary
    /// goes out as-is; other text is quoted-printable; binary is Base64.
    #[must_use]
    pub fn for_body(body: &Body) -> Self {
        match body {
            Body::Text(text) => {
                let plain = text.is_ascii()
                    && !text.contains("=_")
                    && text.lines().all(|line| line.len() <= 998);
                if plain {
                    Self::SevenBit
                } else {
                    Self::QuotedPrintable
                }
            }
            Body::Binary(_) | Body::Multipart(_) => Self::Base64,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// Content of a body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Text content, rendered as 7bit or quoted-printable.
    Text(String),
    /// Raw bytes, rendered as Base64.
    Binary(Vec<u8>),
    /// Nested parts of a multipart entity.
    Multipart(Vec<Part>),
}

/// MIME body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Content type of the part.
    pub content_type: ContentType,
    /// Part content.
    pub body: Body,
    /// Content-ID without angle brackets.
    pub content_id: Option<String>,
    /// Content disposition.
    pub disposition: Option<Disposition>,
    /// File name advertised in the disposition.
    pub file_name: Option<String>,
    /// Content-Description header.
    pub description: Option<String>,
    /// Any further part headers.
    pub headers: Headers,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub fn new(content_type: ContentType, body: Body) -> Self {
        Self {
            content_type,
            body,
            content_id: None,
            disposition: None,
            file_name: None,
            description: None,
            headers: Headers::new(),
        }
    }

    /// Creates a text part.
    #[must_use]
    pub fn text(text: impl Into<String>, content_type: ContentType) -> Self {
        Self::new(content_type, Body::Text(text.into()))
    }

    /// Creates a binary part.
    #[must_use]
    pub fn binary(bytes: Vec<u8>, content_type: ContentType) -> Self {
        Self::new(content_type, Body::Binary(bytes))
    }

    /// Creates a `multipart/<sub_type>` part holding `parts`.
    #[must_use]
    pub fn multipart(sub_type: impl Into<String>, parts: Vec<Self>) -> Self {
        Self::new(ContentType::multipart(sub_type), Body::Multipart(parts))
    }

    /// Sets the Content-ID.
    #[must_use]
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Sets the disposition.
    #[must_use]
    pub const fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = Some(disposition);
        self
    }

    /// Sets the advertised file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the text content for text parts.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the nested parts of a multipart part (empty otherwise).
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        match &self.body {
            Body::Multipart(parts) => parts,
            _ => &[],
        }
    }

    /// Returns the leaf content as bytes (`None` for multiparts).
    #[must_use]
    pub fn content_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Text(text) => Some(text.as_bytes()),
            Body::Binary(bytes) => Some(bytes),
            Body::Multipart(_) => None,
        }
    }

    /// Checks the structure of this part and its children.
    ///
    /// # Errors
    ///
    /// Returns an error if a content type is malformed, a multipart body
    /// sits under a non-multipart type (or the reverse), or a multipart is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        self.content_type.validate()?;
        match &self.body {
            Body::Multipart(parts) => {
                if !self.content_type.is_multipart() {
                    return Err(Error::InvalidMultipart(format!(
                        "nested parts under {}",
                        self.content_type.essence()
                    )));
                }
                if parts.is_empty() {
                    return Err(Error::InvalidMultipart(
                        "multipart has no parts".to_string(),
                    ));
                }
                parts.iter().try_for_each(Self::validate)
            }
            Body::Text(_) | Body::Binary(_) => {
                if self.content_type.is_multipart() {
                    return Err(Error::InvalidMultipart(format!(
                        "{} without nested parts",
                        self.content_type.essence()
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Assembled MIME message.
///
/// Produced by [`MessageBuilder`](crate::MessageBuilder). The `parts` are the
/// message container in caller order; the optional `body` is the main
/// text/HTML content rendered ahead of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub(crate) from: Mailbox,
    pub(crate) to: Vec<Mailbox>,
    pub(crate) cc: Vec<Mailbox>,
    pub(crate) bcc: Vec<Mailbox>,
    pub(crate) reply_to: Vec<Mailbox>,
    pub(crate) subject: Option<String>,
    pub(crate) date: DateTime<Utc>,
    pub(crate) message_id: String,
    pub(crate) headers: Headers,
    pub(crate) body: Option<Part>,
    pub(crate) parts: Vec<Part>,
    pub(crate) multipart_subtype: String,
}

impl Message {
    /// Gets the sender.
    #[must_use]
    pub const fn from(&self) -> &Mailbox {
        &self.from
    }

    /// Gets the To recipients.
    #[must_use]
    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    /// Gets the Cc recipients.
    #[must_use]
    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    /// Gets the Bcc recipients (never rendered into headers).
    #[must_use]
    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    /// Gets the Reply-To addresses.
    #[must_use]
    pub fn reply_to(&self) -> &[Mailbox] {
        &self.reply_to
    }

    /// Returns every envelope recipient: To, then Cc, then Bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }

    /// Gets the subject exactly as it was set.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Gets the sent date (whole seconds).
    #[must_use]
    pub const fn sent_date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Gets the Message-ID without angle brackets.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Gets the additional headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Gets the main text/HTML body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Part> {
        self.body.as_ref()
    }

    /// Returns the number of parts in the message container.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Returns the container part at `index`.
    #[must_use]
    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    /// Returns all container parts in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns the top-level content type the message renders with.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        match (&self.body, self.parts.is_empty()) {
            (Some(body), true) => body.content_type.clone(),
            (None, true) => ContentType::text_plain(),
            (_, false) => ContentType::multipart(self.multipart_subtype.clone()),
        }
    }

    /// Renders the message as RFC 5322 bytes with CRLF line endings.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        render::render_message(self).into_bytes()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::render_message(self))
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
    fn test_disposition_parse() {
        assert_eq!(Disposition::parse("inline").unwrap(), Disposition::Inline);
        assert_eq!(Disposition::parse(" Attachment ").unwrap(), Disposition::Attachment);
        assert!(Disposition::parse("middle").is_err());
        assert!(Disposition::parse("").is_err());
    }

    #[test]
    fn test_transfer_encoding_selection() {
        assert_eq!(
            TransferEncoding::for_body(&Body::Text("hello".into())),
            TransferEncoding::SevenBit
        );
        assert_eq!(
            TransferEncoding::for_body(&Body::Text("héllo".into())),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(
            TransferEncoding::for_body(&Body::Text("----=_Part_0".into())),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(
            TransferEncoding::for_body(&Body::Binary(vec![0, 1])),
            TransferEncoding::Base64
        );
    }

    #[test]
    fn test_part_builders() {
        let part = Part::binary(vec![1, 2, 3], ContentType::new("image", "gif"))
            .with_content_id("logo")
            .with_disposition(Disposition::Inline)
            .with_file_name("logo.gif")
            .with_description("Company logo");

        assert_eq!(part.content_id.as_deref(), Some("logo"));
        assert_eq!(part.disposition, Some(Disposition::Inline));
        assert_eq!(part.content_bytes(), Some(&[1u8, 2, 3][..]));
        assert!(part.text_content().is_none());
        assert!(part.parts().is_empty());
    }

    #[test]
    fn test_part_validate_multipart() {
        let nested = Part::multipart(
            "alternative",
            vec![Part::text("a", ContentType::text_plain())],
        );
        assert!(nested.validate().is_ok());
        assert_eq!(nested.parts().len(), 1);

        let empty = Part::multipart("mixed", Vec::new());
        assert!(empty.validate().is_err());

        let mismatched = Part::text("a", ContentType::multipart("mixed"));
        assert!(mismatched.validate().is_err());

        let bad_child = Part::multipart(
            "mixed",
            vec![Part::text("a", ContentType::new("text", ""))],
        );
        assert!(bad_child.validate().is_err());
    }
}
