//! Message assembly.

use crate::address::Mailbox;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Message, Part};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::atomic::{AtomicU32, Ordering};

/// Per-process counter that keeps generated Message-IDs distinct within
/// the same millisecond.
static MESSAGE_ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Builder for [`Message`].
///
/// Recipients accumulate in call order. Nothing is validated until
/// [`build`](Self::build), which checks that a sender and at least one
/// recipient are present.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Vec<Mailbox>,
    subject: Option<String>,
    date: Option<DateTime<Utc>>,
    message_id: Option<String>,
    headers: Headers,
    body: Option<Part>,
    parts: Vec<Part>,
    multipart_subtype: String,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            subject: None,
            date: None,
            message_id: None,
            headers: Headers::new(),
            body: None,
            parts: Vec::new(),
            multipart_subtype: "mixed".to_string(),
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, from: Mailbox) -> Self {
        self.from = Some(from);
        self
    }

    /// Adds a To recipient.
    #[must_use]
    pub fn to(mut self, to: Mailbox) -> Self {
        self.to.push(to);
        self
    }

    /// Adds a Cc recipient.
    #[must_use]
    pub fn cc(mut self, cc: Mailbox) -> Self {
        self.cc.push(cc);
        self
    }

    /// Adds a Bcc recipient.
    #[must_use]
    pub fn bcc(mut self, bcc: Mailbox) -> Self {
        self.bcc.push(bcc);
        self
    }

    /// Adds a Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, reply_to: Mailbox) -> Self {
        self.reply_to.push(reply_to);
        self
    }

    /// Sets the subject. `None` omits the header; an empty string renders
    /// an empty `Subject:` line.
    #[must_use]
    pub fn subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    /// Sets the sent date. Sub-second precision is dropped at build time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Overrides the generated Message-ID (without angle brackets).
    #[must_use]
    pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Adds a custom header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Sets the main body part, rendered ahead of any container parts.
    #[must_use]
    pub fn body(mut self, body: Part) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a container part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Appends several container parts in order.
    #[must_use]
    pub fn parts(mut self, parts: impl IntoIterator<Item = Part>) -> Self {
        self.parts.extend(parts);
        self
    }

    /// Sets the multipart subtype used when container parts are present.
    #[must_use]
    pub fn multipart_subtype(mut self, sub_type: impl Into<String>) -> Self {
        self.multipart_subtype = sub_type.into();
        self
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender is missing, there are no recipients
    /// at all, a custom header name is malformed, or a part is structurally
    /// invalid.
    pub fn build(self) -> Result<Message> {
        let from = self
            .from
            .ok_or_else(|| Error::MissingHeader("From".to_string()))?;

        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(Error::MissingHeader("To".to_string()));
        }

        for (name, _) in self.headers.iter() {
            Headers::validate_name(name)?;
        }

        if let Some(body) = &self.body {
            body.validate()?;
        }
        for part in &self.parts {
            part.validate()?;
        }

        let date = self.date.unwrap_or_else(Utc::now).trunc_subsecs(0);
        let message_id = self
            .message_id
            .unwrap_or_else(|| generate_message_id(from.address.domain()));

        Ok(Message {
            from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            reply_to: self.reply_to,
            subject: self.subject,
            date,
            message_id,
            headers: self.headers,
            body: self.body,
            parts: self.parts,
            multipart_subtype: self.multipart_subtype,
        })
    }
}

fn generate_message_id(domain: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let n = MESSAGE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{millis:x}.{n}@{domain}")
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
    use crate::content_type::ContentType;
    use crate::message::Disposition;
    use chrono::TimeZone;

    fn mailbox(addr: &str) -> Mailbox {
        Mailbox::parse(addr).unwrap()
    }

    fn base() -> MessageBuilder {
        MessageBuilder::new()
            .from(mailbox("me@apache.org"))
            .to(mailbox("you@apache.org"))
            .date(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
            .message_id("abc.1@apache.org")
    }

    #[test]
    fn test_build_requires_sender() {
        let result = MessageBuilder::new().to(mailbox("you@apache.org")).build();
        assert!(matches!(result, Err(Error::MissingHeader(h)) if h == "From"));
    }

    #[test]
    fn test_build_requires_recipient() {
        let result = MessageBuilder::new().from(mailbox("me@apache.org")).build();
        assert!(matches!(result, Err(Error::MissingHeader(h)) if h == "To"));
    }

    #[test]
    fn test_build_accepts_bcc_only() {
        let message = MessageBuilder::new()
            .from(mailbox("me@apache.org"))
            .bcc(mailbox("hidden@apache.org"))
            .build()
            .unwrap();
        assert_eq!(message.recipients().count(), 1);
        assert!(!message.to_string().contains("hidden@apache.org"));
    }

    #[test]
    fn test_date_truncated_to_seconds() {
        let precise = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let message = base().date(precise).build().unwrap();
        assert_eq!(message.sent_date().timestamp_subsec_millis(), 0);
        assert_eq!(message.sent_date().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_generated_message_ids_are_distinct() {
        let build = || {
            MessageBuilder::new()
                .from(mailbox("me@apache.org"))
                .to(mailbox("you@apache.org"))
                .build()
                .unwrap()
        };
        let first = build();
        let second = build();
        assert_ne!(first.message_id(), second.message_id());
        assert!(first.message_id().ends_with("@apache.org"));
    }

    #[test]
    fn test_invalid_custom_header_rejected() {
        let result = base().header("Bad Name", "x").build();
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_render_single_part() {
        let message = base()
            .subject(Some("Test".to_string()))
            .body(Part::text("Hello\nWorld", ContentType::text_plain()))
            .build()
            .unwrap();
        let rendered = message.to_string();

        assert!(rendered.starts_with("Date: Wed, 1 May 2024 12:30:00 +0000\r\n"));
        assert!(rendered.contains("From: me@apache.org\r\n"));
        assert!(rendered.contains("To: you@apache.org\r\n"));
        assert!(rendered.contains("Message-ID: <abc.1@apache.org>\r\n"));
        assert!(rendered.contains("Subject: Test\r\n"));
        assert!(rendered.contains("MIME-Version: 1.0\r\n"));
        assert!(rendered.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(rendered.contains("Content-Transfer-Encoding: 7bit\r\n"));
        assert!(rendered.ends_with("\r\n\r\nHello\r\nWorld\r\n"));
        assert_eq!(message.content_type().essence(), "text/plain");
    }

    #[test]
    fn test_render_subject_variants() {
        let absent = base().build().unwrap().to_string();
        assert!(!absent.contains("Subject:"));

        let empty = base().subject(Some(String::new())).build().unwrap().to_string();
        assert!(empty.contains("Subject: \r\n"));

        let encoded = base()
            .subject(Some("Grüße".to_string()))
            .build()
            .unwrap()
            .to_string();
        assert!(encoded.contains("Subject: =?utf-8?B?"));
    }

    #[test]
    fn test_render_multipart_with_inline_part() {
        let logo = Part::binary(b"GIF89a".to_vec(), ContentType::new("image", "gif"))
            .with_content_id("logo.cid")
            .with_disposition(Disposition::Inline)
            .with_file_name("logo.gif");
        let message = base()
            .body(Part::text("<img src=\"cid:logo.cid\">", ContentType::text_html()))
            .part(logo)
            .multipart_subtype("related")
            .build()
            .unwrap();
        let rendered = message.to_string();

        assert_eq!(message.part_count(), 1);
        assert_eq!(message.content_type().essence(), "multipart/related");
        assert!(rendered.contains("Content-Type: multipart/related; boundary=\"----=_Part_0_abc.1\"\r\n"));
        assert!(rendered.contains("\r\n------=_Part_0_abc.1\r\n"));
        assert!(rendered.contains("Content-ID: <logo.cid>\r\n"));
        assert!(rendered.contains("Content-Disposition: inline; filename=\"logo.gif\"\r\n"));
        assert!(rendered.contains("Content-Transfer-Encoding: base64\r\n"));
        assert!(rendered.contains("R0lGODlh\r\n"));
        assert!(rendered.ends_with("\r\n------=_Part_0_abc.1--\r\n"));
    }

    #[test]
    fn test_render_nested_multipart_gets_distinct_boundary() {
        let alternative = Part::multipart(
            "alternative",
            vec![
                Part::text("plain", ContentType::text_plain()),
                Part::text("<b>html</b>", ContentType::text_html()),
            ],
        );
        let message = base()
            .body(alternative)
            .part(Part::text("extra", ContentType::text_plain()))
            .build()
            .unwrap();
        let rendered = message.to_string();

        assert!(rendered.contains("multipart/mixed; boundary=\"----=_Part_0_abc.1\""));
        assert!(rendered.contains("multipart/alternative; boundary=\"----=_Part_1_abc.1\""));
        assert!(rendered.contains("------=_Part_1_abc.1--\r\n"));
    }

    #[test]
    fn test_render_non_ascii_text_uses_quoted_printable() {
        let message = base()
            .body(Part::text("Grüße", ContentType::text_plain()))
            .build()
            .unwrap();
        let rendered = message.to_string();
        assert!(rendered.contains("Content-Transfer-Encoding: quoted-printable\r\n"));
        assert!(rendered.contains("Gr=C3=BC=C3=9Fe"));
    }

    #[test]
    fn test_empty_multipart_part_rejected() {
        let result = base().part(Part::multipart("mixed", Vec::new())).build();
        assert!(matches!(result, Err(Error::InvalidMultipart(_))));
    }
}
