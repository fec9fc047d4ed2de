//! The composition session.

use crate::attachment::Attachment;
use crate::config::ComposeConfig;
use crate::container::PartContainer;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::kind::MessageKind;
use crate::registry::ContentRegistry;
use crate::resolver::{DefaultResolver, Resolver};
use crate::resource::Resource;
use crate::validate;
use chrono::{DateTime, Utc};
use mailwright_mime::{
    ContentType, Disposition, Headers, Mailbox, Message, MessageBuilder, Part,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Accepting changes.
    #[default]
    Composing,
    /// `build` succeeded; changes are rejected until `reset`.
    Built,
}

/// A message under composition.
///
/// The session owns its part container and content registry, so two
/// sessions never share embedded content ids. Mutators return
/// `Result<&mut Self>` for chaining with `?`.
///
/// # Example
///
/// ```no_run
/// use mailwright::{Email, Resource};
///
/// # fn main() -> mailwright::Result<()> {
/// let mut email = Email::html();
/// email.set_from("me@example.com")?.add_to("you@example.com")?;
/// let cid = email.embed(&Resource::url("https://example.com/logo.gif"), Some("logo"))?;
/// email.set_html(&format!("<img src=\"cid:{cid}\">"))?;
/// let message = email.build()?;
/// assert_eq!(message.part_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Email {
    kind: MessageKind,
    config: ComposeConfig,
    resolver: Arc<dyn Resolver>,
    from: Option<String>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Vec<Mailbox>,
    subject: Option<String>,
    sent_date: Option<DateTime<Utc>>,
    headers: Headers,
    text: Option<String>,
    html: Option<String>,
    container: PartContainer,
    registry: ContentRegistry,
    state: State,
}

impl Email {
    /// Starts a session of the given kind with the default configuration.
    #[must_use]
    pub fn new(kind: MessageKind) -> Self {
        let config = ComposeConfig::default();
        Self {
            kind,
            resolver: Arc::new(DefaultResolver::new(&config)),
            registry: ContentRegistry::new(config.content_id_suffix.clone()),
            config,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            subject: None,
            sent_date: None,
            headers: Headers::new(),
            text: None,
            html: None,
            container: PartContainer::new(),
            state: State::Composing,
        }
    }

    /// Starts a plain-text session.
    #[must_use]
    pub fn plain() -> Self {
        Self::new(MessageKind::Plain)
    }

    /// Starts an HTML session.
    #[must_use]
    pub fn html() -> Self {
        Self::new(MessageKind::Html)
    }

    /// Starts a multipart session.
    #[must_use]
    pub fn multipart() -> Self {
        Self::new(MessageKind::Multipart)
    }

    /// Replaces the configuration and rebuilds the default resolver from it.
    ///
    /// The new content-id suffix only applies while nothing is embedded yet;
    /// existing bindings are kept so embedded parts stay deduplicated.
    #[must_use]
    pub fn with_config(mut self, config: ComposeConfig) -> Self {
        self.resolver = Arc::new(DefaultResolver::new(&config));
        if self.registry.is_empty() {
            self.registry = ContentRegistry::new(config.content_id_suffix.clone());
        }
        self.config = config;
        self
    }

    /// Replaces the resolver used by `embed` and `attach`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Returns the message kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Sets the sender. Parsing is deferred to `build`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyBuilt`] after a build.
    pub fn set_from(&mut self, from: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.from = Some(from.to_string());
        Ok(self)
    }

    /// Returns the raw sender as set.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Adds a To recipient.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address does not parse.
    pub fn add_to(&mut self, address: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        let mailbox = parse_address(address)?;
        self.to.push(mailbox);
        Ok(self)
    }

    /// Adds a Cc recipient.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address does not parse.
    pub fn add_cc(&mut self, address: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        let mailbox = parse_address(address)?;
        self.cc.push(mailbox);
        Ok(self)
    }

    /// Adds a Bcc recipient.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address does not parse.
    pub fn add_bcc(&mut self, address: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        let mailbox = parse_address(address)?;
        self.bcc.push(mailbox);
        Ok(self)
    }

    /// Adds a Reply-To address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address does not parse.
    pub fn add_reply_to(&mut self, address: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        let mailbox = parse_address(address)?;
        self.reply_to.push(mailbox);
        Ok(self)
    }

    /// Returns the To recipients.
    #[must_use]
    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    /// Returns the Cc recipients.
    #[must_use]
    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    /// Returns the Bcc recipients.
    #[must_use]
    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    /// Sets the subject. `None` and `Some("")` are kept as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyBuilt`] after a build.
    pub fn set_subject(&mut self, subject: Option<&str>) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.subject = subject.map(str::to_string);
        Ok(self)
    }

    /// Returns the subject as set.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Sets the sent date. Defaults to the build time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyBuilt`] after a build.
    pub fn set_sent_date(&mut self, date: DateTime<Utc>) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.sent_date = Some(date);
        Ok(self)
    }

    /// Adds a custom header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mime`] if the header name is malformed.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        Headers::validate_name(name)?;
        self.headers.add(name, value);
        Ok(self)
    }

    /// Sets the text body. For HTML sessions this is the plain alternative.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContent`] if `text` is empty.
    pub fn set_text(&mut self, text: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.text = Some(validate::content(text)?.to_string());
        Ok(self)
    }

    /// Sets the HTML body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] unless this is an HTML session, and
    /// [`Error::InvalidContent`] if `html` is empty.
    pub fn set_html(&mut self, html: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.require(self.kind.capabilities().html, "HTML bodies")?;
        self.html = Some(validate::content(html)?.to_string());
        Ok(self)
    }

    /// Appends a text part with the given content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for plain sessions,
    /// [`Error::InvalidContent`] for empty content and
    /// [`Error::InvalidContentType`] for a malformed or `multipart/*`
    /// content type.
    pub fn add_part(&mut self, content: &str, content_type: &str) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.require(self.kind.capabilities().parts, "extra parts")?;
        let content = validate::content(content)?;
        let content_type = validate::leaf_content_type(content_type)?;
        self.container.append(Part::text(content, content_type));
        Ok(self)
    }

    /// Appends a prebuilt part, such as a nested `multipart/alternative`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for plain sessions or a validation
    /// error for a malformed part.
    pub fn append_part(&mut self, part: Part) -> Result<&mut Self> {
        let index = self.container.count();
        self.add_part_at(part, index)
    }

    /// Inserts a prebuilt part at `index` (`0..=part_count()`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] past the end, [`Error::Unsupported`]
    /// for plain sessions or a validation error for a malformed part.
    pub fn add_part_at(&mut self, part: Part, index: usize) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.require(self.kind.capabilities().parts, "extra parts")?;
        validate::part(&part)?;
        self.container.insert_at(part, index)?;
        Ok(self)
    }

    /// Attaches a resource.
    ///
    /// Attachments are never deduplicated: attaching the same resource twice
    /// yields two parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] for plain sessions,
    /// [`Error::InvalidDisposition`] for anything but `inline` or
    /// `attachment`, or a resolution error.
    pub fn attach(&mut self, attachment: &Attachment) -> Result<&mut Self> {
        self.ensure_composing()?;
        self.require(self.kind.capabilities().attachments, "attachments")?;

        let disposition = Disposition::parse(attachment.disposition())
            .map_err(|e| Error::InvalidDisposition(e.to_string()))?;
        let resolved = self.resolver.resolve(attachment.resource())?;

        let mut part = Part::binary(resolved.bytes, resolved.content_type)
            .with_disposition(disposition)
            .with_file_name(attachment.effective_name());
        if let Some(description) = attachment.description() {
            part = part.with_description(description);
        }

        debug!(
            "Attached {} as {disposition} part {}",
            attachment.resource(),
            self.container.count()
        );
        self.container.append(part);
        Ok(self)
    }

    /// Attaches a resource from its parts.
    ///
    /// # Errors
    ///
    /// See [`attach`](Self::attach).
    pub fn attach_resource(
        &mut self,
        resource: Resource,
        name: Option<&str>,
        description: Option<&str>,
        disposition: &str,
    ) -> Result<&mut Self> {
        let mut attachment = Attachment::new(resource).with_disposition(disposition);
        if let Some(name) = name {
            attachment = attachment.with_name(name);
        }
        if let Some(description) = description {
            attachment = attachment.with_description(description);
        }
        self.attach(&attachment)
    }

    /// Embeds a resource inline and returns its content-id.
    ///
    /// Embedding the same resource again returns the same id without adding
    /// a part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] unless this is an HTML session,
    /// [`Error::InvalidName`] when a required name is absent,
    /// [`Error::Conflict`] when the name belongs to another resource, or a
    /// resolution error.
    pub fn embed(&mut self, resource: &Resource, name: Option<&str>) -> Result<String> {
        self.embed_inner(resource, name, None)
    }

    /// Embeds a resource under a caller-chosen content-id.
    ///
    /// # Errors
    ///
    /// As [`embed`](Self::embed), plus [`Error::Conflict`] if `content_id` is
    /// already used by another resource or `resource` is already embedded
    /// under a different id.
    pub fn embed_with_cid(
        &mut self,
        resource: &Resource,
        name: Option<&str>,
        content_id: &str,
    ) -> Result<String> {
        self.embed_inner(resource, name, Some(content_id))
    }

    fn embed_inner(
        &mut self,
        resource: &Resource,
        name: Option<&str>,
        content_id: Option<&str>,
    ) -> Result<String> {
        self.ensure_composing()?;
        self.require(self.kind.capabilities().embedding, "embedding")?;
        let embedder = Embedder::new(self.resolver.as_ref(), self.config.require_embed_name);
        embedder.embed(
            &mut self.registry,
            &mut self.container,
            resource,
            name,
            content_id,
        )
    }

    /// Returns the content-id a resource was embedded under.
    #[must_use]
    pub fn content_id_for(&self, resource: &Resource) -> Option<&str> {
        self.registry.content_id(&resource.registry_key())
    }

    /// Number of parts in the container.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.container.count()
    }

    /// Returns the container part at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if there is no such part.
    pub fn part_at(&self, index: usize) -> Result<&Part> {
        self.container.part_at(index)
    }

    /// Returns the container parts in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        self.container.as_slice()
    }

    /// Clears parts and embedded content and returns to composing. Envelope
    /// fields and bodies are kept.
    pub fn reset(&mut self) {
        debug!("Resetting {} session with {} parts", self.kind, self.container.count());
        self.container.clear();
        self.registry.clear();
        self.state = State::Composing;
    }

    /// Builds the message.
    ///
    /// May be called again while nothing has changed; the session then
    /// rejects mutation until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSender`] if the sender is missing or does not
    /// parse, [`Error::NoRecipients`] if To, Cc and Bcc are all empty, or
    /// [`Error::Mime`] if assembly fails.
    pub fn build(&mut self) -> Result<Message> {
        let from = self
            .from
            .as_deref()
            .filter(|from| !from.trim().is_empty())
            .ok_or_else(|| Error::InvalidSender("sender is missing".to_string()))?;
        let from = Mailbox::parse(from).map_err(|e| Error::InvalidSender(e.to_string()))?;

        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(Error::NoRecipients);
        }

        let mut builder = MessageBuilder::new()
            .from(from)
            .subject(self.subject.clone())
            .multipart_subtype(self.multipart_subtype())
            .parts(self.container.iter().cloned());

        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        for mailbox in &self.cc {
            builder = builder.cc(mailbox.clone());
        }
        for mailbox in &self.bcc {
            builder = builder.bcc(mailbox.clone());
        }
        for mailbox in &self.reply_to {
            builder = builder.reply_to(mailbox.clone());
        }
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(date) = self.sent_date {
            builder = builder.date(date);
        }
        if let Some(body) = self.body() {
            builder = builder.body(body);
        }

        let message = builder.build()?;
        self.state = State::Built;
        debug!(
            "Built {} message {} with {} parts",
            self.kind,
            message.message_id(),
            message.part_count()
        );
        Ok(message)
    }

    /// Main body: text and HTML as `multipart/alternative` when both are set.
    fn body(&self) -> Option<Part> {
        let text = self
            .text
            .as_ref()
            .map(|text| Part::text(text.clone(), ContentType::text_plain()));
        let html = self
            .html
            .as_ref()
            .map(|html| Part::text(html.clone(), ContentType::text_html()));

        match (text, html) {
            (Some(text), Some(html)) => Some(Part::multipart("alternative", vec![text, html])),
            (text, html) => html.or(text),
        }
    }

    /// `related` when an HTML session holds inline content, else `mixed`.
    fn multipart_subtype(&self) -> &'static str {
        let has_inline = self.container.iter().any(|part| part.content_id.is_some());
        if self.kind == MessageKind::Html && has_inline {
            "related"
        } else {
            "mixed"
        }
    }

    fn ensure_composing(&self) -> Result<()> {
        match self.state {
            State::Composing => Ok(()),
            State::Built => Err(Error::AlreadyBuilt),
        }
    }

    fn require(&self, supported: bool, operation: &'static str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            trace!("Rejecting {operation} for {} session", self.kind);
            Err(Error::Unsupported {
                kind: self.kind,
                operation,
            })
        }
    }
}

impl Default for Email {
    fn default() -> Self {
        Self::new(MessageKind::default())
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Email")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("parts", &self.container.count())
            .field("embedded", &self.registry.len())
            .finish_non_exhaustive()
    }
}

fn parse_address(address: &str) -> Result<Mailbox> {
    Mailbox::parse(address).map_err(|e| Error::InvalidAddress(e.to_string()))
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
    use crate::resource::DataSource;

    fn addressed(kind: MessageKind) -> Email {
        let mut email = Email::new(kind);
        email
            .set_from("me@apache.org")
            .unwrap()
            .add_to("you@apache.org")
            .unwrap();
        email
    }

    #[test]
    fn test_plain_rejects_parts_and_attachments() {
        let mut email = Email::plain();
        assert!(matches!(
            email.add_part("x", "text/plain"),
            Err(Error::Unsupported { kind: MessageKind::Plain, .. })
        ));
        let attachment = Attachment::new(Resource::source(DataSource::from_bytes("a", vec![1])));
        assert!(matches!(email.attach(&attachment), Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_multipart_rejects_embedding_and_html() {
        let mut email = Email::multipart();
        let resource = Resource::source(DataSource::from_bytes("a", vec![1]));
        assert!(matches!(
            email.embed(&resource, Some("a")),
            Err(Error::Unsupported { .. })
        ));
        assert!(matches!(email.set_html("<p/>"), Err(Error::Unsupported { .. })));
    }

    #[test]
    fn test_set_text_rejects_empty() {
        let mut email = Email::plain();
        assert!(matches!(email.set_text(""), Err(Error::InvalidContent(_))));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut email = Email::plain();
        assert!(matches!(email.add_to("not an address"), Err(Error::InvalidAddress(_))));
        assert!(email.to().is_empty());
    }

    #[test]
    fn test_html_with_text_builds_alternative_body() {
        let mut email = addressed(MessageKind::Html);
        email.set_text("plain").unwrap().set_html("<b>rich</b>").unwrap();
        let message = email.build().unwrap();
        let body = message.body().unwrap();
        assert_eq!(body.content_type.essence(), "multipart/alternative");
        assert_eq!(body.parts().len(), 2);
        assert_eq!(message.part_count(), 0);
    }

    #[test]
    fn test_html_with_inline_part_is_related() {
        let mut email = addressed(MessageKind::Html);
        email
            .embed(&Resource::source(DataSource::from_bytes("logo.gif", vec![1])), Some("logo"))
            .unwrap();
        email.set_html("<img src=\"cid:x\">").unwrap();
        let message = email.build().unwrap();
        assert_eq!(message.content_type().essence(), "multipart/related");
    }

    #[test]
    fn test_attachment_rejects_bad_disposition() {
        let mut email = addressed(MessageKind::Multipart);
        let result = email.attach_resource(
            Resource::source(DataSource::from_bytes("a.txt", b"abc".to_vec())),
            Some("a"),
            None,
            "middle",
        );
        assert!(matches!(result, Err(Error::InvalidDisposition(_))));
        assert_eq!(email.part_count(), 0);
    }

    #[test]
    fn test_attachments_are_not_deduplicated() {
        let mut email = addressed(MessageKind::Multipart);
        let attachment =
            Attachment::new(Resource::source(DataSource::from_bytes("a.txt", b"abc".to_vec())))
                .with_description("desc");
        email.attach(&attachment).unwrap().attach(&attachment).unwrap();
        assert_eq!(email.part_count(), 2);

        let part = email.part_at(0).unwrap();
        assert_eq!(part.disposition, Some(Disposition::Attachment));
        assert_eq!(part.file_name.as_deref(), Some("a.txt"));
        assert_eq!(part.description.as_deref(), Some("desc"));
        assert_eq!(part.content_type.essence(), "text/plain");
    }

    #[test]
    fn test_mutation_after_build_rejected_until_reset() {
        let mut email = addressed(MessageKind::Multipart);
        email.add_part("one", "text/plain").unwrap();
        email.build().unwrap();
        assert_eq!(email.state(), State::Built);

        assert!(matches!(email.add_part("two", "text/plain"), Err(Error::AlreadyBuilt)));
        assert!(matches!(email.set_subject(Some("x")), Err(Error::AlreadyBuilt)));
        assert!(email.build().is_ok());

        email.reset();
        assert_eq!(email.state(), State::Composing);
        assert_eq!(email.part_count(), 0);
        email.add_part("two", "text/plain").unwrap();
        assert_eq!(email.build().unwrap().part_count(), 1);
    }

    #[test]
    fn test_custom_header() {
        let mut email = addressed(MessageKind::Plain);
        email.add_header("X-Mailer", "mailwright").unwrap();
        assert!(email.add_header("Bad Header", "x").is_err());
        let message = email.build().unwrap();
        assert_eq!(message.headers().get("x-mailer"), Some("mailwright"));
        assert!(message.to_string().contains("X-Mailer: mailwright\r\n"));
    }

    #[test]
    fn test_with_config_keeps_existing_bindings() {
        let mut email = Email::html();
        let resource = Resource::source(DataSource::from_bytes("logo.gif", vec![1, 2, 3]));
        let first = email.embed(&resource, Some("logo")).unwrap();

        let mut email =
            email.with_config(ComposeConfig::builder().content_id_suffix("example.org").build());
        let second = email.embed(&resource, Some("logo")).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with(".mailwright"));
        assert_eq!(email.part_count(), 1);
        assert_eq!(email.config().content_id_suffix, "example.org");
    }

    #[test]
    fn test_with_config_sets_cid_suffix() {
        let config = ComposeConfig::builder().content_id_suffix("example.org").build();
        let mut email = Email::html().with_config(config);
        let cid = email
            .embed(&Resource::source(DataSource::from_bytes("x", vec![1])), Some("x"))
            .unwrap();
        assert_eq!(cid, "part0001.example.org");
    }
}
