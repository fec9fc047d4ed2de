//! Attachment descriptions.

use crate::resource::Resource;

/// A resource to attach, with its presentation details.
///
/// The disposition is kept as the caller's string and validated when the
/// attachment is added to a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    resource: Resource,
    name: Option<String>,
    description: Option<String>,
    disposition: String,
}

impl Attachment {
    /// Creates an attachment with disposition `attachment`.
    #[must_use]
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            name: None,
            description: None,
            disposition: "attachment".to_string(),
        }
    }

    /// Sets the file name shown to recipients.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the disposition (`inline` or `attachment`).
    #[must_use]
    pub fn with_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = disposition.into();
        self
    }

    /// Returns the resource.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Returns the explicit name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the explicit name, falling back to the resource's display name.
    #[must_use]
    pub fn effective_name(&self) -> String {
        self.name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.resource.display_name())
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the disposition string as given.
    #[must_use]
    pub fn disposition(&self) -> &str {
        &self.disposition
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
    fn test_defaults() {
        let attachment = Attachment::new(Resource::url("http://example.com/files/report.pdf"));
        assert_eq!(attachment.disposition(), "attachment");
        assert!(attachment.name().is_none());
        assert_eq!(attachment.effective_name(), "report.pdf");
    }

    #[test]
    fn test_explicit_fields() {
        let attachment = Attachment::new(Resource::path("testfile.txt"))
            .with_name("Test Attachment")
            .with_description("Test Attachment Desc")
            .with_disposition("inline");
        assert_eq!(attachment.effective_name(), "Test Attachment");
        assert_eq!(attachment.description(), Some("Test Attachment Desc"));
        assert_eq!(attachment.disposition(), "inline");
    }

    #[test]
    fn test_blank_name_falls_back() {
        let attachment = Attachment::new(Resource::path("dir/testfile.txt")).with_name("  ");
        assert_eq!(attachment.effective_name(), "testfile.txt");
    }
}
