//! Resource references: what can be embedded or attached.
//!
//! A [`Resource`] names bytes without reading them. Its identity string is
//! the deduplication key used by the content registry and is computed with
//! no I/O beyond reading the process working directory.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Byte provider behind a [`DataSource`].
pub type Provider = Arc<dyn Fn() -> io::Result<Vec<u8>> + Send + Sync>;

/// A named, lazily-read byte source.
#[derive(Clone)]
pub struct DataSource {
    name: String,
    content_type: Option<String>,
    provider: Provider,
}

impl DataSource {
    /// Creates a data source backed by a provider closure.
    pub fn new<F>(name: impl Into<String>, provider: F) -> Self
    where
        F: Fn() -> io::Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            content_type: None,
            provider: Arc::new(provider),
        }
    }

    /// Creates a data source over an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Arc<[u8]> = Arc::from(bytes.into());
        Self::new(name, move || Ok(bytes.to_vec()))
    }

    /// Declares the content type instead of guessing it from the name.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Reads the bytes.
    ///
    /// # Errors
    ///
    /// Returns whatever the provider returns.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        (self.provider)()
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Reference to an embeddable or attachable resource.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Remote URL, normalized when it parses.
    Url(String),
    /// Local file, absolute and lexically normalized.
    Path(PathBuf),
    /// Named data source.
    Source(DataSource),
}

impl Resource {
    /// References a URL.
    ///
    /// Strings that do not parse as absolute URLs are kept trimmed and fail
    /// when resolved.
    #[must_use]
    pub fn url(url: &str) -> Self {
        let trimmed = url.trim();
        let normalized = url::Url::parse(trimmed)
            .map_or_else(|_| trimmed.to_string(), |parsed| parsed.to_string());
        Self::Url(normalized)
    }

    /// References a file path.
    #[must_use]
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(normalize_path(path.as_ref()))
    }

    /// References a data source.
    #[must_use]
    pub const fn source(source: DataSource) -> Self {
        Self::Source(source)
    }

    /// Returns the deduplication key.
    #[must_use]
    pub fn identity(&self) -> Cow<'_, str> {
        match self {
            Self::Url(url) => Cow::Borrowed(url),
            Self::Path(path) => path.to_string_lossy(),
            Self::Source(source) => Cow::Borrowed(source.name()),
        }
    }

    /// Returns the key the content registry binds this resource under.
    ///
    /// The key combines kind and identity, so two resources share a key
    /// exactly when they compare equal. A blank identity yields a blank key.
    #[must_use]
    pub fn registry_key(&self) -> String {
        let identity = self.identity();
        if identity.trim().is_empty() {
            String::new()
        } else {
            format!("{}:{identity}", self.kind())
        }
    }

    /// Returns a file-name-like label: last URL path segment, file name, or
    /// source name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Url(url) => url::Url::parse(url)
                .ok()
                .and_then(|parsed| {
                    parsed
                        .path_segments()
                        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                        .map(str::to_string)
                        .or_else(|| parsed.host_str().map(str::to_string))
                })
                .unwrap_or_else(|| url.clone()),
            Self::Path(path) => path.file_name().map_or_else(
                || path.to_string_lossy().into_owned(),
                |name| name.to_string_lossy().into_owned(),
            ),
            Self::Source(source) => source.name().to_string(),
        }
    }

    /// Short label of the variant, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Path(_) => "path",
            Self::Source(_) => "source",
        }
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.identity() == other.identity()
    }
}

impl Eq for Resource {}

impl From<url::Url> for Resource {
    fn from(url: url::Url) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<DataSource> for Resource {
    fn from(source: DataSource) -> Self {
        Self::Source(source)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.identity())
    }
}

/// Makes `path` absolute against the working directory and folds `.` and
/// `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
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
    fn test_url_identity_normalized() {
        let a = Resource::url("HTTP://Example.COM/images/logo.gif");
        let b = Resource::url("  http://example.com/images/logo.gif ");
        assert_eq!(a.identity(), "http://example.com/images/logo.gif");
        assert_eq!(a, b);
    }

    #[test]
    fn test_registry_key_follows_equality() {
        let url = Resource::url("http://example.com/logo.gif");
        let source = Resource::source(DataSource::from_bytes("http://example.com/logo.gif", vec![0]));
        assert_ne!(url, source);
        assert_ne!(url.registry_key(), source.registry_key());
        assert_eq!(url.registry_key(), Resource::url("HTTP://example.com/logo.gif").registry_key());
        assert_eq!(url.registry_key(), "url:http://example.com/logo.gif");
        assert!(Resource::source(DataSource::from_bytes(" ", vec![])).registry_key().is_empty());
    }

    #[test]
    fn test_unparseable_url_kept_trimmed() {
        let resource = Resource::url("  not a url ");
        assert_eq!(resource.identity(), "not a url");
    }

    #[test]
    fn test_url_display_name() {
        assert_eq!(
            Resource::url("http://example.com/images/logo.gif").display_name(),
            "logo.gif"
        );
        assert_eq!(
            Resource::url("http://example.com/dir/").display_name(),
            "dir"
        );
        assert_eq!(Resource::url("http://example.com").display_name(), "example.com");
    }

    #[test]
    fn test_path_identity_is_absolute_and_folded() {
        let resource = Resource::path("some/dir/../file.txt");
        let identity = resource.identity().into_owned();
        assert!(Path::new(&identity).is_absolute());
        assert!(identity.ends_with("some/file.txt") || identity.ends_with("some\\file.txt"));
        assert_eq!(resource, Resource::path("./some/file.txt"));
        assert_eq!(resource.display_name(), "file.txt");
    }

    #[test]
    fn test_source_identity_is_name() {
        let first = Resource::source(DataSource::from_bytes("logo", b"a".to_vec()));
        let second = Resource::source(DataSource::from_bytes("logo", b"b".to_vec()));
        assert_eq!(first.identity(), "logo");
        assert_eq!(first, second);
        assert_eq!(first.display_name(), "logo");
    }

    #[test]
    fn test_same_identity_different_kind_not_equal() {
        let url = Resource::url("logo");
        let source = Resource::source(DataSource::from_bytes("logo", Vec::new()));
        assert_ne!(url, source);
    }

    #[test]
    fn test_data_source_read() {
        let source = DataSource::from_bytes("blob", vec![1, 2, 3]).with_content_type("image/png");
        assert_eq!(source.read().unwrap(), vec![1, 2, 3]);
        assert_eq!(source.content_type(), Some("image/png"));

        let failing = DataSource::new("broken", || Err(io::Error::other("boom")));
        assert!(failing.read().is_err());
        assert!(format!("{failing:?}").contains("broken"));
    }
}
