//! Turning resource references into bytes.

use crate::config::ComposeConfig;
use crate::error::{Error, Result};
use crate::resource::{DataSource, Resource};
use mailwright_mime::ContentType;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Bytes and content type of a resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Raw content.
    pub bytes: Vec<u8>,
    /// Content type reported by the source or inferred from its name.
    pub content_type: ContentType,
}

/// Fetches the bytes behind a [`Resource`].
///
/// Implementations must map failures onto the resolution errors:
/// [`Error::UnreachableResource`] for URLs, [`Error::MissingFile`] and
/// [`Error::NotAFile`] for paths, [`Error::UnreadableSource`] for sources.
pub trait Resolver: Send + Sync {
    /// Resolves a resource.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if the bytes cannot be obtained.
    fn resolve(&self, resource: &Resource) -> Result<Resolved>;
}

/// Resolver backed by blocking HTTP, the filesystem and data-source
/// providers.
#[derive(Debug, Clone)]
pub struct DefaultResolver {
    timeout: Duration,
    user_agent: String,
    use_system_proxy: bool,
    max_size: Option<u64>,
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new(&ComposeConfig::default())
    }
}

impl DefaultResolver {
    /// Creates a resolver using the fetch settings of `config`.
    #[must_use]
    pub fn new(config: &ComposeConfig) -> Self {
        Self {
            timeout: config.fetch_timeout,
            user_agent: config.user_agent.clone(),
            use_system_proxy: config.use_system_proxy,
            max_size: config.max_resource_size,
        }
    }

    fn fetch_url(&self, raw: &str) -> Result<Resolved> {
        let unreachable = |reason: String| Error::UnreachableResource {
            url: raw.to_string(),
            reason,
        };

        let url = url::Url::parse(raw).map_err(|e| unreachable(format!("malformed URL: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| unreachable("not a local file URL".to_string()))?;
                return self.read_path(&path);
            }
            other => return Err(unreachable(format!("unsupported scheme {other:?}"))),
        }

        debug!("Fetching {url}");
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());
        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| unreachable(e.to_string()))?;

        let response = client.get(url.clone()).send().map_err(|e| {
            warn!("Fetch of {url} failed: {e}");
            unreachable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Fetch of {url} returned {status}");
            return Err(unreachable(format!("HTTP status {status}")));
        }

        if let Some(announced) = response.content_length() {
            self.check_size(raw, announced)?;
        }

        let header_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| ContentType::parse(value).ok());

        let bytes = self.read_body(raw, response)?;

        let content_type = header_type.unwrap_or_else(|| guess_content_type(url.path()));
        debug!("Fetched {} bytes of {content_type} from {url}", bytes.len());
        Ok(Resolved {
            bytes,
            content_type,
        })
    }

    /// Reads a response body, stopping one byte past the size limit so an
    /// unannounced oversize body is never buffered whole.
    fn read_body(&self, raw: &str, response: reqwest::blocking::Response) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let read = match self.max_size {
            Some(limit) => response
                .take(limit.saturating_add(1))
                .read_to_end(&mut bytes),
            None => {
                let mut response = response;
                response.read_to_end(&mut bytes)
            }
        };
        read.map_err(|e| Error::UnreachableResource {
            url: raw.to_string(),
            reason: format!("reading body: {e}"),
        })?;
        self.check_size(raw, bytes.len() as u64)?;
        Ok(bytes)
    }

    fn read_path(&self, path: &Path) -> Result<Resolved> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::MissingFile(path.to_path_buf())
            } else {
                Error::UnreadableSource {
                    name: path.display().to_string(),
                    source: e,
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }
        self.check_size(&path.display().to_string(), metadata.len())?;

        let bytes = std::fs::read(path).map_err(|e| Error::UnreadableSource {
            name: path.display().to_string(),
            source: e,
        })?;

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Resolved {
            bytes,
            content_type: guess_content_type(&path.to_string_lossy()),
        })
    }

    fn read_source(&self, source: &DataSource) -> Result<Resolved> {
        let bytes = source.read().map_err(|e| Error::UnreadableSource {
            name: source.name().to_string(),
            source: e,
        })?;
        self.check_size(source.name(), bytes.len() as u64)?;

        let content_type = source
            .content_type()
            .and_then(|declared| ContentType::parse(declared).ok())
            .unwrap_or_else(|| guess_content_type(source.name()));

        debug!("Read {} bytes from source {}", bytes.len(), source.name());
        Ok(Resolved {
            bytes,
            content_type,
        })
    }

    fn check_size(&self, identity: &str, size: u64) -> Result<()> {
        match self.max_size {
            Some(limit) if size > limit => Err(Error::ResourceTooLarge {
                identity: identity.to_string(),
                size,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

impl Resolver for DefaultResolver {
    fn resolve(&self, resource: &Resource) -> Result<Resolved> {
        match resource {
            Resource::Url(url) => self.fetch_url(url),
            Resource::Path(path) => self.read_path(path),
            Resource::Source(source) => self.read_source(source),
        }
    }
}

/// Infers a content type from a file name or URL path, falling back to
/// `application/octet-stream`.
#[must_use]
pub fn guess_content_type(name: &str) -> ContentType {
    mime_guess::from_path(name)
        .first()
        .and_then(|mime| ContentType::parse(mime.as_ref()).ok())
        .unwrap_or_else(ContentType::octet_stream)
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
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("logo.gif").essence(), "image/gif");
        assert_eq!(guess_content_type("/a/b/page.html").essence(), "text/html");
        assert_eq!(
            guess_content_type("no-extension").essence(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_source_resolution() {
        let resolver = DefaultResolver::default();
        let resolved = resolver
            .resolve(&Resource::source(DataSource::from_bytes("logo.png", vec![1, 2])))
            .unwrap();
        assert_eq!(resolved.bytes, vec![1, 2]);
        assert_eq!(resolved.content_type.essence(), "image/png");
    }

    #[test]
    fn test_declared_source_type_wins() {
        let resolver = DefaultResolver::default();
        let source = DataSource::from_bytes("blob", vec![0]).with_content_type("image/jpeg");
        let resolved = resolver.resolve(&Resource::source(source)).unwrap();
        assert_eq!(resolved.content_type.essence(), "image/jpeg");
    }

    #[test]
    fn test_failing_source() {
        let resolver = DefaultResolver::default();
        let source = DataSource::new("broken", || Err(io::Error::other("boom")));
        let result = resolver.resolve(&Resource::source(source));
        assert!(matches!(result, Err(Error::UnreadableSource { name, .. }) if name == "broken"));
    }

    #[test]
    fn test_source_over_limit() {
        let config = ComposeConfig::builder().max_resource_size(2).build();
        let resolver = DefaultResolver::new(&config);
        let result = resolver.resolve(&Resource::source(DataSource::from_bytes("big", vec![0; 3])));
        assert!(matches!(result, Err(Error::ResourceTooLarge { size: 3, limit: 2, .. })));
    }

    #[test]
    fn test_malformed_and_unsupported_urls() {
        let resolver = DefaultResolver::default();
        assert!(matches!(
            resolver.resolve(&Resource::url("not a url")),
            Err(Error::UnreachableResource { .. })
        ));
        assert!(matches!(
            resolver.resolve(&Resource::url("ftp://example.com/file")),
            Err(Error::UnreachableResource { .. })
        ));
    }

    #[test]
    fn test_missing_path() {
        let resolver = DefaultResolver::default();
        let result = resolver.resolve(&Resource::path("/definitely/not/here.txt"));
        assert!(matches!(result, Err(Error::MissingFile(_))));
    }

    #[test]
    fn test_directory_path() {
        let resolver = DefaultResolver::default();
        let result = resolver.resolve(&Resource::path(env!("CARGO_MANIFEST_DIR")));
        assert!(matches!(result, Err(Error::NotAFile(_))));
    }
}
