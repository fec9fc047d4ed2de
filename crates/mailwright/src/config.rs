//! Composition configuration.

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default timeout for remote resource fetches.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every operation of a composition session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Timeout for fetching remote resources (serialized as whole seconds).
    #[serde(with = "duration_secs")]
    pub fetch_timeout: Duration,
    /// Largest resource that may be embedded or attached, in bytes.
    pub max_resource_size: Option<u64>,
    /// User-Agent sent with remote fetches.
    pub user_agent: String,
    /// Honour `HTTP_PROXY`-style environment settings for remote fetches.
    pub use_system_proxy: bool,
    /// Reject `embed` calls that carry no logical name.
    pub require_embed_name: bool,
    /// Domain-like suffix of generated content-ids.
    pub content_id_suffix: String,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_resource_size: None,
            user_agent: format!("mailwright/{}", env!("CARGO_PKG_VERSION")),
            use_system_proxy: true,
            require_embed_name: true,
            content_id_suffix: "mailwright".to_string(),
        }
    }
}

impl ComposeConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ComposeConfigBuilder {
        ComposeConfigBuilder::new()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading compose config from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Serializes the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Builder for [`ComposeConfig`].
#[derive(Debug, Clone, Default)]
pub struct ComposeConfigBuilder {
    config: ComposeConfig,
}

impl ComposeConfigBuilder {
    /// Creates a builder seeded with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the remote fetch timeout.
    #[must_use]
    pub const fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Sets the resource size limit.
    #[must_use]
    pub const fn max_resource_size(mut self, limit: u64) -> Self {
        self.config.max_resource_size = Some(limit);
        self
    }

    /// Sets the User-Agent for remote fetches.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Sets whether remote fetches go through the environment's proxy.
    #[must_use]
    pub const fn use_system_proxy(mut self, enabled: bool) -> Self {
        self.config.use_system_proxy = enabled;
        self
    }

    /// Sets whether `embed` requires a logical name.
    #[must_use]
    pub const fn require_embed_name(mut self, required: bool) -> Self {
        self.config.require_embed_name = required;
        self
    }

    /// Sets the suffix of generated content-ids.
    #[must_use]
    pub fn content_id_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.content_id_suffix = suffix.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ComposeConfig {
        self.config
    }
}

/// Serde helpers for `Duration` as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::trivially_copy_pass_by_ref)] // Required by serde with= signature
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
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
        let config = ComposeConfig::default();
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert!(config.require_embed_name);
        assert_eq!(config.content_id_suffix, "mailwright");
        assert!(config.max_resource_size.is_none());
        assert!(config.user_agent.starts_with("mailwright/"));
    }

    #[test]
    fn test_builder() {
        let config = ComposeConfig::builder()
            .fetch_timeout(Duration::from_secs(5))
            .max_resource_size(1024)
            .user_agent("test-agent")
            .use_system_proxy(false)
            .require_embed_name(false)
            .content_id_suffix("example.org")
            .build();

        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.max_resource_size, Some(1024));
        assert_eq!(config.user_agent, "test-agent");
        assert!(!config.use_system_proxy);
        assert!(!config.require_embed_name);
        assert_eq!(config.content_id_suffix, "example.org");
    }

    #[test]
    fn test_from_json_partial() {
        let config = ComposeConfig::from_json(r#"{"fetch_timeout": 7}"#).unwrap();
        assert_eq!(config.fetch_timeout, Duration::from_secs(7));
        assert!(config.require_embed_name);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ComposeConfig::builder().max_resource_size(10).build();
        let json = config.to_json().unwrap();
        assert_eq!(ComposeConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            ComposeConfig::from_json("{not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            ComposeConfig::from_file("/definitely/not/here.json"),
            Err(Error::Config(_))
        ));
    }
}
