//! Shared helpers for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mailwright::{
    ContentType, DefaultResolver, Email, Error, MessageKind, Resolved, Resolver, Resource, Result,
};

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Resolver serving canned bytes for registered URLs and delegating paths
/// and data sources to the default resolver. Unregistered URLs are
/// unreachable.
#[derive(Clone, Default)]
pub struct StubResolver {
    urls: HashMap<String, (Vec<u8>, ContentType)>,
    calls: Arc<AtomicUsize>,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bytes` for `url`.
    pub fn with_url(mut self, url: &str, bytes: &[u8], content_type: &str) -> Self {
        let key = Resource::url(url).identity().into_owned();
        self.urls.insert(
            key,
            (bytes.to_vec(), ContentType::parse(content_type).unwrap()),
        );
        self
    }

    /// Shared counter of `resolve` calls, readable after the resolver has
    /// been moved into a session.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Resolver for StubResolver {
    fn resolve(&self, resource: &Resource) -> Result<Resolved> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match resource {
            Resource::Url(url) => self
                .urls
                .get(url)
                .map(|(bytes, content_type)| Resolved {
                    bytes: bytes.clone(),
                    content_type: content_type.clone(),
                })
                .ok_or_else(|| Error::UnreachableResource {
                    url: url.clone(),
                    reason: "no such stub".to_string(),
                }),
            other => DefaultResolver::default().resolve(other),
        }
    }
}

/// Resolver with the URLs the tests embed.
pub fn stub_resolver() -> StubResolver {
    StubResolver::new()
        .with_url("http://www.apache.org/images/feather.gif", b"GIF89a-feather", "image/gif")
        .with_url("http://www.apache.org/images/asf_logo.gif", b"GIF89a-logo", "image/gif")
        .with_url("http://localhost/a.png", b"\x89PNG-a", "image/png")
}

/// A session of `kind` with sender and one recipient, wired to the stub.
pub fn addressed(kind: MessageKind) -> Email {
    let mut email = Email::new(kind).with_resolver(stub_resolver());
    email
        .set_from("me@apache.org")
        .unwrap()
        .add_to("you@apache.org")
        .unwrap();
    email
}

/// Appends `n` plain-text parts.
pub fn add_text_parts(email: &mut Email, n: usize) {
    for i in 0..n {
        email.add_part(&format!("part {i}"), "text/plain").unwrap();
    }
}

/// Installs a test subscriber once so `RUST_LOG` shows library logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
