//! Inline embedding of resources.

use crate::container::PartContainer;
use crate::error::{Error, Result};
use crate::registry::ContentRegistry;
use crate::resolver::Resolver;
use crate::resource::Resource;
use mailwright_mime::{Disposition, Part};
use tracing::debug;

/// Embeds resources into a container, deduplicating by identity.
///
/// The sequence is: name policy, registry lookup (no I/O), content-id
/// conflict check, resolution, reservation, append. Any failure before the
/// reservation leaves both the registry and the container untouched.
pub struct Embedder<'a> {
    resolver: &'a dyn Resolver,
    require_name: bool,
}

impl<'a> Embedder<'a> {
    /// Creates an embedder.
    #[must_use]
    pub const fn new(resolver: &'a dyn Resolver, require_name: bool) -> Self {
        Self {
            resolver,
            require_name,
        }
    }

    /// Embeds `resource` and returns its content-id.
    ///
    /// `name` of `None` is rejected when names are required; an empty name
    /// is accepted. `content_id` requests a specific id for a first
    /// embedding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`], [`Error::InvalidIdentity`],
    /// [`Error::Conflict`], or any resolution error.
    pub fn embed(
        &self,
        registry: &mut ContentRegistry,
        container: &mut PartContainer,
        resource: &Resource,
        name: Option<&str>,
        content_id: Option<&str>,
    ) -> Result<String> {
        if name.is_none() && self.require_name {
            return Err(Error::InvalidName(format!(
                "a name is required to embed {resource}"
            )));
        }

        let identity = resource.registry_key();
        let requested = content_id.filter(|cid| !cid.is_empty());

        if registry.lookup(&identity, name)?.is_some() {
            let reservation = registry.lookup_or_reserve(&identity, name, requested)?;
            debug!("{resource} already embedded as {}", reservation.content_id);
            return Ok(reservation.content_id);
        }

        if let Some(requested) = requested {
            registry.conflict_check(&identity, requested)?;
        }

        let resolved = self.resolver.resolve(resource)?;

        let reservation = registry.lookup_or_reserve(&identity, name, requested)?;
        let file_name = name
            .filter(|n| !n.trim().is_empty())
            .map_or_else(|| resource.display_name(), str::to_string);

        let part = Part::binary(resolved.bytes, resolved.content_type)
            .with_content_id(reservation.content_id.clone())
            .with_disposition(Disposition::Inline)
            .with_file_name(file_name);
        container.append(part);

        debug!(
            "Embedded {resource} as {} at part {}",
            reservation.content_id,
            container.count() - 1
        );
        Ok(reservation.content_id)
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
    use crate::resolver::Resolved;
    use crate::resource::DataSource;
    use mailwright_mime::ContentType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver that counts calls and fails for identities containing "bad".
    struct CountingResolver {
        calls: AtomicUsize,
    }

    impl CountingResolver {
        const fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Resolver for CountingResolver {
        fn resolve(&self, resource: &Resource) -> Result<Resolved> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if resource.identity().contains("bad") {
                return Err(Error::UnreachableResource {
                    url: resource.identity().into_owned(),
                    reason: "refused".to_string(),
                });
            }
            Ok(Resolved {
                bytes: b"GIF89a".to_vec(),
                content_type: ContentType::new("image", "gif"),
            })
        }
    }

    fn setup() -> (ContentRegistry, PartContainer) {
        (ContentRegistry::new("test"), PartContainer::new())
    }

    #[test]
    fn test_embed_appends_inline_part() {
        let resolver = CountingResolver::new();
        let embedder = Embedder::new(&resolver, true);
        let (mut registry, mut container) = setup();

        let cid = embedder
            .embed(
                &mut registry,
                &mut container,
                &Resource::url("http://example.com/logo.gif"),
                Some("logo"),
                None,
            )
            .unwrap();

        assert_eq!(cid, "part0001.test");
        let part = container.part_at(0).unwrap();
        assert_eq!(part.content_id.as_deref(), Some(cid.as_str()));
        assert_eq!(part.disposition, Some(Disposition::Inline));
        assert_eq!(part.file_name.as_deref(), Some("logo"));
        assert_eq!(part.content_type.essence(), "image/gif");
    }

    #[test]
    fn test_reembed_skips_resolution() {
        let resolver = CountingResolver::new();
        let embedder = Embedder::new(&resolver, true);
        let (mut registry, mut container) = setup();
        let resource = Resource::url("http://example.com/logo.gif");

        let first = embedder
            .embed(&mut registry, &mut container, &resource, Some("logo"), None)
            .unwrap();
        let second = embedder
            .embed(&mut registry, &mut container, &resource, Some("logo"), None)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(container.count(), 1);
        assert_eq!(resolver.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_name_policy() {
        let resolver = CountingResolver::new();
        let (mut registry, mut container) = setup();
        let resource = Resource::source(DataSource::from_bytes("blob", vec![1]));

        let strict = Embedder::new(&resolver, true);
        let missing = strict.embed(&mut registry, &mut container, &resource, None, None);
        assert!(matches!(missing, Err(Error::InvalidName(_))));
        assert!(strict
            .embed(&mut registry, &mut container, &resource, Some(""), None)
            .is_ok());

        let lenient = Embedder::new(&resolver, false);
        let other = Resource::source(DataSource::from_bytes("other", vec![2]));
        assert!(lenient
            .embed(&mut registry, &mut container, &other, None, None)
            .is_ok());
        assert_eq!(container.part_at(1).unwrap().file_name.as_deref(), Some("other"));
    }

    #[test]
    fn test_failure_leaves_state_untouched() {
        let resolver = CountingResolver::new();
        let embedder = Embedder::new(&resolver, true);
        let (mut registry, mut container) = setup();

        let result = embedder.embed(
            &mut registry,
            &mut container,
            &Resource::url("http://bad.example.com/x.gif"),
            Some("x"),
            None,
        );

        assert!(matches!(result, Err(Error::UnreachableResource { .. })));
        assert_eq!(container.count(), 0);
        assert!(registry.is_empty());
        assert!(registry.identity_for_name("x").is_none());
    }

    #[test]
    fn test_conflicting_cid_checked_before_io() {
        let resolver = CountingResolver::new();
        let embedder = Embedder::new(&resolver, true);
        let (mut registry, mut container) = setup();

        embedder
            .embed(
                &mut registry,
                &mut container,
                &Resource::url("http://example.com/a.gif"),
                Some("a"),
                Some("A"),
            )
            .unwrap();
        let result = embedder.embed(
            &mut registry,
            &mut container,
            &Resource::url("http://example.com/b.gif"),
            Some("b"),
            Some("A"),
        );

        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(resolver.calls.load(Ordering::Relaxed), 1);
        assert_eq!(container.count(), 1);
    }
}
