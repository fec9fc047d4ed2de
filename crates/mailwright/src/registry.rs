//! Content registry: resource identity to content-id bindings.
//!
//! The registry is what makes embedding idempotent. It is owned by a single
//! composition session and cleared with it.

use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Generator for content-ids of the form `part0001.<suffix>`.
#[derive(Debug, Clone)]
pub struct ContentIdGenerator {
    counter: u32,
    suffix: String,
}

impl ContentIdGenerator {
    /// Creates a generator with the given suffix.
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            counter: 0,
            suffix: suffix.into(),
        }
    }

    /// Generates the next id.
    #[must_use]
    pub fn next_id(&mut self) -> String {
        self.counter = self.counter.wrapping_add(1);
        format!("part{:04}.{}", self.counter, self.suffix)
    }

    /// Returns the number of ids generated so far.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.counter
    }

    /// Resets the counter to zero.
    pub const fn reset(&mut self) {
        self.counter = 0;
    }
}

impl Default for ContentIdGenerator {
    fn default() -> Self {
        Self::new("mailwright")
    }
}

/// Outcome of [`ContentRegistry::lookup_or_reserve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// The content-id bound to the identity.
    pub content_id: String,
    /// True if the binding was created by this call.
    pub is_new: bool,
}

/// Maps resource identities to content-ids.
///
/// Logical names are advisory: a non-blank name may only ever refer to one
/// identity, but blank names never conflict, and one identity may be
/// registered under several names.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    by_identity: HashMap<String, String>,
    by_name: HashMap<String, String>,
    by_cid: HashMap<String, String>,
    ids: ContentIdGenerator,
}

impl ContentRegistry {
    /// Creates an empty registry whose generated ids end in `suffix`.
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            ids: ContentIdGenerator::new(suffix),
            ..Self::default()
        }
    }

    /// Returns the content-id already bound to `identity`, without changing
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentity`] for an empty identity and
    /// [`Error::Conflict`] if `name` is bound to a different identity.
    pub fn lookup(&self, identity: &str, name: Option<&str>) -> Result<Option<String>> {
        if identity.trim().is_empty() {
            return Err(Error::InvalidIdentity);
        }
        self.check_name(identity, name)?;
        Ok(self.by_identity.get(identity).cloned())
    }

    /// Returns the existing binding for `identity` or creates one.
    ///
    /// A new binding uses `requested` when given (and non-empty), otherwise
    /// a generated id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentity`] for an empty identity, and
    /// [`Error::Conflict`] if the name or requested id is bound elsewhere or
    /// the identity already has a different id.
    pub fn lookup_or_reserve(
        &mut self,
        identity: &str,
        name: Option<&str>,
        requested: Option<&str>,
    ) -> Result<Reservation> {
        let requested = requested.filter(|cid| !cid.is_empty());

        if let Some(existing) = self.lookup(identity, name)? {
            if let Some(requested) = requested.filter(|cid| *cid != existing) {
                return Err(Error::Conflict(format!(
                    "{identity} is already embedded as {existing}, not {requested}"
                )));
            }
            self.record_name(identity, name);
            trace!("Reusing content-id {existing} for {identity}");
            return Ok(Reservation {
                content_id: existing,
                is_new: false,
            });
        }

        let content_id = match requested {
            Some(requested) => {
                self.conflict_check(identity, requested)?;
                requested.to_string()
            }
            None => self.generate_id(),
        };

        self.by_identity
            .insert(identity.to_string(), content_id.clone());
        self.by_cid.insert(content_id.clone(), identity.to_string());
        self.record_name(identity, name);
        debug!("Reserved content-id {content_id} for {identity}");

        Ok(Reservation {
            content_id,
            is_new: true,
        })
    }

    /// Fails if `content_id` is bound to an identity other than `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] on a foreign binding.
    pub fn conflict_check(&self, identity: &str, content_id: &str) -> Result<()> {
        match self.by_cid.get(content_id) {
            Some(bound) if bound != identity => Err(Error::Conflict(format!(
                "content-id {content_id} already refers to {bound}"
            ))),
            _ => Ok(()),
        }
    }

    /// Returns true if `identity` has a content-id.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.by_identity.contains_key(identity)
    }

    /// Returns the content-id bound to `identity`.
    #[must_use]
    pub fn content_id(&self, identity: &str) -> Option<&str> {
        self.by_identity.get(identity).map(String::as_str)
    }

    /// Returns the identity a non-blank name is bound to.
    #[must_use]
    pub fn identity_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Number of registered identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    /// Drops all bindings and restarts id generation.
    pub fn clear(&mut self) {
        self.by_identity.clear();
        self.by_name.clear();
        self.by_cid.clear();
        self.ids.reset();
    }

    fn check_name(&self, identity: &str, name: Option<&str>) -> Result<()> {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return Ok(());
        };
        match self.by_name.get(name) {
            Some(bound) if bound != identity => Err(Error::Conflict(format!(
                "name {name:?} already refers to {bound}"
            ))),
            _ => Ok(()),
        }
    }

    fn record_name(&mut self, identity: &str, name: Option<&str>) {
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            self.by_name
                .entry(name.to_string())
                .or_insert_with(|| identity.to_string());
        }
    }

    fn generate_id(&mut self) -> String {
        loop {
            let candidate = self.ids.next_id();
            if !self.by_cid.contains_key(&candidate) {
                return candidate;
            }
        }
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
    fn test_generator_format() {
        let mut ids = ContentIdGenerator::new("example.org");
        assert_eq!(ids.next_id(), "part0001.example.org");
        assert_eq!(ids.next_id(), "part0002.example.org");
        assert_eq!(ids.current(), 2);
        ids.reset();
        assert_eq!(ids.next_id(), "part0001.example.org");
    }

    #[test]
    fn test_reserve_then_reuse() {
        let mut registry = ContentRegistry::new("test");
        let first = registry.lookup_or_reserve("http://a/x.gif", Some("x"), None).unwrap();
        assert!(first.is_new);
        assert_eq!(first.content_id, "part0001.test");

        let second = registry.lookup_or_reserve("http://a/x.gif", Some("x"), None).unwrap();
        assert!(!second.is_new);
        assert_eq!(second.content_id, first.content_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_name_conflict() {
        let mut registry = ContentRegistry::default();
        registry.lookup_or_reserve("r1", Some("n"), None).unwrap();
        let result = registry.lookup_or_reserve("r2", Some("n"), None);
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_blank_names_never_conflict() {
        let mut registry = ContentRegistry::default();
        let a = registry.lookup_or_reserve("r1", Some(""), None).unwrap();
        let b = registry.lookup_or_reserve("r2", Some(""), None).unwrap();
        let c = registry.lookup_or_reserve("r3", None, None).unwrap();
        assert_ne!(a.content_id, b.content_id);
        assert_ne!(b.content_id, c.content_id);
    }

    #[test]
    fn test_same_identity_new_name_reuses_id() {
        let mut registry = ContentRegistry::default();
        let a = registry.lookup_or_reserve("r1", Some("first"), None).unwrap();
        let b = registry.lookup_or_reserve("r1", Some("second"), None).unwrap();
        assert_eq!(a.content_id, b.content_id);
        assert_eq!(registry.identity_for_name("second"), Some("r1"));
    }

    #[test]
    fn test_requested_id() {
        let mut registry = ContentRegistry::default();
        let reservation = registry.lookup_or_reserve("file", Some("f"), Some("A")).unwrap();
        assert_eq!(reservation.content_id, "A");

        let again = registry.lookup_or_reserve("file", Some("f"), Some("A")).unwrap();
        assert!(!again.is_new);

        let mismatch = registry.lookup_or_reserve("file", Some("f"), Some("B"));
        assert!(matches!(mismatch, Err(Error::Conflict(_))));

        let taken = registry.lookup_or_reserve("other", Some("g"), Some("A"));
        assert!(matches!(taken, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_empty_requested_id_means_generated() {
        let mut registry = ContentRegistry::new("s");
        let reservation = registry.lookup_or_reserve("file", None, Some("")).unwrap();
        assert_eq!(reservation.content_id, "part0001.s");
    }

    #[test]
    fn test_generated_ids_skip_requested_ones() {
        let mut registry = ContentRegistry::new("s");
        registry.lookup_or_reserve("a", None, Some("part0001.s")).unwrap();
        let generated = registry.lookup_or_reserve("b", None, None).unwrap();
        assert_eq!(generated.content_id, "part0002.s");
    }

    #[test]
    fn test_empty_identity() {
        let mut registry = ContentRegistry::default();
        assert!(matches!(registry.lookup("", None), Err(Error::InvalidIdentity)));
        assert!(matches!(
            registry.lookup_or_reserve("  ", Some("x"), None),
            Err(Error::InvalidIdentity)
        ));
    }

    #[test]
    fn test_lookup_has_no_side_effects() {
        let registry = ContentRegistry::default();
        assert_eq!(registry.lookup("r1", Some("n")).unwrap(), None);
        assert!(registry.is_empty());
        assert!(registry.identity_for_name("n").is_none());
    }

    #[test]
    fn test_conflict_check() {
        let mut registry = ContentRegistry::default();
        registry.lookup_or_reserve("r1", None, Some("cid")).unwrap();
        assert!(registry.conflict_check("r1", "cid").is_ok());
        assert!(registry.conflict_check("r2", "unused").is_ok());
        assert!(matches!(registry.conflict_check("r2", "cid"), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_clear() {
        let mut registry = ContentRegistry::new("s");
        registry.lookup_or_reserve("r1", Some("n"), None).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains("r1"));
        let again = registry.lookup_or_reserve("r2", Some("n"), None).unwrap();
        assert_eq!(again.content_id, "part0001.s");
    }
}
