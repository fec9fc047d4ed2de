//! Ordered body parts of a message under composition.

use crate::error::{Error, Result};
use mailwright_mime::Part;
use tracing::trace;

/// Ordered list of body parts.
///
/// Parts are only ever appended or inserted; nothing reorders or removes
/// them short of [`clear`](Self::clear).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartContainer {
    parts: Vec<Part>,
}

impl PartContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a part at the end.
    pub fn append(&mut self, part: Part) {
        trace!("Appending {} part at {}", part.content_type.essence(), self.parts.len());
        self.parts.push(part);
    }

    /// Inserts a part at `index`. Inserting at [`count`](Self::count)
    /// appends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is past the end.
    pub fn insert_at(&mut self, part: Part, index: usize) -> Result<()> {
        let len = self.parts.len();
        if index > len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        trace!("Inserting {} part at {index}", part.content_type.essence());
        self.parts.insert(index, part);
        Ok(())
    }

    /// Number of parts.
    #[must_use]
    pub fn count(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if there are no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns the part at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if there is no such part.
    pub fn part_at(&self, index: usize) -> Result<&Part> {
        self.parts.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.parts.len(),
        })
    }

    /// Iterates over the parts in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Part> {
        self.parts.iter()
    }

    /// Returns the parts as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Part] {
        &self.parts
    }

    /// Removes every part.
    pub fn clear(&mut self) {
        self.parts.clear();
    }
}

impl<'a> IntoIterator for &'a PartContainer {
    type Item = &'a Part;
    type IntoIter = std::slice::Iter<'a, Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
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
    use mailwright_mime::ContentType;

    fn text(s: &str) -> Part {
        Part::text(s, ContentType::text_plain())
    }

    #[test]
    fn test_append_and_count() {
        let mut container = PartContainer::new();
        assert!(container.is_empty());
        container.append(text("a"));
        container.append(text("b"));
        assert_eq!(container.count(), 2);
        assert_eq!(container.part_at(1).unwrap().text_content(), Some("b"));
    }

    #[test]
    fn test_insert_at_bounds() {
        let mut container = PartContainer::new();
        container.insert_at(text("a"), 0).unwrap();
        container.insert_at(text("c"), 1).unwrap();
        container.insert_at(text("b"), 1).unwrap();

        let order: Vec<_> = container.iter().filter_map(Part::text_content).collect();
        assert_eq!(order, vec!["a", "b", "c"]);

        let result = container.insert_at(text("x"), 4);
        assert!(matches!(result, Err(Error::IndexOutOfRange { index: 4, len: 3 })));
        assert_eq!(container.count(), 3);
    }

    #[test]
    fn test_part_at_out_of_range() {
        let container = PartContainer::new();
        assert!(matches!(
            container.part_at(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_clear() {
        let mut container = PartContainer::new();
        container.append(text("a"));
        container.clear();
        assert_eq!(container.count(), 0);
    }
}
