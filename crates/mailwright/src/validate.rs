//! Input checks applied before parts reach the container.

use crate::error::{Error, Result};
use mailwright_mime::{ContentType, Part};

/// Parses a caller-supplied content type.
///
/// # Errors
///
/// Returns [`Error::InvalidContentType`] if the string is blank or not a
/// well-formed `type/subtype`.
pub fn content_type(raw: &str) -> Result<ContentType> {
    if raw.trim().is_empty() {
        return Err(Error::InvalidContentType("content type is empty".to_string()));
    }
    ContentType::parse(raw).map_err(|e| Error::InvalidContentType(e.to_string()))
}

/// Parses the content type of a single text or binary part.
///
/// # Errors
///
/// Returns [`Error::InvalidContentType`] as [`content_type`] does, and for
/// `multipart/*` types, which need nested parts.
pub fn leaf_content_type(raw: &str) -> Result<ContentType> {
    let parsed = content_type(raw)?;
    if parsed.is_multipart() {
        return Err(Error::InvalidContentType(format!(
            "{} requires nested parts",
            parsed.essence()
        )));
    }
    Ok(parsed)
}

/// Rejects empty content.
///
/// # Errors
///
/// Returns [`Error::InvalidContent`] if `content` is empty.
pub fn content(content: &str) -> Result<&str> {
    if content.is_empty() {
        return Err(Error::InvalidContent("content is empty".to_string()));
    }
    Ok(content)
}

/// Checks a prebuilt part and everything nested in it.
///
/// # Errors
///
/// Returns [`Error::InvalidContentType`] for a malformed content type and
/// [`Error::InvalidContent`] for an empty multipart or a body that does not
/// match its type.
pub fn part(part: &Part) -> Result<()> {
    part.validate().map_err(|e| match e {
        mailwright_mime::Error::InvalidContentType(reason) => Error::InvalidContentType(reason),
        mailwright_mime::Error::InvalidMultipart(reason) => Error::InvalidContent(reason),
        other => Error::Mime(other),
    })
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
    fn test_content_type_accepts_well_formed() {
        assert_eq!(content_type("text/plain").unwrap().essence(), "text/plain");
        assert_eq!(content_type("text/html; charset=utf-8").unwrap().charset(), Some("utf-8"));
        assert_eq!(content_type("subtype/123").unwrap().essence(), "subtype/123");
    }

    #[test]
    fn test_content_type_rejects_malformed() {
        for bad in ["", "   ", "xxx", "text/", "/html"] {
            assert!(
                matches!(content_type(bad), Err(Error::InvalidContentType(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_leaf_content_type_rejects_multipart() {
        assert_eq!(leaf_content_type("text/csv").unwrap().essence(), "text/csv");
        for multipart in ["multipart/alternative", "Multipart/Mixed"] {
            assert!(
                matches!(leaf_content_type(multipart), Err(Error::InvalidContentType(_))),
                "{multipart:?} should be rejected"
            );
        }
        assert!(matches!(leaf_content_type("xxx"), Err(Error::InvalidContentType(_))));
    }

    #[test]
    fn test_content() {
        assert_eq!(content("hi").unwrap(), "hi");
        assert_eq!(content(" ").unwrap(), " ");
        assert!(matches!(content(""), Err(Error::InvalidContent(_))));
    }

    #[test]
    fn test_nested_part() {
        let alternative = Part::multipart(
            "alternative",
            vec![
                Part::text("plain", ContentType::text_plain()),
                Part::text("<p>html</p>", ContentType::text_html()),
            ],
        );
        assert!(part(&alternative).is_ok());

        let empty = Part::multipart("alternative", Vec::new());
        assert!(matches!(part(&empty), Err(Error::InvalidContent(_))));

        let bad_child = Part::multipart(
            "mixed",
            vec![Part::text("x", ContentType::new("text", "pl ain"))],
        );
        assert!(matches!(part(&bad_child), Err(Error::InvalidContentType(_))));

        let flat_multipart = Part::text("x", ContentType::new("multipart", "mixed"));
        assert!(matches!(part(&flat_multipart), Err(Error::InvalidContent(_))));

        let nested_under_text = Part {
            body: mailwright_mime::Body::Multipart(vec![Part::text("x", ContentType::text_plain())]),
            ..Part::text("y", ContentType::text_plain())
        };
        assert!(matches!(part(&nested_under_text), Err(Error::InvalidContent(_))));
    }
}
