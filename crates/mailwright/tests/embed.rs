//! Integration tests for inline embedding.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::atomic::Ordering;

use common::{add_text_parts, addressed, fixture, init_tracing, stub_resolver};
use mailwright::{DataSource, Disposition, Email, Error, MessageKind, Resource};
use proptest::prelude::*;

const FEATHER: &str = "http://www.apache.org/images/feather.gif";
const LOGO: &str = "http://www.apache.org/images/asf_logo.gif";

#[test]
fn test_embed_url_generates_content_id() {
    init_tracing();
    let mut email = addressed(MessageKind::Html);
    let cid = email.embed(&Resource::url(FEATHER), Some("feather")).unwrap();

    assert!(!cid.is_empty());
    assert_eq!(email.part_count(), 1);
    let part = email.part_at(0).unwrap();
    assert_eq!(part.content_id.as_deref(), Some(cid.as_str()));
    assert_eq!(part.disposition, Some(Disposition::Inline));
    assert_eq!(part.content_type.essence(), "image/gif");
}

#[test]
fn test_embed_same_url_twice_reuses_id() {
    let resolver = stub_resolver();
    let calls = resolver.calls();
    let mut email = Email::html().with_resolver(resolver);

    let first = email.embed(&Resource::url(FEATHER), Some("feather")).unwrap();
    let second = email.embed(&Resource::url(FEATHER), Some("feather")).unwrap();

    assert_eq!(first, second);
    assert_eq!(email.part_count(), 1);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn test_embed_equivalent_url_spellings_share_id() {
    let mut email = addressed(MessageKind::Html);
    let first = email.embed(&Resource::url(FEATHER), Some("feather")).unwrap();
    let second = email
        .embed(&Resource::url("HTTP://WWW.APACHE.ORG/images/feather.gif"), Some("feather"))
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(email.part_count(), 1);
}

#[test]
fn test_embed_different_url_same_name_conflicts() {
    let mut email = addressed(MessageKind::Html);
    email.embed(&Resource::url(FEATHER), Some("image")).unwrap();

    let result = email.embed(&Resource::url(LOGO), Some("image"));
    assert!(matches!(result, Err(Error::Conflict(_))));
    assert_eq!(email.part_count(), 1);
}

#[test]
fn test_embed_same_url_under_new_name_reuses_id() {
    let mut email = addressed(MessageKind::Html);
    let first = email.embed(&Resource::url(FEATHER), Some("feather")).unwrap();
    let second = email.embed(&Resource::url(FEATHER), Some("bird")).unwrap();
    assert_eq!(first, second);
    assert_eq!(email.part_count(), 1);
}

#[test]
fn test_embed_file_with_explicit_cid() {
    let mut email = addressed(MessageKind::Html);
    let file = Resource::path(fixture("testfile.txt"));

    let cid = email.embed_with_cid(&file, Some("testfile.txt"), "A").unwrap();
    assert_eq!(cid, "A");
    assert_eq!(email.content_id_for(&file), Some("A"));

    let again = email.embed_with_cid(&file, Some("testfile.txt"), "A").unwrap();
    assert_eq!(again, "A");
    assert_eq!(email.part_count(), 1);

    let part = email.part_at(0).unwrap();
    assert_eq!(part.content_type.essence(), "text/plain");
    assert_eq!(part.file_name.as_deref(), Some("testfile.txt"));
}

#[test]
fn test_embed_file_with_other_cid_conflicts() {
    let mut email = addressed(MessageKind::Html);
    let file = Resource::path(fixture("testfile.txt"));
    email.embed_with_cid(&file, Some("testfile.txt"), "A").unwrap();

    let result = email.embed_with_cid(&file, Some("testfile.txt"), "B");
    assert!(matches!(result, Err(Error::Conflict(_))));
}

#[test]
fn test_embed_data_source_twice() {
    let mut email = addressed(MessageKind::Html);
    let source = Resource::source(
        DataSource::from_bytes("logo.png", b"png".to_vec()).with_content_type("image/png"),
    );

    let first = email.embed(&source, Some("logo")).unwrap();
    let second = email.embed(&source, Some("logo")).unwrap();
    assert_eq!(first, second);
    assert_eq!(email.part_count(), 1);
    assert_eq!(email.part_at(0).unwrap().content_type.essence(), "image/png");
}

#[test]
fn test_embed_different_source_same_name_conflicts() {
    let mut email = addressed(MessageKind::Html);
    email
        .embed(&Resource::source(DataSource::from_bytes("one", vec![1])), Some("logo"))
        .unwrap();
    let result = email.embed(&Resource::source(DataSource::from_bytes("two", vec![2])), Some("logo"));
    assert!(matches!(result, Err(Error::Conflict(_))));
}

#[test]
fn test_embed_source_named_like_url_is_distinct() {
    let mut email = addressed(MessageKind::Html);
    let url = FEATHER;
    let from_url = email.embed(&Resource::url(url), Some("a")).unwrap();
    let from_source = email
        .embed(
            &Resource::source(DataSource::from_bytes(url, b"other bytes".to_vec())),
            Some("b"),
        )
        .unwrap();

    assert_ne!(from_url, from_source);
    assert_eq!(email.part_count(), 2);
    assert_eq!(email.part_at(1).unwrap().content_bytes(), Some(&b"other bytes"[..]));
}

#[test]
fn test_embed_missing_file_leaves_parts_unchanged() {
    let mut email = addressed(MessageKind::Html);
    add_text_parts(&mut email, 2);

    let result = email.embed(&Resource::path(fixture("does-not-exist.txt")), Some("missing"));
    assert!(matches!(result, Err(Error::MissingFile(_))));
    assert_eq!(email.part_count(), 2);
}

#[test]
fn test_embed_directory_fails() {
    let mut email = addressed(MessageKind::Html);
    let result = email.embed(&Resource::path(fixture("nested")), Some("nested"));
    assert!(matches!(result, Err(Error::NotAFile(_))));
    assert_eq!(email.part_count(), 0);
}

#[test]
fn test_embed_unreachable_url_leaves_state_unchanged() {
    let mut email = addressed(MessageKind::Html);
    let missing = Resource::url("http://localhost/nothing-here.gif");

    let result = email.embed(&missing, Some("nothing"));
    assert!(matches!(result, Err(Error::UnreachableResource { .. })));
    assert_eq!(email.part_count(), 0);
    assert!(email.content_id_for(&missing).is_none());

    // The name was not bound by the failed call
    email.embed(&Resource::url(FEATHER), Some("nothing")).unwrap();
}

#[test]
fn test_embed_name_policy() {
    let mut email = addressed(MessageKind::Html);
    let result = email.embed(&Resource::url(FEATHER), None);
    assert!(matches!(result, Err(Error::InvalidName(_))));

    let cid = email.embed(&Resource::url(FEATHER), Some("")).unwrap();
    assert!(!cid.is_empty());
    assert_eq!(email.part_at(0).unwrap().file_name.as_deref(), Some("feather.gif"));
}

#[test]
fn test_embed_after_three_parts_is_fourth() {
    let mut email = addressed(MessageKind::Html);
    add_text_parts(&mut email, 3);

    let cid = email.embed(&Resource::url("http://localhost/a.png"), Some("a")).unwrap();
    let message = email.build().unwrap();

    assert_eq!(message.part_count(), 4);
    let fourth = message.part(3).unwrap();
    assert_eq!(fourth.content_id.as_deref(), Some(cid.as_str()));
    assert!(!cid.is_empty());
}

#[test]
fn test_sessions_do_not_share_registries() {
    let mut first = addressed(MessageKind::Html);
    let mut second = addressed(MessageKind::Html);
    first.embed(&Resource::url(FEATHER), Some("feather")).unwrap();

    // The name is only bound inside the first session
    second.embed(&Resource::url(LOGO), Some("feather")).unwrap();

    assert!(first.content_id_for(&Resource::url(LOGO)).is_none());
    assert!(second.content_id_for(&Resource::url(FEATHER)).is_none());
    assert_eq!(first.part_count(), 1);
    assert_eq!(second.part_count(), 1);
}

proptest! {
    #[test]
    fn prop_embedding_is_idempotent(
        name in "[a-z]{1,12}",
        payload in prop::collection::vec(any::<u8>(), 1..64),
        repeats in 2usize..5,
    ) {
        let mut email = Email::html();
        let resource = Resource::source(DataSource::from_bytes(name.clone(), payload));
        let before = email.part_count();

        let first = email.embed(&resource, Some(&name)).unwrap();
        for _ in 1..repeats {
            prop_assert_eq!(email.embed(&resource, Some(&name)).unwrap(), first.clone());
        }
        prop_assert_eq!(email.part_count(), before + 1);
    }
}
