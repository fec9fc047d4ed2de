//! Integration tests for adding and inserting body parts.

#![allow(clippy::unwrap_used)]

mod common;

use common::{add_text_parts, addressed};
use mailwright::{ContentType, Email, Error, MessageKind, Part};
use proptest::prelude::*;

#[test]
fn test_add_part_with_various_content_types() {
    let mut email = addressed(MessageKind::Multipart);
    email.add_part("hello", "text/plain").unwrap();
    email.add_part("<p>hello</p>", "text/html; charset=utf-8").unwrap();
    email.add_part("data", "subtype/123").unwrap();

    assert_eq!(email.part_count(), 3);
    assert_eq!(email.part_at(1).unwrap().content_type.essence(), "text/html");
    assert_eq!(email.part_at(2).unwrap().content_type.essence(), "subtype/123");
}

#[test]
fn test_add_part_rejects_bad_content_types() {
    let mut email = addressed(MessageKind::Multipart);
    for bad in ["", "xxx", "text/", "text/pl ain"] {
        assert!(
            matches!(email.add_part("x", bad), Err(Error::InvalidContentType(_))),
            "{bad:?} should be rejected"
        );
    }
    assert_eq!(email.part_count(), 0);
}

#[test]
fn test_add_part_rejects_multipart_content_type() {
    let mut email = addressed(MessageKind::Multipart);
    let result = email.add_part("x", "multipart/alternative");
    assert!(matches!(result, Err(Error::InvalidContentType(_))));
    assert_eq!(email.part_count(), 0);
    assert!(email.build().is_ok());
}

#[test]
fn test_add_part_rejects_empty_content() {
    let mut email = addressed(MessageKind::Multipart);
    assert!(matches!(email.add_part("", "text/plain"), Err(Error::InvalidContent(_))));
}

#[test]
fn test_add_part_at_bounds() {
    let mut email = addressed(MessageKind::Multipart);
    add_text_parts(&mut email, 2);

    let part = Part::text("first", ContentType::text_plain());
    email.add_part_at(part, 0).unwrap();
    assert_eq!(email.part_at(0).unwrap().text_content(), Some("first"));

    let last = Part::text("last", ContentType::text_plain());
    email.add_part_at(last, 3).unwrap();
    assert_eq!(email.part_at(3).unwrap().text_content(), Some("last"));

    let beyond = Part::text("beyond", ContentType::text_plain());
    let result = email.add_part_at(beyond, 5);
    assert!(matches!(result, Err(Error::IndexOutOfRange { index: 5, len: 4 })));
    assert_eq!(email.part_count(), 4);
}

#[test]
fn test_add_nested_alternative_part() {
    let mut email = addressed(MessageKind::Multipart);
    let alternative = Part::multipart(
        "alternative",
        vec![
            Part::text("plain version", ContentType::text_plain()),
            Part::text("<b>html version</b>", ContentType::text_html()),
        ],
    );
    email.add_part_at(alternative, 0).unwrap();
    email.add_part("trailer", "text/plain").unwrap();

    let message = email.build().unwrap();
    assert_eq!(message.part_count(), 2);
    assert_eq!(message.part(0).unwrap().parts().len(), 2);

    let rendered = message.to_string();
    assert!(rendered.contains("Content-Type: multipart/mixed; boundary="));
    assert!(rendered.contains("Content-Type: multipart/alternative; boundary="));
}

#[test]
fn test_empty_multipart_rejected() {
    let mut email = addressed(MessageKind::Multipart);
    let result = email.append_part(Part::multipart("alternative", Vec::new()));
    assert!(matches!(result, Err(Error::InvalidContent(_))));
    assert_eq!(email.part_count(), 0);
}

#[test]
fn test_parts_keep_insertion_order_in_output() {
    let mut email = addressed(MessageKind::Multipart);
    email.add_part("alpha", "text/plain").unwrap();
    email.add_part("gamma", "text/plain").unwrap();
    email
        .add_part_at(Part::text("beta", ContentType::text_plain()), 1)
        .unwrap();

    let rendered = email.build().unwrap().to_string();
    let alpha = rendered.find("alpha").unwrap();
    let beta = rendered.find("beta").unwrap();
    let gamma = rendered.find("gamma").unwrap();
    assert!(alpha < beta && beta < gamma);
}

proptest! {
    #[test]
    fn prop_insert_at_respects_bounds(existing in 0usize..6, index in 0usize..10) {
        let mut email = Email::multipart();
        add_text_parts(&mut email, existing);

        let result = email.add_part_at(Part::text("x", ContentType::text_plain()), index);
        if index <= existing {
            prop_assert!(result.is_ok());
            prop_assert_eq!(email.part_count(), existing + 1);
            prop_assert_eq!(email.part_at(index).unwrap().text_content(), Some("x"));
        } else {
            let out_of_range = matches!(result, Err(Error::IndexOutOfRange { .. }));
            prop_assert!(out_of_range);
            prop_assert_eq!(email.part_count(), existing);
        }
    }
}
