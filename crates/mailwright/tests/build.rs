//! Integration tests for envelope validation and message building.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::{TimeZone, Utc};
use common::addressed;
use mailwright::{Email, Error, MessageKind};

#[test]
fn test_build_without_sender() {
    let mut email = Email::plain();
    email.add_to("you@apache.org").unwrap();
    assert!(matches!(email.build(), Err(Error::InvalidSender(_))));
}

#[test]
fn test_build_with_bad_senders() {
    for sender in ["", "   ", "abcdef", "me@", "<me@apache.org"] {
        let mut email = Email::plain();
        email.set_from(sender).unwrap().add_to("you@apache.org").unwrap();
        assert!(
            matches!(email.build(), Err(Error::InvalidSender(_))),
            "{sender:?} should be rejected"
        );
    }
}

#[test]
fn test_sender_checked_before_recipients() {
    let mut email = Email::plain();
    assert!(matches!(email.build(), Err(Error::InvalidSender(_))));
}

#[test]
fn test_build_without_recipients() {
    let mut email = Email::plain();
    email.set_from("me@apache.org").unwrap();
    assert!(matches!(email.build(), Err(Error::NoRecipients)));
}

#[test]
fn test_any_recipient_list_is_enough() {
    let mut cc_only = Email::plain();
    cc_only.set_from("me@apache.org").unwrap().add_cc("cc@apache.org").unwrap();
    assert!(cc_only.build().is_ok());

    let mut bcc_only = Email::plain();
    bcc_only.set_from("me@apache.org").unwrap().add_bcc("bcc@apache.org").unwrap();
    let message = bcc_only.build().unwrap();
    assert_eq!(message.bcc().len(), 1);
    assert!(!message.to_string().contains("bcc@apache.org"));
}

#[test]
fn test_subject_round_trip() {
    for subject in [None, Some(""), Some("Test Msg Subject"), Some("Grüße aus Köln")] {
        let mut email = addressed(MessageKind::Plain);
        email.set_subject(subject).unwrap();
        let message = email.build().unwrap();
        assert_eq!(message.subject(), subject);
    }
}

#[test]
fn test_sent_date_truncated_to_seconds() {
    let mut email = addressed(MessageKind::Plain);
    let date = Utc.timestamp_millis_opt(1_234_567_890_987).unwrap();
    email.set_sent_date(date).unwrap();
    let message = email.build().unwrap();
    assert_eq!(message.sent_date(), Utc.timestamp_opt(1_234_567_890, 0).unwrap());
}

#[test]
fn test_sent_date_defaults_to_now() {
    let before = Utc::now().timestamp();
    let message = addressed(MessageKind::Plain).build().unwrap();
    let after = Utc::now().timestamp();
    let sent = message.sent_date().timestamp();
    assert!(before <= sent && sent <= after);
}

#[test]
fn test_display_names_and_reply_to() {
    let mut email = Email::plain();
    email
        .set_from("Apache Mail <me@apache.org>")
        .unwrap()
        .add_to("\"Doe, John\" <jdoe@apache.org>")
        .unwrap()
        .add_reply_to("replies@apache.org")
        .unwrap();
    email.set_text("body").unwrap();

    let message = email.build().unwrap();
    assert_eq!(message.from().name.as_deref(), Some("Apache Mail"));
    assert_eq!(message.to()[0].address.as_str(), "jdoe@apache.org");

    let rendered = message.to_string();
    assert!(rendered.contains("From: Apache Mail <me@apache.org>\r\n"));
    assert!(rendered.contains("To: \"Doe, John\" <jdoe@apache.org>\r\n"));
    assert!(rendered.contains("Reply-To: replies@apache.org\r\n"));
    assert!(rendered.contains("MIME-Version: 1.0\r\n"));
}

#[test]
fn test_plain_text_message_is_single_part() {
    let mut email = addressed(MessageKind::Plain);
    email.set_text("Hello").unwrap();
    let message = email.build().unwrap();

    assert_eq!(message.part_count(), 0);
    assert_eq!(message.content_type().essence(), "text/plain");
    assert_eq!(message.body().unwrap().text_content(), Some("Hello"));
}

#[test]
fn test_to_bytes_matches_display() {
    let mut email = addressed(MessageKind::Plain);
    email.set_subject(Some("bytes")).unwrap();
    let message = email.build().unwrap();
    assert_eq!(message.to_bytes(), message.to_string().into_bytes());
}
