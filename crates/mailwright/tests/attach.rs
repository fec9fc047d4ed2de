//! Integration tests for attachments.

#![allow(clippy::unwrap_used)]

mod common;

use common::{addressed, fixture};
use mailwright::{Attachment, DataSource, Disposition, Error, MessageKind, Resource};

#[test]
fn test_attach_file_with_name_and_description() {
    let mut email = addressed(MessageKind::Multipart);
    let attachment = Attachment::new(Resource::path(fixture("testfile.txt")))
        .with_name("Test Attachment")
        .with_description("Test Attachment Desc");
    email.attach(&attachment).unwrap();

    let part = email.part_at(0).unwrap();
    assert_eq!(part.disposition, Some(Disposition::Attachment));
    assert_eq!(part.file_name.as_deref(), Some("Test Attachment"));
    assert_eq!(part.description.as_deref(), Some("Test Attachment Desc"));
    assert_eq!(part.content_type.essence(), "text/plain");
    assert!(part.content_bytes().unwrap().starts_with(b"This is a test file"));
}

#[test]
fn test_attach_url_inline() {
    let mut email = addressed(MessageKind::Html);
    email
        .attach_resource(
            Resource::url("http://www.apache.org/images/asf_logo.gif"),
            None,
            None,
            "inline",
        )
        .unwrap();

    let part = email.part_at(0).unwrap();
    assert_eq!(part.disposition, Some(Disposition::Inline));
    assert_eq!(part.file_name.as_deref(), Some("asf_logo.gif"));
    assert!(part.content_id.is_none());
}

#[test]
fn test_attach_disposition_is_case_insensitive() {
    let mut email = addressed(MessageKind::Multipart);
    let source = Resource::source(DataSource::from_bytes("a.bin", vec![0, 1, 2]));
    email
        .attach_resource(source, Some("a.bin"), None, "ATTACHMENT")
        .unwrap();
    assert_eq!(email.part_at(0).unwrap().disposition, Some(Disposition::Attachment));
}

#[test]
fn test_attach_rejects_unknown_disposition() {
    let mut email = addressed(MessageKind::Multipart);
    let attachment =
        Attachment::new(Resource::path(fixture("testfile.txt"))).with_disposition("middle");
    let result = email.attach(&attachment);
    assert!(matches!(result, Err(Error::InvalidDisposition(_))));
    assert_eq!(email.part_count(), 0);
}

#[test]
fn test_attach_missing_file() {
    let mut email = addressed(MessageKind::Multipart);
    let result = email.attach(&Attachment::new(Resource::path(fixture("nope.txt"))));
    assert!(matches!(result, Err(Error::MissingFile(_))));
    assert_eq!(email.part_count(), 0);
}

#[test]
fn test_attach_directory() {
    let mut email = addressed(MessageKind::Multipart);
    let result = email.attach(&Attachment::new(Resource::path(fixture("nested"))));
    assert!(matches!(result, Err(Error::NotAFile(_))));
}

#[test]
fn test_attach_unreachable_url() {
    let mut email = addressed(MessageKind::Multipart);
    let result = email.attach(&Attachment::new(Resource::url("http://localhost/missing.pdf")));
    assert!(matches!(result, Err(Error::UnreachableResource { .. })));
    assert_eq!(email.part_count(), 0);
}

#[test]
fn test_attach_failing_source() {
    let mut email = addressed(MessageKind::Multipart);
    let source = DataSource::new("broken.bin", || Err(std::io::Error::other("disk gone")));
    let result = email.attach(&Attachment::new(Resource::source(source)));
    assert!(matches!(result, Err(Error::UnreadableSource { .. })));
}

#[test]
fn test_attachment_rendered_as_base64() {
    let mut email = addressed(MessageKind::Multipart);
    email.set_text("see attached").unwrap();
    email
        .attach(&Attachment::new(Resource::source(DataSource::from_bytes(
            "hello.bin",
            b"Hello, World!".to_vec(),
        ))))
        .unwrap();

    let rendered = email.build().unwrap().to_string();
    assert!(rendered.contains("Content-Disposition: attachment; filename=\"hello.bin\"\r\n"));
    assert!(rendered.contains("Content-Transfer-Encoding: base64\r\n"));
    assert!(rendered.contains("SGVsbG8sIFdvcmxkIQ==\r\n"));
    assert!(rendered.contains("see attached\r\n"));
}
