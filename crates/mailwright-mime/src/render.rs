//! RFC 5322 / MIME serialization.

use crate::address::Mailbox;
use crate::content_type::ContentType;
use crate::encoding::{encode_base64_lines, encode_quoted_printable, encode_rfc2047};
use crate::header::Headers;
use crate::message::{Body, Message, Part, TransferEncoding};

/// Preamble written ahead of the first boundary of the top-level multipart.
const PREAMBLE: &str = "This is a multi-part message in MIME format.\r\n";

/// Serializes a whole message.
pub fn render_message(message: &Message) -> String {
    let mut out = String::new();

    write_header(&mut out, "Date", &message.date.to_rfc2822());
    write_header(&mut out, "From", &message.from.to_string());
    write_mailbox_list(&mut out, "Reply-To", &message.reply_to);
    write_mailbox_list(&mut out, "To", &message.to);
    write_mailbox_list(&mut out, "Cc", &message.cc);
    write_header(&mut out, "Message-ID", &format!("<{}>", message.message_id));
    if let Some(subject) = &message.subject {
        write_header(&mut out, "Subject", &Headers::encode_value(subject));
    }
    for (name, value) in message.headers.iter() {
        write_header(&mut out, name, &Headers::encode_value(value));
    }
    write_header(&mut out, "MIME-Version", "1.0");

    let mut renderer = Renderer::new(boundary_seed(&message.message_id));

    if message.parts.is_empty() {
        match &message.body {
            Some(body) => renderer.write_entity(&mut out, body),
            None => {
                let empty = Part::text("", ContentType::text_plain());
                renderer.write_entity(&mut out, &empty);
            }
        }
    } else {
        let children: Vec<&Part> = message.body.iter().chain(&message.parts).collect();
        renderer.write_multipart(&mut out, &message.multipart_subtype, &children, true);
    }

    out
}

/// Builds a boundary seed from the Message-ID local part, keeping only
/// characters that are safe inside a boundary.
fn boundary_seed(message_id: &str) -> String {
    let local = message_id.split('@').next().unwrap_or_default();
    local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}

struct Renderer {
    seed: String,
    next_boundary: usize,
}

impl Renderer {
    const fn new(seed: String) -> Self {
        Self {
            seed,
            next_boundary: 0,
        }
    }

    fn boundary(&mut self) -> String {
        let boundary = format!("----=_Part_{}_{}", self.next_boundary, self.seed);
        self.next_boundary += 1;
        boundary
    }

    fn write_entity(&mut self, out: &mut String, part: &Part) {
        if let Body::Multipart(children) = &part.body {
            let children: Vec<&Part> = children.iter().collect();
            write_part_headers(out, part, None);
            self.write_multipart_body(out, part, &children, false);
            return;
        }

        let encoding = TransferEncoding::for_body(&part.body);
        write_part_headers(out, part, Some(encoding));
        out.push_str("\r\n");

        match (&part.body, encoding) {
            (Body::Text(text), TransferEncoding::SevenBit) => {
                out.push_str(&normalize_line_endings(text));
                out.push_str("\r\n");
            }
            (Body::Text(text), _) => {
                out.push_str(&encode_quoted_printable(text));
                out.push_str("\r\n");
            }
            (Body::Binary(bytes), _) => out.push_str(&encode_base64_lines(bytes)),
            (Body::Multipart(_), _) => {}
        }
    }

    fn write_multipart(
        &mut self,
        out: &mut String,
        sub_type: &str,
        children: &[&Part],
        top: bool,
    ) {
        let container = Part::multipart(sub_type, Vec::new());
        write_part_headers(out, &container, None);
        self.write_multipart_body(out, &container, children, top);
    }

    /// Writes the boundary-delimited children. The Content-Type line of the
    /// container has already been written without its boundary parameter,
    /// so it is emitted here once the boundary is known.
    fn write_multipart_body(
        &mut self,
        out: &mut String,
        container: &Part,
        children: &[&Part],
        top: bool,
    ) {
        let boundary = self.boundary();
        let content_type = container
            .content_type
            .clone()
            .with_parameter("boundary", boundary.clone());
        write_header(out, "Content-Type", &content_type.to_string());
        out.push_str("\r\n");
        if top {
            out.push_str(PREAMBLE);
        }

        for child in children {
            out.push_str(&format!("\r\n--{boundary}\r\n"));
            self.write_entity(out, child);
        }
        out.push_str(&format!("\r\n--{boundary}--\r\n"));
    }
}

/// Writes the per-part headers. For leaf parts the Content-Type goes first;
/// multipart containers get theirs from `write_multipart_body`.
fn write_part_headers(out: &mut String, part: &Part, encoding: Option<TransferEncoding>) {
    if let Some(encoding) = encoding {
        let mut content_type = part.content_type.clone();
        if let Some(name) = &part.file_name {
            content_type = content_type.with_parameter("name", encode_rfc2047(name, "utf-8"));
        }
        write_header(out, "Content-Type", &content_type.to_string());
        write_header(out, "Content-Transfer-Encoding", &encoding.to_string());
    }

    if let Some(content_id) = &part.content_id {
        write_header(out, "Content-ID", &format!("<{content_id}>"));
    }

    if let Some(disposition) = part.disposition {
        let value = match &part.file_name {
            Some(name) if !name.is_empty() => {
                let escaped = encode_rfc2047(name, "utf-8").replace('"', "\\\"");
                format!("{disposition}; filename=\"{escaped}\"")
            }
            _ => disposition.to_string(),
        };
        write_header(out, "Content-Disposition", &value);
    }

    if let Some(description) = &part.description {
        write_header(out, "Content-Description", &encode_rfc2047(description, "utf-8"));
    }

    for (name, value) in part.headers.iter() {
        write_header(out, name, &encode_rfc2047(value, "utf-8"));
    }
}

fn write_mailbox_list(out: &mut String, name: &str, mailboxes: &[Mailbox]) {
    if mailboxes.is_empty() {
        return;
    }
    let value = mailboxes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    write_header(out, name, &value);
}

fn write_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

fn normalize_line_endings(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\r\n")
}
