//! Transfer and header encodings: Base64, Quoted-Printable and RFC 2047.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum line length for encoded bodies (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Largest UTF-8 chunk that still fits one encoded word under 75 columns.
const MAX_ENCODED_WORD_BYTES: usize = 45;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-terminated lines of 76 columns.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        // Base64 output is pure ASCII
        result.push_str(&String::from_utf8_lossy(chunk));
        result.push_str("\r\n");
    }
    result
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks in the input are kept as hard CRLF breaks; longer lines get
/// soft breaks so no output line exceeds 76 columns.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        encode_qp_line(line.as_bytes(), &mut result);
    }

    result
}

fn encode_qp_line(bytes: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let is_last = i + 1 == bytes.len();
        // Trailing whitespace must be encoded or transports may strip it
        let literal = matches!(byte, b'!'..=b'<' | b'>'..=b'~')
            || (matches!(byte, b' ' | b'\t') && !is_last);
        let width = if literal { 1 } else { 3 };

        // Leave one column for the soft break marker
        if line_length + width > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        line_length += width;
    }
}

/// Returns true if a header value must be RFC 2047 encoded.
#[must_use]
pub fn needs_rfc2047(text: &str) -> bool {
    text.contains("=?") || text.chars().any(|c| !c.is_ascii() || c.is_ascii_control())
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Values that are plain printable ASCII are returned unchanged. Others are
/// split into Base64 encoded words of at most 75 columns, never cutting a
/// UTF-8 sequence.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_rfc2047(text) {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk_start = 0;
    for (idx, ch) in text.char_indices() {
        if idx + ch.len_utf8() - chunk_start > MAX_ENCODED_WORD_BYTES {
            words.push(&text[chunk_start..idx]);
            chunk_start = idx;
        }
    }
    words.push(&text[chunk_start..]);

    words
        .iter()
        .map(|word| format!("=?{charset}?B?{}?=", encode_base64(word.as_bytes())))
        .collect::<Vec<_>>()
        .join("\r\n ")
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
    use proptest::prelude::*;

    fn decode_base64(data: &str) -> Vec<u8> {
        let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD.decode(cleaned).unwrap()
    }

    fn decode_quoted_printable(text: &str) -> String {
        let unfolded = text.replace("=\r\n", "");
        let bytes = unfolded.as_bytes();
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'=' {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(out).unwrap()
    }

    /// Decodes the Base64 encoded words produced by `encode_rfc2047`.
    fn decode_rfc2047(text: &str) -> String {
        text.split("\r\n ")
            .map(|word| {
                let encoded = word
                    .strip_prefix("=?utf-8?B?")
                    .and_then(|w| w.strip_suffix("?="))
                    .unwrap();
                String::from_utf8(decode_base64(encoded)).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_base64_encode() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_base64_lines_wrap_at_76() {
        let data = vec![0xABu8; 200];
        let encoded = encode_base64_lines(&data);
        for line in encoded.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= 76);
        }
        assert!(encoded.ends_with("\r\n"));
        assert_eq!(decode_base64(&encoded), data);
    }

    #[test]
    fn test_quoted_printable_plain_ascii_untouched() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");
    }

    #[test]
    fn test_quoted_printable_encodes_non_ascii() {
        let encoded = encode_quoted_printable("Héllo, Wørld!");
        assert!(encoded.contains("=C3=A9"));
        assert_eq!(decode_quoted_printable(&encoded), "Héllo, Wørld!");
    }

    #[test]
    fn test_quoted_printable_keeps_hard_breaks() {
        let encoded = encode_quoted_printable("line one\nline two");
        assert_eq!(encoded, "line one\r\nline two");
    }

    #[test]
    fn test_quoted_printable_trailing_space_encoded() {
        assert_eq!(encode_quoted_printable("end "), "end=20");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let text = "x".repeat(200);
        let encoded = encode_quoted_printable(&text);
        assert!(encoded.lines().all(|l| l.len() <= 76));
        assert_eq!(decode_quoted_printable(&encoded), text);
    }

    #[test]
    fn test_rfc2047_passthrough() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");
    }

    #[test]
    fn test_rfc2047_encode() {
        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");
        assert_eq!(decode_rfc2047(&encoded), "Héllo");
    }

    #[test]
    fn test_rfc2047_long_value_split_into_words() {
        let text = "To die—to sleep, ".repeat(10);
        let encoded = encode_rfc2047(&text, "utf-8");
        assert!(encoded.contains("\r\n "));
        for word in encoded.split("\r\n ") {
            assert!(word.len() <= 75, "encoded word too long: {word}");
        }
        assert_eq!(decode_rfc2047(&encoded), text);
    }

    proptest! {
        #[test]
        fn prop_quoted_printable_lines_bounded(text in "\\PC{0,300}") {
            let encoded = encode_quoted_printable(&text);
            prop_assert!(encoded.split("\r\n").all(|l| l.len() <= 76));
        }
    }
}
