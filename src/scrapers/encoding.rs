//! Body decoding.
//!
//! Order of attempts:
//! 1. the charset declared by the server,
//! 2. strict UTF-8,
//! 3. a sniffed guess (BOM, `<meta charset>`, `http-equiv` content type, XML
//!    declaration), accepted only if it decodes without malformed sequences,
//! 4. a guess from the byte content itself, via `chardetng`,
//! 5. windows-1252, which maps every byte.
//!
//! A byte-order mark overrides every label, so a body whose BOM promises an
//! encoding it then breaks is excluded with [`HarvestError::Decode`].

use crate::error::HarvestError;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;

/// Only the head of the document is scanned for declarations.
const SNIFF_LIMIT: usize = 4096;

/// Decode `body`, returning the text and the name of the encoding used.
///
/// # Arguments
///
/// * `body` - Raw response bytes
/// * `declared` - Charset label from the `Content-Type` header, if any
/// * `url` - Final URL of the response, used for logging and errors
///
/// # Returns
///
/// The decoded text and the canonical name of the encoding that produced it.
///
/// # Errors
///
/// [`HarvestError::Decode`] when even the last-resort encodings cannot decode
/// the body without malformed sequences.
///
/// # Examples
///
/// ```ignore
/// let (text, encoding) = decode_body(b"<h1>Kaf\xE9</h1>", Some("iso-8859-1"), url)?;
/// assert_eq!(text, "<h1>Kafé</h1>");
/// assert_eq!(encoding, "windows-1252");
/// ```
pub fn decode_body(
    body: &[u8],
    declared: Option<&str>,
    url: &str,
) -> Result<(String, &'static str), HarvestError> {
    if let Some(encoding) = declared.and_then(|label| Encoding::for_label(label.trim().as_bytes())) {
        if let Some(text) = decode_strict(encoding, body) {
            return Ok((text, encoding.name()));
        }
        debug!(%url, encoding = encoding.name(), "Declared charset failed to decode");
    }

    if let Some(text) = decode_strict(UTF_8, body) {
        return Ok((text, UTF_8.name()));
    }

    if let Some(encoding) = sniff_encoding(body) {
        if let Some(text) = decode_strict(encoding, body) {
            debug!(%url, encoding = encoding.name(), "Decoded with sniffed charset");
            return Ok((text, encoding.name()));
        }
    }

    for encoding in [detect_encoding(body), WINDOWS_1252] {
        if let Some(text) = decode_strict(encoding, body) {
            debug!(%url, encoding = encoding.name(), "Decoded with guessed charset");
            return Ok((text, encoding.name()));
        }
    }

    Err(HarvestError::Decode {
        url: url.to_string(),
        reason: format!(
            "no clean decoding (declared: {})",
            declared.unwrap_or("none")
        ),
    })
}

/// Statistical guess from the bytes alone. UTF-8 is excluded because the
/// strict UTF-8 attempt has already failed.
fn detect_encoding(body: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    detector.guess(None, false)
}

/// Decode without replacement characters; `None` on malformed input.
fn decode_strict(encoding: &'static Encoding, body: &[u8]) -> Option<String> {
    // A BOM overrides whatever label we were given.
    let (encoding, body) = match Encoding::for_bom(body) {
        Some((bom_encoding, bom_len)) => (bom_encoding, &body[bom_len..]),
        None => (encoding, body),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

static META_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_\-:.]+)"#).unwrap());
static XML_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i-u)<\?xml[^>]+encoding\s*=\s*["']([A-Za-z0-9_\-:.]+)["']"#).unwrap());

/// Best-effort guess at the document's encoding from its own bytes.
pub fn sniff_encoding(body: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return Some(encoding);
    }
    let head = &body[..body.len().min(SNIFF_LIMIT)];
    [&*XML_DECL, &*META_CHARSET]
        .into_iter()
        .filter_map(|re| re.captures(head))
        .filter_map(|caps| caps.get(1))
        .find_map(|label| Encoding::for_label(label.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_charset_wins() {
        // "Café" in ISO-8859-1
        let body = b"<p>Caf\xE9</p>";
        let (text, encoding) = decode_body(body, Some("iso-8859-1"), "u").unwrap();
        assert_eq!(text, "<p>Café</p>");
        assert_eq!(encoding, "windows-1252");
    }

    #[test]
    fn test_utf8_fallback_when_declared_is_unknown() {
        let body = "<p>Berita terkini</p>".as_bytes();
        let (text, encoding) = decode_body(body, Some("x-made-up"), "u").unwrap();
        assert_eq!(text, "<p>Berita terkini</p>");
        assert_eq!(encoding, "UTF-8");
    }

    #[test]
    fn test_sniffed_meta_charset() {
        let body = b"<html><head><meta charset=\"windows-1252\"></head><body>Caf\xE9</body></html>";
        let (text, encoding) = decode_body(body, None, "u").unwrap();
        assert!(text.contains("Café"));
        assert_eq!(encoding, "windows-1252");
    }

    #[test]
    fn test_sniffed_xml_declaration() {
        let body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><rss><title>Caf\xE9</title></rss>";
        let (text, _) = decode_body(body, None, "u").unwrap();
        assert!(text.contains("Café"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let body = b"\xEF\xBB\xBFhello";
        let (text, _) = decode_body(body, None, "u").unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_undeclared_legacy_page_is_guessed() {
        let body = b"<html><head><title>Berita</title></head><body>\
            <h1>Kaf\xE9 baharu dibuka di Kuala Lumpur</h1>\
            <p>Pengunjung memenuhi kaf\xE9 itu sejak pagi tadi.</p></body></html>";
        let (text, encoding) = decode_body(body, None, "https://www.utusan.com.my/?p=1").unwrap();
        assert!(text.contains("Kafé baharu"), "{text}");
        assert!(text.contains("kafé itu"));
        assert_ne!(encoding, "UTF-8");
    }

    #[test]
    fn test_stray_bytes_fall_back_to_windows_1252() {
        let body = b"\xFD not text \xC3";
        assert!(decode_body(body, None, "u").is_ok());
    }

    #[test]
    fn test_broken_bom_body_is_decode_failure() {
        // UTF-16LE BOM followed by an odd number of bytes.
        let body = b"\xFF\xFEa\x00b";
        let err = decode_body(body, None, "https://contoh.my/?p=1").unwrap_err();
        assert!(matches!(err, HarvestError::Decode { .. }));
    }
}
