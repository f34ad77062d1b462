//! Text cleaning and sentence-boundary truncation.
//!
//! Raw body or feed-description text goes through, in order:
//! entity resolution, markup stripping, CDATA marker removal, boilerplate
//! removal, whitespace normalization, trimming, and finally truncation at the
//! last sentence
//! terminal (`.`, `!`, `?`). Text with no terminal is kept whole; punctuation
//! is never added.

use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use regex::{Captures, Regex};

/// How whitespace is normalized before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whitespace {
    /// Collapse every whitespace run to one space (article bodies).
    Collapse,
    /// Keep paragraph breaks as `\n\n`, collapse everything else (feeds).
    Paragraphs,
}

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static BLOCK_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(p|div|h[1-6]|li|blockquote)\s*>|<br\s*/?>").unwrap());
static CDATA: Lazy<Regex> = Lazy::new(|| Regex::new(r"<!\[CDATA\[|\]\]>").unwrap());
static IMG_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\b(img|width|height)="\d+""#).unwrap());
static POST_ATTRIBUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"The post .* appeared first on .*\.").unwrap());
static READ_MORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.\.\.\s*read more.*").unwrap());
static HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static PARA_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static ANY_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#?[0-9A-Za-z]+;").unwrap());

/// Remove every `<...>` span, repeating until nothing tag-like is left so the
/// result is a fixed point.
pub fn strip_markup(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = TAG.replace_all(&current, "");
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

pub fn strip_cdata(text: &str) -> String {
    CDATA.replace_all(text, "").into_owned()
}

/// Remove image attribute residue, "The post ... appeared first on ..."
/// attribution lines and "... Read More" continuations.
pub fn strip_boilerplate(text: &str) -> String {
    let text = IMG_ATTR.replace_all(text, "");
    let text = POST_ATTRIBUTION.replace_all(&text, "");
    READ_MORE.replace_all(&text, "").into_owned()
}

/// Resolve numeric character references, the XML entities and `&nbsp;`,
/// one reference at a time. Anything unrecognized is kept verbatim.
fn unescape_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let reference = &caps[0];
            let resolved = unescape_with(reference, |name| match name {
                "nbsp" => Some(" "),
                other => resolve_predefined_entity(other),
            });
            match resolved {
                Ok(resolved) => resolved.into_owned(),
                Err(_) => reference.to_string(),
            }
        })
        .into_owned()
}

fn normalize_whitespace(text: &str, mode: Whitespace) -> String {
    match mode {
        Whitespace::Collapse => ANY_SPACE.replace_all(text, " ").into_owned(),
        Whitespace::Paragraphs => PARA_BREAK
            .split(text)
            .map(|para| {
                let para = para.replace('\n', " ");
                HSPACE.replace_all(&para, " ").trim().to_string()
            })
            .filter(|para| !para.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

/// Resolve entities, strip markup, CDATA markers and boilerplate, normalize
/// whitespace, trim.
///
/// Entities are resolved first so that escaped tags such as `&lt;b&gt;` are
/// stripped like real ones; the result never contains a `<...>` span.
///
/// # Arguments
///
/// * `raw` - Body text or feed description, possibly with markup
/// * `mode` - Whether paragraph breaks survive
///
/// # Returns
///
/// The cleaned text, possibly empty.
pub fn clean_text(raw: &str, mode: Whitespace) -> String {
    let text = unescape_entities(raw);
    let text = match mode {
        Whitespace::Paragraphs => BLOCK_END.replace_all(&text, "\n\n").into_owned(),
        Whitespace::Collapse => text,
    };
    let text = strip_markup(&text);
    let text = strip_cdata(&text);
    let text = strip_boilerplate(&text);
    normalize_whitespace(&text, mode).trim().to_string()
}

/// Cut `text` right after its last sentence terminal.
///
/// A `.` that belongs to a run of dots (an ellipsis) is not a terminal.
/// Without any terminal the text is returned unchanged.
pub fn truncate_to_sentence(text: &str) -> &str {
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate().rev() {
        match b {
            b'!' | b'?' => return &text[..=i],
            b'.' => {
                let dot_before = i > 0 && bytes[i - 1] == b'.';
                let dot_after = bytes.get(i + 1) == Some(&b'.');
                if !dot_before && !dot_after {
                    return &text[..=i];
                }
            }
            _ => {}
        }
    }
    text
}

/// Clean and truncate. `None` when nothing is left after cleaning; the caller
/// applies its empty-body policy.
pub fn summarize(raw: &str, mode: Whitespace) -> Option<String> {
    let cleaned = clean_text(raw, mode);
    if cleaned.is_empty() {
        return None;
    }
    Some(truncate_to_sentence(&cleaned).to_string())
}
