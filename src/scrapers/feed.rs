//! RSS 2.0 / Atom item parsing.
//!
//! Only the direct children of each `<item>` (or Atom `<entry>`) are read.
//! Each output field takes the first non-empty tag from its priority list, so
//! `pubDate` beats `dc:date`, `description` beats `content:encoded`, and so on.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const TITLE_TAGS: &[&str] = &["title"];
const LINK_TAGS: &[&str] = &["link", "guid"];
const DATE_TAGS: &[&str] = &["pubDate", "dc:date", "date", "published", "updated"];
const CATEGORY_TAGS: &[&str] = &["category", "dc:subject"];
const DESCRIPTION_TAGS: &[&str] = &["description", "content:encoded", "content", "summary"];

/// One feed item with its raw (uncleaned) field text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub publish_date: String,
    pub category: String,
    /// Raw description markup; cleaned later by the normalizer.
    pub description: String,
}

impl FeedItem {
    fn from_fields(fields: &[(String, String)]) -> Self {
        let pick = |tags: &[&str]| {
            tags.iter()
                .find_map(|tag| {
                    fields
                        .iter()
                        .filter(|(name, _)| name == tag)
                        .map(|(_, value)| value.trim())
                        .find(|value| !value.is_empty())
                })
                .unwrap_or_default()
                .to_string()
        };
        FeedItem {
            title: pick(TITLE_TAGS),
            link: pick(LINK_TAGS),
            publish_date: pick(DATE_TAGS),
            category: pick(CATEGORY_TAGS),
            description: pick(DESCRIPTION_TAGS),
        }
    }
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn get_attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| String::from_utf8_lossy(a.value.as_ref()).to_string())
}

/// Attribute-carried values of Atom children (`<link href>`, `<category term>`).
fn attribute_field(e: &BytesStart<'_>) -> Option<(String, String)> {
    let name = qualified_name(e);
    let value = match name.as_str() {
        "link" => get_attr_value(e, b"href")?,
        "category" => get_attr_value(e, b"term")?,
        _ => return None,
    };
    Some((name, value))
}

/// Resolve a predefined XML entity or a numeric character reference.
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Parse every item of a feed document, in document order.
///
/// RSS `<item>` and Atom `<entry>` elements are both read. Each field takes the
/// first non-empty tag from its priority list; CDATA content is kept raw for
/// the normalizer.
///
/// # Arguments
///
/// * `xml` - The decoded feed document
///
/// # Returns
///
/// One [`FeedItem`] per item or entry. A well-formed document without items
/// yields an empty vector.
///
/// # Errors
///
/// The underlying `quick_xml::Error` when the document is not well-formed.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut item_depth: Option<usize> = None;
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut child: Option<String> = None;
    let mut cur_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                let name = qualified_name(&e);
                match item_depth {
                    None if name == "item" || name == "entry" => {
                        item_depth = Some(depth);
                        fields.clear();
                    }
                    Some(d) if depth == d + 1 => {
                        if let Some(field) = attribute_field(&e) {
                            fields.push(field);
                        }
                        child = Some(name);
                        cur_text.clear();
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                match item_depth {
                    Some(d) if depth == d + 1 => {
                        if let Some(tag) = child.take() {
                            fields.push((tag, std::mem::take(&mut cur_text)));
                        }
                    }
                    Some(d) if depth == d => {
                        items.push(FeedItem::from_fields(&fields));
                        item_depth = None;
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(e) => {
                if item_depth == Some(depth) {
                    if let Some(field) = attribute_field(&e) {
                        fields.push(field);
                    }
                }
            }
            Event::Text(t) if child.is_some() => {
                cur_text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Event::CData(t) if child.is_some() => {
                cur_text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Event::GeneralRef(r) if child.is_some() => {
                let name = String::from_utf8_lossy(&r);
                match resolve_reference(&name) {
                    Some(c) => cur_text.push(c),
                    // Unknown entities are kept verbatim.
                    None => {
                        cur_text.push('&');
                        cur_text.push_str(&name);
                        cur_text.push(';');
                    }
                }
            }
            _ => {}
        }
    }
    Ok(items)
}
