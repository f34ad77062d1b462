//! Field extraction from article pages.
//!
//! Each field has an ordered rule list; the first rule whose match yields a
//! non-empty trimmed string wins. Missing fields come back as empty strings,
//! never as errors. The body is located by two strategies tried in order: the
//! structured content container, then the generic content-class fallbacks.

use crate::config::{ExtractionRule, IdSource, parse_selector};
use crate::error::HarvestError;
use scraper::{ElementRef, Html, Selector};

/// Fields pulled from one page. Absent fields are empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    pub title: String,
    pub publish_date: String,
    pub category: String,
    pub body: String,
}

struct CompiledRule {
    selector: Selector,
    attribute: Option<String>,
    cut_at: Option<String>,
}

impl CompiledRule {
    fn compile(rule: &ExtractionRule) -> Result<Self, HarvestError> {
        Ok(Self {
            selector: parse_selector(&rule.selector)?,
            attribute: rule.attribute.clone(),
            cut_at: rule.cut_at.clone(),
        })
    }

    /// Value of the first element this rule selects, trimmed.
    fn apply(&self, document: &Html) -> Option<String> {
        let element = document.select(&self.selector).next()?;
        let raw = match &self.attribute {
            Some(attr) => element.value().attr(attr)?.to_string(),
            None => element_text(element),
        };
        let value = match &self.cut_at {
            Some(delim) => raw.split(delim.as_str()).next().unwrap_or_default(),
            None => raw.as_str(),
        };
        Some(value.trim().to_string())
    }
}

fn compile_rules(rules: &[ExtractionRule]) -> Result<Vec<CompiledRule>, HarvestError> {
    rules.iter().map(CompiledRule::compile).collect()
}

/// Selector chains for one site, compiled once per run.
pub struct FieldExtractor {
    source_name: String,
    title_rules: Vec<CompiledRule>,
    date_rules: Vec<CompiledRule>,
    category_rules: Vec<CompiledRule>,
    content_locator: Option<Selector>,
    fallback_content: Vec<Selector>,
    paragraph: Selector,
}

impl FieldExtractor {
    pub fn new(source: &IdSource) -> Result<Self, HarvestError> {
        Ok(Self {
            source_name: source.name.clone(),
            title_rules: compile_rules(&source.title_rules)?,
            date_rules: compile_rules(&source.date_rules)?,
            category_rules: compile_rules(&source.category_rules)?,
            content_locator: source
                .content_locator
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            fallback_content: source
                .fallback_content_selectors
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            paragraph: parse_selector("p")?,
        })
    }

    pub fn extract(&self, html: &str) -> ExtractedFields {
        let document = Html::parse_document(html);
        ExtractedFields {
            title: first_match(&document, &self.title_rules, Some(self.source_name.as_str())),
            publish_date: first_match(&document, &self.date_rules, None),
            category: first_match(&document, &self.category_rules, None),
            body: self.body(&document),
        }
    }

    fn body(&self, document: &Html) -> String {
        if let Some(locator) = &self.content_locator {
            if let Some(container) = document.select(locator).next() {
                let text = self.paragraphs(container);
                if !text.is_empty() {
                    return text;
                }
            }
        }
        self.fallback_content
            .iter()
            .filter_map(|selector| document.select(selector).next())
            .map(|container| self.paragraphs(container))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    /// Text of every `<p>` under `container`, one paragraph per block.
    fn paragraphs(&self, container: ElementRef<'_>) -> String {
        container
            .select(&self.paragraph)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// First non-empty value in rule order. `reject` drops a value equal to it
/// (a placeholder page titled with the bare site name) and moves on.
fn first_match(document: &Html, rules: &[CompiledRule], reject: Option<&str>) -> String {
    rules
        .iter()
        .filter_map(|rule| rule.apply(document))
        .find(|value| !value.is_empty() && reject.is_none_or(|r| value != r))
        .unwrap_or_default()
}

/// Text nodes of `element`, each trimmed, joined with single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;

    fn utusan() -> FieldExtractor {
        FieldExtractor::new(&HarvestConfig::default().id_sources[0]).unwrap()
    }

    const ARTICLE: &str = r#"
<html>
<head>
  <title>Utusan Malaysia</title>
  <meta property="article:published_time" content="2025-03-14T08:30:00+08:00">
  <meta property="article:section" content="Nasional">
</head>
<body>
  <h1 class="jeg_post_title">  Harga minyak
     turun minggu depan </h1>
  <div id="content"><div><div>
    <section></section><section></section>
    <section><div><div>
      <div><div><div>
        <div></div><div></div><div></div><div></div>
        <div><div>
          <p>Harga <b>petrol</b> RON95 dijangka turun.</p>
          <p>   </p>
          <p>Kenyataan itu dibuat semalam.</p>
        </div></div>
      </div></div></div>
    </div></div></section>
  </div></div></div>
  <div class="entry-content"><p>Fallback text.</p></div>
</body>
</html>"#;

    #[test]
    fn test_extracts_all_fields_from_structured_container() {
        let fields = utusan().extract(ARTICLE);
        assert_eq!(fields.title, "Harga minyak turun minggu depan");
        assert_eq!(fields.publish_date, "2025-03-14");
        assert_eq!(fields.category, "Nasional");
        assert_eq!(
            fields.body,
            "Harga petrol RON95 dijangka turun.\n\nKenyataan itu dibuat semalam."
        );
    }

    #[test]
    fn test_body_falls_back_to_content_classes_in_order() {
        let html = r#"<html><body>
            <h1 class="entry-title">Tajuk</h1>
            <div class="post-content"><p>Kedua.</p></div>
            <div class="entry-content"><p>Pertama.</p></div>
        </body></html>"#;
        let fields = utusan().extract(html);
        assert_eq!(fields.title, "Tajuk");
        assert_eq!(fields.body, "Pertama.");
    }

    #[test]
    fn test_empty_fallback_container_is_skipped() {
        let html = r#"<html><body>
            <div class="jeg_post_content"><p> </p></div>
            <div class="content"><p>Isi sebenar.</p></div>
        </body></html>"#;
        assert_eq!(utusan().extract(html).body, "Isi sebenar.");
    }

    #[test]
    fn test_site_name_title_is_rejected() {
        let html = "<html><head><title>Utusan Malaysia</title></head><body></body></html>";
        let fields = utusan().extract(html);
        assert_eq!(fields.title, "");
        assert_eq!(fields.body, "");
    }

    #[test]
    fn test_site_name_title_falls_through_to_next_rule() {
        let html = r#"<html><head><title>Berita sebenar</title></head>
            <body><h1 class="jeg_post_title">Utusan Malaysia</h1></body></html>"#;
        assert_eq!(utusan().extract(html).title, "Berita sebenar");
    }

    #[test]
    fn test_first_non_empty_rule_wins_not_longest() {
        let html = r#"<html><body>
            <div class="jeg_meta_date"><a> </a></div>
            <time class="jeg_date">14 Mac 2025</time>
            <span class="posted-on">Jumaat, 14 Mac 2025, 8:30 pagi</span>
        </body></html>"#;
        assert_eq!(utusan().extract(html).publish_date, "14 Mac 2025");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let fields = utusan().extract("<html><body><p>tiada</p></body></html>");
        assert_eq!(fields, ExtractedFields::default());
    }
}
