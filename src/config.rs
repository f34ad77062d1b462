//! Harvest configuration.
//!
//! All per-source behaviour (selector chains, content locator, fallback body
//! policy, ID sampling) is data in a [`HarvestConfig`], loaded from YAML or
//! taken from the built-in defaults that cover the Malay sources we scrape.
//!
//! ```yaml
//! request_timeout_secs: 20
//! id_sources:
//!   - name: Utusan Malaysia
//!     base_url: https://www.utusan.com.my
//!     id_param: p
//!     id_range: [100000, 900000]
//!     sample_size: 100
//!     title_rules: ["h1.jeg_post_title", "h1.entry-title", "title"]
//!     date_rules:
//!       - ".jeg_meta_date a"
//!       - { selector: "meta[property='article:published_time']", attribute: content, cut_at: "T" }
//!     empty_body_policy: exclude
//! ```

use crate::error::HarvestError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Top-level configuration value object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Per-request timeout for ID-mode fetches.
    pub request_timeout_secs: u64,
    /// Per-request timeout for feed fetches.
    pub feed_timeout_secs: u64,
    pub feed_output_dir: PathBuf,
    pub id_output_dir: PathBuf,
    pub log_file: PathBuf,
    pub politeness: Politeness,
    pub feeds: Vec<FeedSource>,
    pub id_sources: Vec<IdSource>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 20,
            feed_timeout_secs: 10,
            feed_output_dir: PathBuf::from("./scraper/news_feed"),
            id_output_dir: PathBuf::from("./scraper/news_id"),
            log_file: PathBuf::from("./scraper/news_scraper.log"),
            politeness: Politeness::default(),
            feeds: default_feeds(),
            id_sources: vec![utusan_id_source()],
        }
    }
}

impl HarvestConfig {
    /// Load a YAML configuration file. Missing keys fall back to defaults.
    ///
    /// Runs before logging is installed, so it reports only through its
    /// return value.
    pub fn load(path: &Path) -> Result<Self, HarvestError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, HarvestError> {
        serde_yaml::from_str(raw).map_err(|e| HarvestError::config(format!("invalid YAML: {e}")))
    }

    /// Validate every source. Runs before any network I/O.
    pub fn validate(&self) -> Result<(), HarvestError> {
        self.politeness.validate()?;
        for feed in &self.feeds {
            feed.validate()?;
        }
        for source in &self.id_sources {
            source.validate()?;
        }
        Ok(())
    }
}

/// Delays inserted between requests to throttle the target servers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Politeness {
    /// Uniform random delay after a successful extraction, `(min, max)`.
    pub success_delay_secs: (f64, f64),
    /// Delay after a network-level failure.
    pub fetch_failure_delay_secs: f64,
    /// Delay after any other per-candidate error.
    pub error_delay_secs: f64,
    /// Delay after each processed feed.
    pub feed_delay_secs: f64,
}

impl Default for Politeness {
    fn default() -> Self {
        Self {
            success_delay_secs: (1.0, 2.5),
            fetch_failure_delay_secs: 3.0,
            error_delay_secs: 1.5,
            feed_delay_secs: 1.0,
        }
    }
}

impl Politeness {
    /// No delays at all.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            success_delay_secs: (0.0, 0.0),
            fetch_failure_delay_secs: 0.0,
            error_delay_secs: 0.0,
            feed_delay_secs: 0.0,
        }
    }

    fn validate(&self) -> Result<(), HarvestError> {
        let (lo, hi) = self.success_delay_secs;
        let all = [
            lo,
            hi,
            self.fetch_failure_delay_secs,
            self.error_delay_secs,
            self.feed_delay_secs,
        ];
        if all.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(HarvestError::config("delays must be finite and non-negative"));
        }
        if lo > hi {
            return Err(HarvestError::config(format!(
                "success_delay_secs range is inverted: ({lo}, {hi})"
            )));
        }
        Ok(())
    }
}

/// What to put in `summary` when no body text could be extracted.
///
/// In YAML this is a bare `exclude` or `use_title`, or a map
/// `sentinel: { text: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "PolicyRepr", into = "PolicyRepr")]
pub enum EmptyBodyPolicy {
    /// Drop the candidate and count it as excluded.
    Exclude,
    /// Use the article title as the summary.
    UseTitle,
    /// Use a fixed sentinel text.
    Sentinel { text: String },
}

impl EmptyBodyPolicy {
    pub fn no_summary() -> Self {
        EmptyBodyPolicy::Sentinel {
            text: "No summary available".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum PolicyRepr {
    Named(String),
    Sentinel { sentinel: SentinelText },
}

#[derive(Deserialize, Serialize)]
struct SentinelText {
    text: String,
}

impl TryFrom<PolicyRepr> for EmptyBodyPolicy {
    type Error = String;

    fn try_from(repr: PolicyRepr) -> Result<Self, Self::Error> {
        match repr {
            PolicyRepr::Named(name) => match name.as_str() {
                "exclude" => Ok(EmptyBodyPolicy::Exclude),
                "use_title" => Ok(EmptyBodyPolicy::UseTitle),
                other => Err(format!(
                    "unknown empty_body_policy `{other}`, expected exclude, use_title or sentinel"
                )),
            },
            PolicyRepr::Sentinel { sentinel } => Ok(EmptyBodyPolicy::Sentinel {
                text: sentinel.text,
            }),
        }
    }
}

impl From<EmptyBodyPolicy> for PolicyRepr {
    fn from(policy: EmptyBodyPolicy) -> Self {
        match policy {
            EmptyBodyPolicy::Exclude => PolicyRepr::Named("exclude".to_string()),
            EmptyBodyPolicy::UseTitle => PolicyRepr::Named("use_title".to_string()),
            EmptyBodyPolicy::Sentinel { text } => PolicyRepr::Sentinel {
                sentinel: SentinelText { text },
            },
        }
    }
}

/// A feed-mode source: one candidate per run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedSource {
    pub name: String,
    pub feed_url: String,
    #[serde(default = "EmptyBodyPolicy::no_summary")]
    pub empty_body_policy: EmptyBodyPolicy,
}

impl FeedSource {
    pub fn new(name: &str, feed_url: &str) -> Self {
        Self {
            name: name.to_string(),
            feed_url: feed_url.to_string(),
            empty_body_policy: EmptyBodyPolicy::no_summary(),
        }
    }

    fn validate(&self) -> Result<(), HarvestError> {
        Url::parse(&self.feed_url).map_err(|e| {
            HarvestError::config(format!("{}: invalid feed_url {}: {e}", self.name, self.feed_url))
        })?;
        Ok(())
    }
}

/// One field-extraction rule: a CSS selector plus what to read from the match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RuleRepr")]
pub struct ExtractionRule {
    pub selector: String,
    /// Read this attribute instead of the element's text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Keep only the text before this delimiter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cut_at: Option<String>,
}

impl ExtractionRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: None,
            cut_at: None,
        }
    }

    pub fn attr(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: Some(attribute.to_string()),
            cut_at: None,
        }
    }

    pub fn cut_at(mut self, delimiter: &str) -> Self {
        self.cut_at = Some(delimiter.to_string());
        self
    }
}

/// YAML accepts a bare selector string or a full map.
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleRepr {
    Bare(String),
    Full {
        selector: String,
        #[serde(default)]
        attribute: Option<String>,
        #[serde(default)]
        cut_at: Option<String>,
    },
}

impl From<RuleRepr> for ExtractionRule {
    fn from(repr: RuleRepr) -> Self {
        match repr {
            RuleRepr::Bare(selector) => ExtractionRule::text(&selector),
            RuleRepr::Full {
                selector,
                attribute,
                cut_at,
            } => ExtractionRule {
                selector,
                attribute,
                cut_at,
            },
        }
    }
}

/// An ID-guessing source: `sample_size` distinct IDs drawn from `id_range`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdSource {
    pub name: String,
    pub base_url: String,
    pub id_param: String,
    /// Half-open range `[low, high)`.
    pub id_range: (u64, u64),
    pub sample_size: usize,
    /// Path-like locator of the structured article container.
    #[serde(default)]
    pub content_locator: Option<String>,
    #[serde(default)]
    pub title_rules: Vec<ExtractionRule>,
    #[serde(default)]
    pub date_rules: Vec<ExtractionRule>,
    #[serde(default)]
    pub category_rules: Vec<ExtractionRule>,
    #[serde(default)]
    pub fallback_content_selectors: Vec<String>,
    #[serde(default = "default_id_empty_body_policy")]
    pub empty_body_policy: EmptyBodyPolicy,
}

fn default_id_empty_body_policy() -> EmptyBodyPolicy {
    EmptyBodyPolicy::Exclude
}

impl IdSource {
    pub fn range_width(&self) -> u64 {
        self.id_range.1.saturating_sub(self.id_range.0)
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        let (low, high) = self.id_range;
        if low >= high {
            return Err(HarvestError::config(format!(
                "{}: id_range ({low}, {high}) is empty",
                self.name
            )));
        }
        if self.sample_size as u64 > self.range_width() {
            return Err(HarvestError::config(format!(
                "{}: sample_size {} exceeds id_range width {}",
                self.name,
                self.sample_size,
                self.range_width()
            )));
        }
        Url::parse(&self.base_url).map_err(|e| {
            HarvestError::config(format!("{}: invalid base_url {}: {e}", self.name, self.base_url))
        })?;
        if self.id_param.trim().is_empty() {
            return Err(HarvestError::config(format!("{}: id_param is empty", self.name)));
        }

        let rule_selectors = self
            .title_rules
            .iter()
            .chain(&self.date_rules)
            .chain(&self.category_rules)
            .map(|r| r.selector.as_str());
        for selector in rule_selectors
            .chain(self.content_locator.as_deref())
            .chain(self.fallback_content_selectors.iter().map(String::as_str))
        {
            parse_selector(selector)?;
        }
        Ok(())
    }
}

/// Parse a CSS selector, mapping failures to a configuration error.
pub fn parse_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector)
        .map_err(|e| HarvestError::config(format!("invalid selector `{selector}`: {e:?}")))
}

fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new("Utusan Malaysia", "https://www.utusan.com.my/feed/"),
        FeedSource::new("Berita Harian", "https://www.bharian.com.my/feed/"),
        FeedSource::new("Harian Metro", "https://www.hmetro.com.my/feed/"),
        FeedSource::new("Kosmo", "https://www.kosmo.com.my/feed/"),
        FeedSource::new(
            "Astro Awani",
            "https://www.astroawani.com/feeds/posts/default?alt=rss",
        ),
    ]
}

fn utusan_id_source() -> IdSource {
    IdSource {
        name: "Utusan Malaysia".to_string(),
        base_url: "https://www.utusan.com.my".to_string(),
        id_param: "p".to_string(),
        id_range: (100_000, 900_000),
        sample_size: 100,
        // //*[@id="content"]/div/div/section[3]/div/div/div[1]/div/div/div[5]/div
        content_locator: Some(
            "#content > div > div > section:nth-of-type(3) > div > div > div:nth-of-type(1) \
             > div > div > div:nth-of-type(5) > div"
                .to_string(),
        ),
        title_rules: ["h1.jeg_post_title", "h1.entry-title", "title"]
            .into_iter()
            .map(ExtractionRule::text)
            .collect(),
        date_rules: vec![
            ExtractionRule::text(".jeg_meta_date a"),
            ExtractionRule::text("time.jeg_date"),
            ExtractionRule::text("span.jeg_date"),
            ExtractionRule::text(".date"),
            ExtractionRule::text("time.entry-date"),
            ExtractionRule::text("span.posted-on"),
            ExtractionRule::attr("meta[property='article:published_time']", "content").cut_at("T"),
            ExtractionRule::attr("meta[name='date']", "content").cut_at("T"),
        ],
        category_rules: vec![
            ExtractionRule::text(".jeg_meta_category a"),
            ExtractionRule::text("a.jeg_meta_category"),
            ExtractionRule::text(".category"),
            ExtractionRule::text("a[rel='category tag']"),
            ExtractionRule::text(".post-categories a"),
            ExtractionRule::text("span.cat-links a"),
            ExtractionRule::attr("meta[property='article:section']", "content"),
        ],
        fallback_content_selectors: [
            ".jeg_post_content",
            ".entry-content",
            ".article-content",
            ".post-content",
            ".content",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        empty_body_policy: EmptyBodyPolicy::Exclude,
    }
}
