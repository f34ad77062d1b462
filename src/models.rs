//! Data models for harvested articles and run bookkeeping.
//!
//! - [`ArticleRecord`]: one successfully extracted article
//! - [`RunResult`]: the ordered records of a run plus its counters
//! - [`Candidate`]: one (source, URL) pair considered for extraction
//! - [`RunStamp`]: the date/time stamp shared by every record of a run
//!
//! The serialized column names (`News_Source`, `Title`, ...) are the ones the
//! downstream dataset tooling expects, so they are fixed with `serde(rename)`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Column names of the row table and columnar snapshot, in output order.
pub const COLUMNS: [&str; 7] = [
    "News_Source",
    "Title",
    "Source_URL",
    "Publish_Date",
    "Category",
    "Summary",
    "Scrape_Date",
];

/// A single harvested article.
///
/// Records are built once, linearly, and appended to a [`RunResult`]; they are
/// never edited after that.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The originating publication.
    #[serde(rename = "News_Source")]
    pub source_name: String,
    /// Non-empty, never equal to the bare source name.
    #[serde(rename = "Title")]
    pub title: String,
    /// Final resolved URL after redirects (or the feed item link).
    #[serde(rename = "Source_URL")]
    pub source_url: String,
    /// Raw extracted date text; empty when absent.
    #[serde(rename = "Publish_Date", default)]
    pub publish_date: String,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "Summary", default)]
    pub summary: String,
    /// The run's date stamp, identical for all records of one run.
    #[serde(rename = "Scrape_Date")]
    pub scrape_date: String,
}

impl ArticleRecord {
    /// Field values in [`COLUMNS`] order.
    pub fn values(&self) -> [&str; 7] {
        [
            &self.source_name,
            &self.title,
            &self.source_url,
            &self.publish_date,
            &self.category,
            &self.summary,
            &self.scrape_date,
        ]
    }
}

/// Outcome of one harvest run.
///
/// `records` keeps candidate attempt order; there is no sorting pass.
#[derive(Debug, Default, Clone)]
pub struct RunResult {
    pub records: Vec<ArticleRecord>,
    /// Candidates attempted (feeds in feed mode, IDs in ID mode).
    pub attempted_count: usize,
    /// Candidates dropped because no usable content could be produced
    /// (empty body under the `exclude` policy, undecodable body).
    pub excluded_count: usize,
    /// Negative matches: homepage redirects and placeholder titles.
    pub skipped_count: usize,
    /// Candidates whose fetch failed (network error, timeout, non-2xx).
    pub failed_count: usize,
    /// Sources whose fetch/parse failed outright.
    pub failed_sources: BTreeSet<String>,
}

impl RunResult {
    pub fn succeeded_count(&self) -> usize {
        self.records.len()
    }

    /// Fold another run's results in after this one, preserving order.
    pub fn absorb(&mut self, other: RunResult) {
        self.records.extend(other.records);
        self.attempted_count += other.attempted_count;
        self.excluded_count += other.excluded_count;
        self.skipped_count += other.skipped_count;
        self.failed_count += other.failed_count;
        self.failed_sources.extend(other.failed_sources);
    }
}

/// One (source, URL) pair considered for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source_name: String,
    pub url: String,
    /// The guessed article ID, for ID-mode candidates.
    pub article_id: Option<u64>,
}

/// Date and time stamp of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HHMM`
    pub time: String,
}

impl RunStamp {
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    pub fn from_datetime(dt: DateTime<Local>) -> Self {
        Self {
            date: dt.format("%Y-%m-%d").to_string(),
            time: dt.format("%H%M").to_string(),
        }
    }
}
