//! The harvest run loop and record assembly.
//!
//! Candidates are processed strictly one after another: fetch, decode, parse,
//! extract, normalize, assemble, append. Every per-candidate failure is caught
//! here and turned into a counter; only configuration problems escape.

use crate::config::{EmptyBodyPolicy, FeedSource, IdSource, Politeness};
use crate::error::HarvestError;
use crate::models::{ArticleRecord, Candidate, RunResult, RunStamp};
use crate::scrapers::candidates::{feed_candidates, id_candidates};
use crate::scrapers::encoding::decode_body;
use crate::scrapers::extract::FieldExtractor;
use crate::scrapers::feed::parse_feed;
use crate::scrapers::fetch::{Fetcher, is_homepage};
use crate::scrapers::normalize::{Whitespace, summarize};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Combine extracted fields and run metadata into a record.
///
/// - `Err(NotAnArticle)` when the title is empty or just the site name.
/// - `Ok(None)` when there is no summary and the policy is `exclude`.
/// - Otherwise the record, with the policy's fallback summary if needed.
pub fn assemble_record(
    source_name: &str,
    title: &str,
    source_url: &str,
    publish_date: &str,
    category: &str,
    summary: Option<String>,
    policy: &EmptyBodyPolicy,
    stamp: &RunStamp,
) -> Result<Option<ArticleRecord>, HarvestError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(HarvestError::NotAnArticle {
            reason: "no title".to_string(),
        });
    }
    if title == source_name {
        return Err(HarvestError::NotAnArticle {
            reason: "placeholder title".to_string(),
        });
    }

    let summary = match (summary, policy) {
        (Some(summary), _) => summary,
        (None, EmptyBodyPolicy::Exclude) => return Ok(None),
        (None, EmptyBodyPolicy::UseTitle) => title.to_string(),
        (None, EmptyBodyPolicy::Sentinel { text }) => text.clone(),
    };

    Ok(Some(ArticleRecord {
        source_name: source_name.to_string(),
        title: title.to_string(),
        source_url: source_url.to_string(),
        publish_date: publish_date.trim().to_string(),
        category: category.trim().to_string(),
        summary,
        scrape_date: stamp.date.clone(),
    }))
}

/// Per-candidate result inside the ID loop.
enum Outcome {
    Record(ArticleRecord),
    NoContent,
}

/// Drives one run over a [`Fetcher`], with an injectable random source for
/// ID sampling and politeness jitter.
pub struct Harvester<F, R> {
    fetcher: F,
    rng: R,
    politeness: Politeness,
    stamp: RunStamp,
}

impl<F: Fetcher, R: Rng> Harvester<F, R> {
    pub fn new(fetcher: F, rng: R, politeness: Politeness, stamp: RunStamp) -> Self {
        Self {
            fetcher,
            rng,
            politeness,
            stamp,
        }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Mode A: one fetch per feed, every item becomes a candidate record.
    #[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
    pub async fn harvest_feeds(&mut self, feeds: &[FeedSource]) -> RunResult {
        let mut result = RunResult::default();

        for (feed, candidate) in feeds.iter().zip(feed_candidates(feeds)) {
            result.attempted_count += 1;
            info!(source = %feed.name, "Fetching feed");

            match self.harvest_feed(feed, &candidate, &mut result).await {
                Ok(count) => {
                    info!(source = %feed.name, articles = count, "Processed feed");
                    self.pause(self.politeness.feed_delay_secs).await;
                }
                Err(e) => {
                    error!(source = %feed.name, error = %e, "Feed failed");
                    result.failed_count += 1;
                    result.failed_sources.insert(feed.name.clone());
                }
            }
        }
        result
    }

    async fn harvest_feed(
        &mut self,
        feed: &FeedSource,
        candidate: &Candidate,
        result: &mut RunResult,
    ) -> Result<usize, HarvestError> {
        let page = self.fetcher.fetch(&candidate.url).await?;
        let (xml, encoding) =
            decode_body(&page.body, page.declared_charset.as_deref(), &candidate.url)?;
        debug!(source = %feed.name, encoding, "Decoded feed");

        let items = parse_feed(&xml).map_err(|e| HarvestError::Feed {
            url: candidate.url.clone(),
            reason: e.to_string(),
        })?;

        let mut added = 0;
        for item in items {
            let summary = summarize(&item.description, Whitespace::Paragraphs);
            match assemble_record(
                &feed.name,
                &item.title,
                &item.link,
                &item.publish_date,
                &item.category,
                summary,
                &feed.empty_body_policy,
                &self.stamp,
            ) {
                Ok(Some(record)) => {
                    result.records.push(record);
                    added += 1;
                }
                Ok(None) => {
                    result.excluded_count += 1;
                    warn!(source = %feed.name, link = %item.link, "Skipping feed item - no content");
                }
                Err(e) => {
                    result.skipped_count += 1;
                    debug!(source = %feed.name, link = %item.link, reason = %e, "Skipping feed item");
                }
            }
        }
        Ok(added)
    }

    /// Mode B: sample IDs for every source, then try each candidate URL.
    ///
    /// All sources are validated and sampled before the first request, so a
    /// configuration error aborts the run without touching the network.
    #[instrument(level = "info", skip_all, fields(sources = sources.len()))]
    pub async fn harvest_ids(&mut self, sources: &[IdSource]) -> Result<RunResult, HarvestError> {
        let mut plans = Vec::with_capacity(sources.len());
        for source in sources {
            let extractor = FieldExtractor::new(source)?;
            let candidates = id_candidates(source, &mut self.rng)?;
            plans.push((source, extractor, candidates));
        }

        let mut result = RunResult::default();
        for (source, extractor, candidates) in plans {
            info!(
                source = %source.name,
                ids = candidates.len(),
                "Checking random article IDs"
            );
            let mut run = RunResult::default();

            for candidate in &candidates {
                run.attempted_count += 1;
                let id = candidate.article_id.unwrap_or_default();

                match self.harvest_article(source, &extractor, candidate).await {
                    Ok(Outcome::Record(record)) => {
                        info!(id, title = %truncate_for_log(&record.title, 50), "Found article");
                        info!(
                            date = %record.publish_date,
                            category = %record.category,
                            summary_chars = record.summary.chars().count(),
                            "Article details"
                        );
                        run.records.push(record);
                        let (lo, hi) = self.politeness.success_delay_secs;
                        let secs = self.jitter(lo, hi);
                        self.pause(secs).await;
                    }
                    Ok(Outcome::NoContent) => {
                        run.excluded_count += 1;
                        warn!(id, "Skipping article - no content found");
                    }
                    Err(HarvestError::NotAnArticle { reason }) => {
                        run.skipped_count += 1;
                        debug!(id, %reason, "Not an article");
                    }
                    Err(e @ HarvestError::Decode { .. }) => {
                        run.excluded_count += 1;
                        warn!(id, error = %e, "Skipping article - undecodable body");
                        self.pause(self.politeness.error_delay_secs).await;
                    }
                    Err(e) if e.is_fetch_failure() => {
                        run.failed_count += 1;
                        warn!(id, error = %e, "Request failed");
                        self.pause(self.politeness.fetch_failure_delay_secs).await;
                    }
                    Err(e) => {
                        run.failed_count += 1;
                        error!(id, error = %e, "Error processing article");
                        self.pause(self.politeness.error_delay_secs).await;
                    }
                }
            }

            if !candidates.is_empty() && run.failed_count == candidates.len() {
                run.failed_sources.insert(source.name.clone());
            }
            result.absorb(run);
        }
        Ok(result)
    }

    #[instrument(level = "debug", skip_all, fields(url = %candidate.url))]
    async fn harvest_article(
        &mut self,
        source: &IdSource,
        extractor: &FieldExtractor,
        candidate: &Candidate,
    ) -> Result<Outcome, HarvestError> {
        let page = self.fetcher.fetch(&candidate.url).await?;
        if is_homepage(&page.final_url, &source.base_url) {
            return Err(HarvestError::NotAnArticle {
                reason: "redirected to homepage".to_string(),
            });
        }

        let (html, _) = decode_body(&page.body, page.declared_charset.as_deref(), &candidate.url)?;
        let fields = extractor.extract(&html);
        let summary = summarize(&fields.body, Whitespace::Collapse);

        let record = assemble_record(
            &source.name,
            &fields.title,
            &page.final_url,
            &fields.publish_date,
            &fields.category,
            summary,
            &source.empty_body_policy,
            &self.stamp,
        )?;
        Ok(record.map_or(Outcome::NoContent, Outcome::Record))
    }

    fn jitter(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        }
    }

    async fn pause(&self, secs: f64) {
        if secs > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        }
    }
}

/// Final run summary; emitted even when nothing was found.
pub fn log_summary(mode: &str, result: &RunResult) {
    info!(
        mode,
        attempted = result.attempted_count,
        succeeded = result.succeeded_count(),
        excluded = result.excluded_count,
        skipped = result.skipped_count,
        failed = result.failed_count,
        failed_sources = %result.failed_sources.iter().join(", "),
        "Scrape completed"
    );
    if !result.failed_sources.is_empty() {
        warn!(
            count = result.failed_sources.len(),
            sources = %result.failed_sources.iter().join(", "),
            "Failed to process sources"
        );
    }
}
