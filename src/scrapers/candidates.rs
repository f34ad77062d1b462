//! Candidate enumeration.
//!
//! Feed mode yields one candidate per configured feed. ID mode draws
//! `sample_size` distinct IDs without replacement from the half-open
//! `id_range` and turns each into `base_url?id_param=id`. The random source is
//! injected so a seeded RNG reproduces the same ID sequence.

use crate::config::{FeedSource, IdSource};
use crate::error::HarvestError;
use crate::models::Candidate;
use rand::Rng;
use rand::seq::index;
use tracing::{debug, instrument};
use url::Url;

/// One candidate per feed, in configuration order.
pub fn feed_candidates(feeds: &[FeedSource]) -> Vec<Candidate> {
    feeds
        .iter()
        .map(|feed| Candidate {
            source_name: feed.name.clone(),
            url: feed.feed_url.clone(),
            article_id: None,
        })
        .collect()
}

/// Draw distinct article IDs from `source.id_range`, in draw order.
///
/// # Arguments
///
/// * `source` - The ID source; its range is half-open
/// * `rng` - Random source, seeded in tests and for `--seed`
///
/// # Returns
///
/// `sample_size` distinct IDs in `[low, high)`.
///
/// # Errors
///
/// [`HarvestError::Configuration`] when the range is empty or `sample_size`
/// exceeds its width.
pub fn sample_ids<R: Rng + ?Sized>(source: &IdSource, rng: &mut R) -> Result<Vec<u64>, HarvestError> {
    source.validate()?;
    let (low, _) = source.id_range;
    let width = usize::try_from(source.range_width())
        .map_err(|_| HarvestError::config(format!("{}: id_range too wide", source.name)))?;

    let ids = index::sample(rng, width, source.sample_size)
        .into_iter()
        .map(|offset| low + offset as u64)
        .collect();
    Ok(ids)
}

/// Build the candidate URL for one article ID.
pub fn id_url(base_url: &str, id_param: &str, id: u64) -> Result<String, HarvestError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| HarvestError::config(format!("invalid base_url {base_url}: {e}")))?;
    url.query_pairs_mut().append_pair(id_param, &id.to_string());
    Ok(url.to_string())
}

/// Sample IDs and build their candidates.
#[instrument(level = "debug", skip_all, fields(source = %source.name, sample_size = source.sample_size))]
pub fn id_candidates<R: Rng + ?Sized>(
    source: &IdSource,
    rng: &mut R,
) -> Result<Vec<Candidate>, HarvestError> {
    let candidates = sample_ids(source, rng)?
        .into_iter()
        .map(|id| {
            Ok(Candidate {
                source_name: source.name.clone(),
                url: id_url(&source.base_url, &source.id_param, id)?,
                article_id: Some(id),
            })
        })
        .collect::<Result<Vec<_>, HarvestError>>()?;
    debug!(count = candidates.len(), "Built ID candidates");
    Ok(candidates)
}
