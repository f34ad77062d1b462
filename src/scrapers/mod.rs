//! The article harvester.
//!
//! Two acquisition modes share one pipeline:
//!
//! 1. **Feeds**: fetch each RSS/Atom feed once, every item is a candidate
//! 2. **IDs**: sample random article IDs per site and try each URL
//!
//! Each candidate then flows through fetch → decode → extract → normalize →
//! assemble. Processing is strictly sequential with politeness delays between
//! requests.
//!
//! # Stages
//!
//! | Stage | Module | Notes |
//! |-------|--------|-------|
//! | Candidates | [`candidates`] | Feed URLs, or distinct IDs sampled without replacement |
//! | Fetch | [`fetch`] | `Fetcher` trait; reqwest implementation follows redirects |
//! | Decode | [`encoding`] | Declared charset, strict UTF-8, then sniffing |
//! | Feed items | [`feed`] | quick-xml pull parser for RSS 2.0 and Atom |
//! | Extract | [`extract`] | Ordered CSS selector chains per field |
//! | Normalize | [`normalize`] | Markup stripping, whitespace, sentence truncation |
//! | Assemble + run loop | [`harvest`] | Record policy, counters, delays |

pub mod candidates;
pub mod encoding;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod harvest;
pub mod normalize;
