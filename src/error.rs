//! Error taxonomy for a harvest run.
//!
//! Per-candidate errors ([`HarvestError::Fetch`], [`HarvestError::Status`],
//! [`HarvestError::NotAnArticle`], [`HarvestError::Decode`]) are caught at the
//! candidate boundary by the run loop and turned into counters. Only
//! [`HarvestError::Configuration`] and start-up I/O abort a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    /// Network error, timeout, or connection failure.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    /// The URL resolved, but the page is not an article (homepage redirect,
    /// placeholder title).
    #[error("not an article: {reason}")]
    NotAnArticle { reason: String },

    /// Every decoding attempt for the body failed.
    #[error("could not decode body of {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A feed document could not be parsed at all.
    #[error("could not parse feed {url}: {reason}")]
    Feed { url: String, reason: String },

    /// Writing an output file failed.
    #[error("failed to save {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    pub fn config(msg: impl Into<String>) -> Self {
        HarvestError::Configuration(msg.into())
    }

    pub fn save(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        HarvestError::Save {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Network-level failures get the longer back-off delay.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, HarvestError::Fetch { .. } | HarvestError::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_classification() {
        let e = HarvestError::Status {
            url: "https://example.com/?p=1".into(),
            status: 404,
        };
        assert!(e.is_fetch_failure());
        assert!(e.to_string().contains("404"));

        let e = HarvestError::NotAnArticle {
            reason: "redirected to homepage".into(),
        };
        assert!(!e.is_fetch_failure());
    }

    #[test]
    fn test_save_error_mentions_path() {
        let e = HarvestError::save("/tmp/out.csv", "disk full");
        assert_eq!(e.to_string(), "failed to save /tmp/out.csv: disk full");
    }
}
