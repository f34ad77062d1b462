//! Utility functions for log formatting, output paths, and file system checks.
//!
//! - String truncation for log lines
//! - Dated output file names (`malay_news_{date}[_{time}].{ext}`)
//! - File system validation for output directories

use crate::error::HarvestError;
use crate::models::RunStamp;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Stem shared by every dataset file we write.
pub const DATASET_STEM: &str = "malay_news";

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended. Cuts always fall on a character boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Path of a dataset file for this run.
///
/// Feed runs write one file per day; ID runs include the time so several runs
/// on the same day do not overwrite each other.
pub fn dataset_path(dir: &Path, stamp: &RunStamp, with_time: bool, ext: &str) -> PathBuf {
    let name = if with_time {
        format!("{DATASET_STEM}_{}_{}.{ext}", stamp.date, stamp.time)
    } else {
        format!("{DATASET_STEM}_{}.{ext}", stamp.date)
    };
    dir.join(name)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), HarvestError> {
    fs::create_dir_all(path).await?;
    // A small sync write keeps the error surface simple.
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        assert_eq!(truncate_for_log("Kafé ditutup", 4), "Kafé…(+8 bytes)");
    }

    #[test]
    fn test_dataset_path() {
        let stamp = RunStamp {
            date: "2025-03-14".to_string(),
            time: "0830".to_string(),
        };
        let dir = Path::new("scraper/news_id");
        assert_eq!(
            dataset_path(dir, &stamp, true, "csv"),
            dir.join("malay_news_2025-03-14_0830.csv")
        );
        assert_eq!(
            dataset_path(dir, &stamp, false, "parquet"),
            dir.join("malay_news_2025-03-14.parquet")
        );
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("scraper").join("news_feed");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
