//! Directory merge: concatenate every dataset file under a tree.
//!
//! CSV and Parquet inputs are merged separately into `malay_news.csv` and
//! `malay_news.parquet`. Rows are appended as read; duplicates from
//! overlapping runs are kept.

use crate::outputs::{Frame, columnar, table};
use crate::utils::DATASET_STEM;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Counts reported by [`merge_tree`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub csv_files: usize,
    pub csv_rows: usize,
    pub parquet_files: usize,
    pub parquet_rows: usize,
    /// Files that matched an extension but could not be read.
    pub skipped_files: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Csv,
    Parquet,
}

fn kind_of(path: &Path) -> Option<Kind> {
    match path.extension()?.to_str()? {
        "csv" => Some(Kind::Csv),
        "parquet" => Some(Kind::Parquet),
        _ => None,
    }
}

/// Every regular file under `root`, depth first, sorted by name per directory.
///
/// Symlinks to files are followed; symlinks to directories are not, so a link
/// pointing back up the tree cannot loop.
fn walk(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(root)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.path());

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            files.extend(walk(&path)?);
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            files.push(path);
        } else if file_type.is_symlink() {
            debug!(path = %path.display(), "Not following directory symlink");
        }
    }
    Ok(files)
}

/// Merge every `.csv` and `.parquet` file under `root` into `output_dir`.
///
/// CSV and Parquet inputs are merged separately, each with the union of the
/// columns seen. Unreadable files are logged and counted, not fatal. Files
/// that are the merge outputs themselves are skipped, so `output_dir` may sit
/// inside `root`.
///
/// # Arguments
///
/// * `root` - Directory tree to scan
/// * `output_dir` - Where `malay_news.csv` and `malay_news.parquet` go; created if missing
///
/// # Returns
///
/// A [`MergeSummary`] with per-format file and row counts. A format with no
/// readable inputs produces no output file.
///
/// # Errors
///
/// Fails if `root` cannot be listed, or if an output file cannot be written.
#[instrument(level = "info", skip_all, fields(root = %root.display(), output = %output_dir.display()))]
pub fn merge_tree(root: &Path, output_dir: &Path) -> Result<MergeSummary, Box<dyn Error>> {
    fs::create_dir_all(output_dir)?;
    let csv_out = output_dir.join(format!("{DATASET_STEM}.csv"));
    let parquet_out = output_dir.join(format!("{DATASET_STEM}.parquet"));
    let previous_outputs: Vec<PathBuf> = [&csv_out, &parquet_out]
        .iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();

    let mut summary = MergeSummary::default();
    let mut csv = Frame::default();
    let mut parquet = Frame::default();

    for path in walk(root)? {
        let Some(kind) = kind_of(&path) else { continue };
        if fs::canonicalize(&path).is_ok_and(|p| previous_outputs.contains(&p)) {
            info!(file = %path.display(), "Skipping previous merge output");
            continue;
        }

        let read = match kind {
            Kind::Csv => table::read_frame(&path),
            Kind::Parquet => columnar::read_frame(&path),
        };
        let frame = match read {
            Ok(frame) => frame,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Could not read file; skipping");
                summary.skipped_files += 1;
                continue;
            }
        };

        info!(file = %path.display(), rows = frame.rows.len(), "Read file");
        match kind {
            Kind::Csv => {
                summary.csv_files += 1;
                csv.append(frame);
            }
            Kind::Parquet => {
                summary.parquet_files += 1;
                parquet.append(frame);
            }
        }
    }

    if summary.csv_files > 0 {
        table::write_frame(&csv, &csv_out)?;
        summary.csv_rows = csv.rows.len();
        info!(files = summary.csv_files, rows = summary.csv_rows, path = %csv_out.display(), "Merged CSV files");
    } else {
        info!("No CSV files found to merge");
    }

    if summary.parquet_files > 0 {
        columnar::write_frame(&parquet, &parquet_out)?;
        summary.parquet_rows = parquet.rows.len();
        info!(files = summary.parquet_files, rows = summary.parquet_rows, path = %parquet_out.display(), "Merged Parquet files");
    } else {
        info!("No Parquet files found to merge");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleRecord, RunResult, RunStamp};
    use crate::outputs::write_run;

    fn run(titles: &[&str]) -> RunResult {
        RunResult {
            records: titles
                .iter()
                .map(|title| ArticleRecord {
                    source_name: "Utusan Malaysia".to_string(),
                    title: title.to_string(),
                    source_url: format!("https://www.utusan.com.my/?p={}", title.len()),
                    publish_date: "14/03/2025".to_string(),
                    category: "Nasional".to_string(),
                    summary: "Ringkasan.".to_string(),
                    scrape_date: "2025-03-14".to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn stamp(time: &str) -> RunStamp {
        RunStamp {
            date: "2025-03-14".to_string(),
            time: time.to_string(),
        }
    }

    #[test]
    fn test_same_day_runs_are_concatenated_without_dedup() {
        let root = tempfile::tempdir().unwrap();
        let id_dir = root.path().join("news_id");
        fs::create_dir_all(&id_dir).unwrap();
        write_run(&run(&["Banjir", "Kemarau"]), &id_dir, &stamp("0830"), true);
        write_run(&run(&["Banjir"]), &id_dir, &stamp("1400"), true);

        let out = tempfile::tempdir().unwrap();
        let summary = merge_tree(root.path(), out.path()).unwrap();

        assert_eq!(summary.csv_files, 2);
        assert_eq!(summary.csv_rows, 3);
        assert_eq!(summary.parquet_files, 2);
        assert_eq!(summary.parquet_rows, 3);

        let merged = table::read_records(&out.path().join("malay_news.csv")).unwrap();
        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Banjir", "Kemarau", "Banjir"]);

        let merged = columnar::read_records(&out.path().join("malay_news.parquet")).unwrap();
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_nested_dirs_and_unreadable_files() {
        let root = tempfile::tempdir().unwrap();
        let feed_dir = root.path().join("news_feed");
        fs::create_dir_all(&feed_dir).unwrap();
        write_run(&run(&["Satu"]), &feed_dir, &stamp("0900"), false);
        fs::write(root.path().join("broken.parquet"), b"not parquet").unwrap();
        fs::write(root.path().join("notes.txt"), b"ignored").unwrap();

        let out = tempfile::tempdir().unwrap();
        let summary = merge_tree(root.path(), out.path()).unwrap();
        assert_eq!(summary.csv_files, 1);
        assert_eq!(summary.parquet_files, 1);
        assert_eq!(summary.skipped_files, 1);
    }

    #[test]
    fn test_previous_output_inside_root_is_ignored() {
        let root = tempfile::tempdir().unwrap();
        write_run(&run(&["Satu", "Dua"]), root.path(), &stamp("0900"), true);
        let out = root.path().join("merged");

        merge_tree(root.path(), &out).unwrap();
        let again = merge_tree(root.path(), &out).unwrap();

        assert_eq!(again.csv_files, 1);
        assert_eq!(again.csv_rows, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_symlink_loop_is_not_followed() {
        let root = tempfile::tempdir().unwrap();
        let id_dir = root.path().join("news_id");
        fs::create_dir_all(&id_dir).unwrap();
        write_run(&run(&["Banjir"]), &id_dir, &stamp("0830"), true);
        std::os::unix::fs::symlink(root.path(), id_dir.join("loop")).unwrap();

        let elsewhere = tempfile::tempdir().unwrap();
        let linked_csv = elsewhere.path().join("malay_news_2025-03-13.csv");
        table::write_records(&run(&["Kemarau"]).records, &linked_csv).unwrap();
        std::os::unix::fs::symlink(&linked_csv, root.path().join("linked.csv")).unwrap();

        let out = tempfile::tempdir().unwrap();
        let summary = merge_tree(root.path(), out.path()).unwrap();
        assert_eq!(summary.csv_files, 2);
        assert_eq!(summary.csv_rows, 2);
        assert_eq!(summary.parquet_files, 1);
    }

    #[test]
    fn test_empty_tree_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let summary = merge_tree(root.path(), out.path()).unwrap();
        assert_eq!(summary, MergeSummary::default());
        assert!(!out.path().join("malay_news.csv").exists());
    }
}
