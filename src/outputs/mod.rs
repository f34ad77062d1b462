//! Dataset writers and the offline dataset utilities.
//!
//! # Submodules
//!
//! - [`table`]: CSV with a UTF-8 BOM, one row per article
//! - [`columnar`]: Snappy-compressed Parquet snapshot of the same rows
//! - [`merge`]: concatenates every CSV/Parquet file under a directory tree
//! - [`training`]: joins and shuffles labeled JSON training fragments
//!
//! # Output Structure
//!
//! ```text
//! scraper/
//! ├── news_scraper.log
//! ├── news_feed/
//! │   ├── malay_news_2025-03-14.csv
//! │   └── malay_news_2025-03-14.parquet
//! └── news_id/
//!     ├── malay_news_2025-03-14_0830.csv
//!     └── malay_news_2025-03-14_0830.parquet
//! ```

pub mod columnar;
pub mod merge;
pub mod table;
pub mod training;

use crate::error::HarvestError;
use crate::models::{RunResult, RunStamp};
use crate::utils::dataset_path;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// A loosely typed table: named text columns, nullable cells.
///
/// Used when merging files whose columns may differ.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Frame {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append `other`'s rows, adding any new columns at the end.
    ///
    /// Cells for columns a row never had are `None`.
    pub fn append(&mut self, other: Frame) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(i) => i,
                None => {
                    self.columns.push(name.clone());
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
        }
        for row in other.rows {
            let mut cells = vec![None; width];
            for (cell, &i) in row.into_iter().zip(&mapping) {
                cells[i] = cell;
            }
            self.rows.push(cells);
        }
    }
}

/// Write a run's records as CSV and Parquet into `dir`.
///
/// Nothing is written for an empty run. Each format is attempted on its own;
/// a failure is logged and does not stop the other. Returns the paths that
/// were written.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), records = result.records.len()))]
pub fn write_run(result: &RunResult, dir: &Path, stamp: &RunStamp, with_time: bool) -> Vec<PathBuf> {
    if result.records.is_empty() {
        info!("No records collected; no files written");
        return Vec::new();
    }

    let mut written = Vec::new();

    let csv_path = dataset_path(dir, stamp, with_time, "csv");
    match table::write_records(&result.records, &csv_path) {
        Ok(()) => written.push(csv_path),
        Err(e) => error!(error = %HarvestError::save(csv_path, e), "Save failed"),
    }

    let parquet_path = dataset_path(dir, stamp, with_time, "parquet");
    match columnar::write_records(&result.records, &parquet_path) {
        Ok(()) => written.push(parquet_path),
        Err(e) => error!(error = %HarvestError::save(parquet_path, e), "Save failed"),
    }

    written
}
