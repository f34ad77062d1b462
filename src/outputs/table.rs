//! Row-oriented CSV output.
//!
//! Files start with a UTF-8 byte-order mark so spreadsheet tools pick the
//! right encoding for Malay text, and use the dataset column names as header.

use crate::models::{ArticleRecord, COLUMNS};
use crate::outputs::Frame;
use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write records to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_records(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Wrote CSV");
    Ok(())
}

/// Strip a leading BOM, if any.
pub fn without_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Read records written by [`write_records`].
#[cfg(test)]
pub fn read_records(path: &Path) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
    let bytes = std::fs::read(path)?;
    let mut reader = csv::Reader::from_reader(without_bom(&bytes));
    let records = reader
        .deserialize::<ArticleRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Read any CSV file, keeping every column as text.
pub fn read_frame(path: &Path) -> Result<Frame, Box<dyn Error>> {
    let bytes = std::fs::read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(without_bom(&bytes));
    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|row| row.map(|r| r.iter().map(|cell| Some(cell.to_string())).collect()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Frame { columns, rows })
}

/// Write a frame; missing and null cells become empty fields.
pub fn write_frame(frame: &Frame, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&frame.columns)?;
    for row in &frame.rows {
        writer.write_record(
            (0..frame.columns.len()).map(|i| row.get(i).cloned().flatten().unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ArticleRecord> {
        vec![
            ArticleRecord {
                source_name: "Berita Harian".to_string(),
                title: "Tajuk, dengan koma \"petikan\"".to_string(),
                source_url: "https://www.bharian.com.my/berita/1".to_string(),
                publish_date: "".to_string(),
                category: "Nasional".to_string(),
                summary: "Perenggan satu.\n\nPerenggan dua.".to_string(),
                scrape_date: "2025-03-14".to_string(),
            },
            ArticleRecord {
                source_name: "Kosmo".to_string(),
                title: "Kafé baharu dibuka".to_string(),
                source_url: "https://www.kosmo.com.my/2".to_string(),
                publish_date: "Fri, 14 Mar 2025 08:30:00 +0800".to_string(),
                category: "".to_string(),
                summary: "No summary available".to_string(),
                scrape_date: "2025-03-14".to_string(),
            },
        ]
    }

    #[test]
    fn test_csv_round_trip_preserves_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("malay_news.csv");
        write_records(&sample(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        assert_eq!(read_records(&path).unwrap(), sample());
    }

    #[test]
    fn test_header_uses_dataset_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&sample(), &path).unwrap();
        let frame = read_frame(&path).unwrap();
        assert_eq!(frame.columns, COLUMNS);
        assert_eq!(frame.rows.len(), 2);
        assert_eq!(frame.rows[1][1].as_deref(), Some("Kafé baharu dibuka"));
    }

    #[test]
    fn test_empty_run_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_records(&[], &path).unwrap();
        let frame = read_frame(&path).unwrap();
        assert_eq!(frame.columns.len(), 7);
        assert!(frame.rows.is_empty());
    }

    #[test]
    fn test_write_frame_pads_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let frame = Frame {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![Some("1".to_string())], vec![None, Some("2".to_string())]],
        };
        write_frame(&frame, &path).unwrap();
        let cells: Vec<Vec<String>> = read_frame(&path)
            .unwrap()
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
            .collect();
        assert_eq!(cells, [["1", ""], ["", "2"]]);
    }
}
