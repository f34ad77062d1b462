//! Columnar Parquet output.
//!
//! Every column is stored as UTF-8 text with Snappy compression. Dataset
//! files use non-nullable columns; merged frames allow nulls where a source
//! file lacked a column.

use crate::models::{ArticleRecord, COLUMNS};
use crate::outputs::Frame;
use arrow_array::{Array, ArrayRef, RecordBatch, StringArray};
use arrow_cast::display::array_value_to_string;
use arrow_schema::{ArrowError, DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

fn write_batch(batch: &RecordBatch, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Write records to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_records(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let schema = Schema::new(
        COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    );
    let rows: Vec<[&str; 7]> = records.iter().map(ArticleRecord::values).collect();
    let columns: Vec<ArrayRef> = (0..COLUMNS.len())
        .map(|i| Arc::new(StringArray::from_iter_values(rows.iter().map(|row| row[i]))) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(Arc::new(schema), columns)?;
    write_batch(&batch, path)?;
    info!("Wrote Parquet");
    Ok(())
}

fn cell_text(column: &ArrayRef, row: usize) -> Result<Option<String>, ArrowError> {
    if column.is_null(row) {
        return Ok(None);
    }
    array_value_to_string(column, row).map(Some)
}

/// Read any Parquet file, rendering non-text columns as their display form.
pub fn read_frame(path: &Path) -> Result<Frame, Box<dyn Error>> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|column| cell_text(column, row))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }
    }
    Ok(Frame { columns, rows })
}

/// Write a frame with nullable text columns.
pub fn write_frame(frame: &Frame, path: &Path) -> Result<(), Box<dyn Error>> {
    let schema = Schema::new(
        frame
            .columns
            .iter()
            .map(|name| Field::new(name.as_str(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    );
    let columns: Vec<ArrayRef> = (0..frame.columns.len())
        .map(|i| {
            let cells: Vec<Option<&str>> = frame
                .rows
                .iter()
                .map(|row| row.get(i).and_then(|c| c.as_deref()))
                .collect();
            Arc::new(StringArray::from(cells)) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(Arc::new(schema), columns)?;
    write_batch(&batch, path)
}

/// Read records written by [`write_records`].
#[cfg(test)]
pub fn read_records(path: &Path) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
    let frame = read_frame(path)?;
    let mut positions = [0usize; 7];
    for (slot, name) in positions.iter_mut().zip(COLUMNS) {
        *slot = frame
            .column_index(name)
            .ok_or_else(|| format!("{}: missing column {name}", path.display()))?;
    }

    let text = |row: &[Option<String>], i: usize| row[positions[i]].clone().unwrap_or_default();
    Ok(frame
        .rows
        .iter()
        .map(|row| ArticleRecord {
            source_name: text(row, 0),
            title: text(row, 1),
            source_url: text(row, 2),
            publish_date: text(row, 3),
            category: text(row, 4),
            summary: text(row, 5),
            scrape_date: text(row, 6),
        })
        .collect())
}
