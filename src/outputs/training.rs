//! Joins labeled JSON training fragments into one shuffled dataset.
//!
//! Each input holds a JSON array of examples. The examples are kept as opaque
//! JSON values, so any labeling schema passes through unchanged.

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Read one fragment file.
pub fn load_examples(path: &Path) -> Result<Vec<Value>, Box<dyn Error>> {
    let raw = fs::read_to_string(path)?;
    let examples: Vec<Value> = serde_json::from_str(&raw)
        .map_err(|e| format!("{}: expected a JSON array of examples: {e}", path.display()))?;
    Ok(examples)
}

/// Concatenate `inputs` in order, shuffle, and write pretty JSON to `output`.
///
/// # Arguments
///
/// * `inputs` - Fragment files, each a JSON array of labeled examples
/// * `output` - Destination file, replaced if it exists
/// * `rng` - Shuffle source; seed it for a reproducible order
///
/// # Returns
///
/// The number of examples written.
///
/// # Errors
///
/// Fails on the first unreadable or non-array fragment, before anything is
/// written, or if `output` cannot be written.
#[instrument(level = "info", skip_all, fields(inputs = inputs.len(), output = %output.display()))]
pub fn join_training<R: Rng + ?Sized>(
    inputs: &[PathBuf],
    output: &Path,
    rng: &mut R,
) -> Result<usize, Box<dyn Error>> {
    let mut examples = Vec::new();
    for path in inputs {
        let loaded = load_examples(path)?;
        info!(file = %path.display(), examples = loaded.len(), "Loaded fragment");
        examples.extend(loaded);
    }

    examples.shuffle(rng);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, serde_json::to_string_pretty(&examples)?)?;
    info!(examples = examples.len(), "Wrote training data");
    Ok(examples.len())
}
