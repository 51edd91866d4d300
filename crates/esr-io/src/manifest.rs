//! Published dataset manifest (JSON).

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use esr_core::dataset::{DatasetMetadata, PublishedDataset};

pub const DEFAULT_TITLE: &str = "US ISO/RTO Electricity Supply Response Data";
pub const DEFAULT_AUTHOR: &str = "Bottlenecks Lab";
pub const DEFAULT_NOTES: &str = "Generated by `esr build` from raw EIA/LBNL downloads. \
Metrics a source could not provide are omitted rather than zero-filled.";

/// Metadata stamped with today's date.
pub fn default_metadata(primary_year: i32) -> DatasetMetadata {
    DatasetMetadata {
        title: DEFAULT_TITLE.to_string(),
        author: DEFAULT_AUTHOR.to_string(),
        compiled: Local::now().date_naive().format("%Y-%m-%d").to_string(),
        primary_year,
        notes: DEFAULT_NOTES.to_string(),
    }
}

pub fn write_dataset(path: &Path, dataset: &PublishedDataset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating dataset directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(dataset).context("serializing dataset to JSON")?;
    fs::write(path, json).with_context(|| format!("writing dataset '{}'", path.display()))?;
    Ok(())
}

pub fn load_dataset(path: &Path) -> Result<PublishedDataset> {
    let file = File::open(path).with_context(|| format!("opening dataset '{}'", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing dataset '{}'", path.display()))
}
