//! Run manifest export (JSON).

use anyhow::{Context, Result};
use econlab_core::domain::WideTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::PipelineConfig;
use crate::pipeline::{FetchSummary, PipelineReport};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub config_hash: String,
    /// BLAKE3 over the wide table contents.
    pub dataset_hash: String,
    pub rows: usize,
    pub countries: Vec<String>,
    pub indicators: Vec<FetchSummary>,
    /// Artifact paths relative to the output directory.
    pub artifacts: Vec<String>,
    pub config: PipelineConfig,
}

impl RunManifest {
    pub fn from_report(report: &PipelineReport, artifacts: Vec<String>) -> Self {
        Self {
            generated_at: chrono::Utc::now(),
            config_hash: report.config.config_hash(),
            dataset_hash: compute_dataset_hash(&report.table),
            rows: report.table.len(),
            countries: report.table.countries().into_iter().map(str::to_string).collect(),
            indicators: report.fetched.clone(),
            artifacts,
            config: report.config.clone(),
        }
    }
}

/// Compute a deterministic BLAKE3 hash over the wide table.
///
/// Covers column names, keys and every cell in row order. Missing cells hash
/// as a distinct marker byte so `None` never collides with a number.
pub fn compute_dataset_hash(table: &WideTable) -> String {
    let mut hasher = blake3::Hasher::new();

    for name in table.value_columns() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    for row in &table.rows {
        hasher.update(row.country().as_bytes());
        hasher.update(&[0]);
        hasher.update(row.country_code().as_bytes());
        hasher.update(&row.year().to_le_bytes());
        for cell in row.values.iter().chain(row.derived.iter()) {
            match cell {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&v.to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
    }

    hasher.finalize().to_hex().to_string()
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)
        .context("Failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}
