//! Artifact manager for persisting run outputs.

mod charts;
mod correlations;
mod manifest;
mod metrics;
mod wide;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::pipeline::PipelineReport;

pub use charts::{chart_file_name, render_line_chart, series_for, ChartSeries};
pub use manifest::{compute_dataset_hash, RunManifest};
pub use metrics::metrics_header;
pub use wide::wide_header;

pub const WIDE_CSV: &str = "raw_wide_data.csv";
pub const WIDE_PARQUET: &str = "raw_wide_data.parquet";
pub const METRICS_CSV: &str = "country_summary_metrics.csv";
pub const COUNTRY_CORRELATIONS_CSV: &str = "country_indicator_correlations.csv";
pub const OVERALL_CORRELATION_CSV: &str = "overall_correlation.csv";
pub const CHARTS_DIR: &str = "charts";
pub const MANIFEST_JSON: &str = "manifest.json";
pub const REPORT_MD: &str = "report.md";

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub output_dir: PathBuf,
    pub wide_csv: PathBuf,
    pub wide_parquet: Option<PathBuf>,
    pub metrics_csv: PathBuf,
    pub country_correlations_csv: PathBuf,
    pub overall_correlation_csv: PathBuf,
    /// `(indicator, path)` for each chart actually written.
    pub charts: Vec<(String, PathBuf)>,
    pub report_markdown: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Every written file, relative to the output directory.
    pub fn relative_files(&self) -> Vec<String> {
        let mut files = vec![&self.wide_csv];
        files.extend(self.wide_parquet.iter());
        files.extend([
            &self.metrics_csv,
            &self.country_correlations_csv,
            &self.overall_correlation_csv,
        ]);
        files.extend(self.charts.iter().map(|(_, p)| p));
        files.extend(self.report_markdown.iter());
        files.extend(self.manifest.iter());

        files
            .into_iter()
            .map(|p| {
                p.strip_prefix(&self.output_dir)
                    .unwrap_or(p.as_path())
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save the tabular artifacts and charts. Report and manifest are added
    /// by the export orchestrator.
    pub fn save_report(&self, report: &PipelineReport) -> Result<ArtifactPaths> {
        let dir = &self.output_dir;
        let output = &report.config.output;

        let wide_csv = dir.join(WIDE_CSV);
        wide::write_wide_csv(&wide_csv, &report.table)?;
        let wide_parquet = if output.parquet {
            let path = dir.join(WIDE_PARQUET);
            wide::write_wide_parquet(&path, &report.table)?;
            Some(path)
        } else {
            None
        };

        let metrics_csv = dir.join(METRICS_CSV);
        metrics::write_metrics_csv(&metrics_csv, &report.metrics, &report.table.indicators)?;

        let country_correlations_csv = dir.join(COUNTRY_CORRELATIONS_CSV);
        correlations::write_country_correlations_csv(
            &country_correlations_csv,
            &report.correlation_indicators,
            &report.country_correlations,
        )?;

        let overall_correlation_csv = dir.join(OVERALL_CORRELATION_CSV);
        correlations::write_overall_correlation_csv(
            &overall_correlation_csv,
            &report.overall_correlation,
        )?;

        let charts = if output.charts {
            self.save_charts(report)?
        } else {
            Vec::new()
        };

        info!(dir = %dir.display(), charts = charts.len(), "wrote tabular artifacts");

        Ok(ArtifactPaths {
            output_dir: dir.clone(),
            wide_csv,
            wide_parquet,
            metrics_csv,
            country_correlations_csv,
            overall_correlation_csv,
            charts,
            report_markdown: None,
            manifest: None,
        })
    }

    fn save_charts(&self, report: &PipelineReport) -> Result<Vec<(String, PathBuf)>> {
        let charts_dir = self.output_dir.join(CHARTS_DIR);
        std::fs::create_dir_all(&charts_dir).context("Failed to create charts directory")?;

        let mut written = Vec::new();
        for indicator in &report.table.indicators {
            let path = charts_dir.join(chart_file_name(indicator));
            if charts::write_indicator_chart(&path, &report.table, indicator)? {
                written.push((indicator.clone(), path));
            } else {
                debug!(indicator = %indicator, "no values to chart");
            }
        }
        Ok(written)
    }

    /// Write the manifest listing every artifact in `paths`, itself included.
    pub fn save_manifest(&self, report: &PipelineReport, paths: &mut ArtifactPaths) -> Result<()> {
        let path = self.output_dir.join(MANIFEST_JSON);
        paths.manifest = Some(path.clone());
        let manifest = RunManifest::from_report(report, paths.relative_files());
        manifest::write_manifest(&path, &manifest)
    }
}
