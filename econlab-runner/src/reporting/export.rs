//! Export orchestrator for artifacts and reports.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::pipeline::PipelineReport;
use crate::reporting::artifacts::{ArtifactManager, ArtifactPaths, CHARTS_DIR, REPORT_MD};
use crate::reporting::reports::MarkdownReportGenerator;

/// Write every artifact, then the Markdown report, then the manifest.
pub fn export_run_with_report(output_dir: impl AsRef<Path>, report: &PipelineReport) -> Result<ArtifactPaths> {
    let manager = ArtifactManager::new(output_dir)?;
    let mut paths = manager.save_report(report)?;

    let dashboard_chart = report
        .table
        .indicators
        .first()
        .and_then(|first| paths.charts.iter().find(|(name, _)| name == first))
        .and_then(|(_, path)| path.file_name())
        .map(|name| format!("{CHARTS_DIR}/{}", name.to_string_lossy()));

    let report_path = manager.output_dir().join(REPORT_MD);
    let markdown = MarkdownReportGenerator.generate(report, dashboard_chart.as_deref());
    std::fs::write(&report_path, markdown)
        .with_context(|| format!("Failed to write report {}", report_path.display()))?;
    paths.report_markdown = Some(report_path);

    manager.save_manifest(report, &mut paths)?;
    info!(
        dir = %manager.output_dir().display(),
        files = paths.relative_files().len(),
        "export complete"
    );
    Ok(paths)
}
