//! Reporting and artifact export pipeline.

pub mod artifacts;
pub mod reports;
pub mod export;

pub use artifacts::{ArtifactManager, ArtifactPaths};
pub use export::export_run_with_report;
pub use reports::{MarkdownReportGenerator, SummaryTable};

/// Format an optional number for a text cell; missing renders as `-`.
pub(crate) fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

/// Format an optional number for a CSV cell; missing renders empty.
pub(crate) fn csv_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
