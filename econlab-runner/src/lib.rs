//! EconLab Runner: configuration, pipeline orchestration, artifact export.
//!
//! This crate builds on `econlab-core` to provide:
//! - TOML pipeline configuration with defaults and validation
//! - Sequential fetch of every configured indicator
//! - Merge, metrics and correlation stages with an early exit on no data
//! - CSV, Parquet, SVG, Markdown and JSON manifest artifacts
//! - Ranked console summary

pub mod config;
pub mod pipeline;
pub mod reporting;

pub use config::{
    AnalysisConfig, ApiConfig, BackoffKind, ConfigError, DatasetConfig, IndicatorSpec,
    OutputConfig, PipelineConfig,
};
pub use pipeline::{
    analyze, build_fetcher, fetch_all, run_pipeline, FetchSummary, FetchedIndicator,
    PipelineError, PipelineOutcome, PipelineReport, RunOutcome,
};
pub use reporting::{
    export_run_with_report, ArtifactManager, ArtifactPaths, MarkdownReportGenerator, SummaryTable,
};
