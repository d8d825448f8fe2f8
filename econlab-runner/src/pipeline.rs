//! Pipeline orchestration: fetch → normalize → merge → metrics/correlation → export.
//!
//! Three entry points:
//! - `fetch_all()`: every configured indicator through the fetcher, strictly in order.
//! - `analyze()`: pure stage over already-fetched series; no I/O.
//! - `run_pipeline()`: both of the above plus artifact export. Used by the CLI.

use econlab_core::analytics::{
    CorrelationEngine, CorrelationMatrix, CountryCorrelation, CountryMetrics, MetricsEngine,
};
use econlab_core::data::{
    merge_indicators, DataError, FetchProgress, Fetcher, IndicatorQuery, Transport,
};
use econlab_core::domain::{IndicatorSeries, WideTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, IndicatorSpec, PipelineConfig};
use crate::reporting::export::export_run_with_report;
use crate::reporting::ArtifactPaths;

/// Errors from the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to fetch {name} ({code}): {source}")]
    Fetch {
        name: String,
        code: String,
        #[source]
        source: DataError,
    },
    #[error(transparent)]
    Export(#[from] anyhow::Error),
}

/// Row counts for one fetched indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub name: String,
    pub code: String,
    /// Canonical rows after normalization.
    pub rows: usize,
    /// Rows with an actual value.
    pub present: usize,
}

/// A fetched indicator: its configured spec and canonical rows.
#[derive(Debug, Clone)]
pub struct FetchedIndicator {
    pub spec: IndicatorSpec,
    pub series: IndicatorSeries,
}

impl FetchedIndicator {
    pub fn summary(&self) -> FetchSummary {
        FetchSummary {
            name: self.spec.name.clone(),
            code: self.spec.code.clone(),
            rows: self.series.len(),
            present: self.series.present_count(),
        }
    }
}

/// Everything the exporter and console summary consume.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub config: PipelineConfig,
    pub fetched: Vec<FetchSummary>,
    /// Wide table with the rolling-average column folded in.
    pub table: WideTable,
    pub metrics: Vec<CountryMetrics>,
    pub growth_indicator: String,
    pub rolling_column: String,
    pub correlation_indicators: Vec<String>,
    pub country_correlations: Vec<CountryCorrelation>,
    pub overall_correlation: CorrelationMatrix,
}

/// Result of the analysis stage.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Every indicator came back empty; nothing to report.
    NoData { fetched: Vec<FetchSummary> },
    Completed(Box<PipelineReport>),
}

/// A finished run: either nothing to report, or the report and where it was written.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    NoData { fetched: Vec<FetchSummary> },
    Exported {
        report: Box<PipelineReport>,
        artifacts: ArtifactPaths,
    },
}

/// Fetcher configured from the `[api]` section.
pub fn build_fetcher<'a>(config: &PipelineConfig, transport: &'a dyn Transport) -> Fetcher<'a> {
    Fetcher::new(transport).with_base_url(config.api.base_url.clone())
}

/// Fetch and normalize every configured indicator, in configuration order.
///
/// The first failure aborts the run; no partial result is returned.
pub fn fetch_all(
    config: &PipelineConfig,
    fetcher: &Fetcher<'_>,
    progress: Option<&dyn FetchProgress>,
) -> Result<Vec<FetchedIndicator>, PipelineError> {
    let total = config.dataset.indicators.len();
    let mut out = Vec::with_capacity(total);

    for (i, spec) in config.dataset.indicators.iter().enumerate() {
        if let Some(p) = progress {
            p.on_start(&spec.name, &spec.code, i, total);
        }

        let query = IndicatorQuery {
            indicator_code: spec.code.clone(),
            countries: config.dataset.countries.clone(),
            years: config.year_range(),
            per_page: config.api.per_page,
        };

        match fetcher.fetch_series(&query) {
            Ok(series) => {
                if let Some(p) = progress {
                    p.on_complete(&spec.name, i, total, Ok(series.len()));
                }
                out.push(FetchedIndicator {
                    spec: spec.clone(),
                    series,
                });
            }
            Err(source) => {
                if let Some(p) = progress {
                    p.on_complete(&spec.name, i, total, Err(&source));
                }
                return Err(PipelineError::Fetch {
                    name: spec.name.clone(),
                    code: spec.code.clone(),
                    source,
                });
            }
        }
    }

    Ok(out)
}

/// Merge fetched series and derive metrics and correlations. No I/O.
pub fn analyze(config: &PipelineConfig, fetched: Vec<FetchedIndicator>) -> PipelineOutcome {
    let summaries: Vec<FetchSummary> = fetched.iter().map(FetchedIndicator::summary).collect();
    let named: Vec<(String, IndicatorSeries)> = fetched
        .into_iter()
        .map(|f| (f.spec.name, f.series))
        .collect();

    let table = merge_indicators(&named);
    info!(rows = table.len(), countries = table.countries().len(), "merged wide table");
    if table.is_empty() {
        return PipelineOutcome::NoData { fetched: summaries };
    }

    let engine = MetricsEngine::new(config.growth_indicator(), config.analysis.rolling_window);
    let rolling_column = engine.rolling_column();
    let out = engine.apply(table);

    let correlation_indicators = config.correlation_indicators();
    let correlations = CorrelationEngine::new(correlation_indicators.clone());
    let country_correlations = correlations.per_country(&out.table);
    let overall_correlation = correlations.global(&out.table);
    info!(
        countries = out.metrics.len(),
        country_matrices = country_correlations.len(),
        complete_cases = overall_correlation.observations,
        "computed metrics and correlations"
    );

    PipelineOutcome::Completed(Box::new(PipelineReport {
        config: config.clone(),
        fetched: summaries,
        table: out.table,
        metrics: out.metrics,
        growth_indicator: engine.growth_indicator().to_string(),
        rolling_column,
        correlation_indicators,
        country_correlations,
        overall_correlation,
    }))
}

/// Run the whole pipeline and export artifacts to `config.output.dir`.
pub fn run_pipeline(
    config: &PipelineConfig,
    fetcher: &Fetcher<'_>,
    progress: Option<&dyn FetchProgress>,
) -> Result<RunOutcome, PipelineError> {
    config.validate()?;
    let fetched = fetch_all(config, fetcher, progress)?;

    match analyze(config, fetched) {
        PipelineOutcome::NoData { fetched } => Ok(RunOutcome::NoData { fetched }),
        PipelineOutcome::Completed(report) => {
            let artifacts = export_run_with_report(&config.output.dir, &report)?;
            Ok(RunOutcome::Exported { report, artifacts })
        }
    }
}
