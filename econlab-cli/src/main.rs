//! EconLab CLI: indicator pipeline, single-indicator fetch, default config.
//!
//! Commands:
//! - `run`: fetch every configured indicator, analyze, export artifacts
//! - `fetch`: fetch one indicator code and write canonical rows as CSV to stdout
//! - `config`: print the default configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use econlab_core::data::{HttpTransport, IndicatorQuery, StdoutProgress};
use econlab_core::domain::YearRange;
use econlab_runner::reporting::reports::render_matrix_text;
use econlab_runner::{build_fetcher, run_pipeline, PipelineConfig, RunOutcome, SummaryTable};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "econlab",
    version,
    about = "EconLab CLI: World Bank indicator comparison pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write artifacts.
    Run {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (overrides `output.dir`).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// First year (overrides `dataset.start_year`).
        #[arg(long)]
        start: Option<i32>,

        /// Last year (overrides `dataset.end_year`).
        #[arg(long)]
        end: Option<i32>,

        /// Skip SVG chart generation.
        #[arg(long, default_value_t = false)]
        no_charts: bool,
    },
    /// Fetch one indicator and print canonical rows as CSV.
    Fetch {
        /// Indicator code, e.g. NY.GDP.PCAP.CD.
        indicator: String,

        /// Comma-separated country codes.
        #[arg(long, value_delimiter = ',', default_value = "US,CN,IN,BR,DE,ZA")]
        countries: Vec<String>,

        #[arg(long, default_value_t = 2000)]
        start: i32,

        #[arg(long, default_value_t = 2024)]
        end: i32,

        #[arg(long, default_value_t = 20_000)]
        per_page: u32,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            start,
            end,
            no_charts,
        } => run_cmd(config, output_dir, start, end, no_charts),
        Commands::Fetch {
            indicator,
            countries,
            start,
            end,
            per_page,
        } => fetch_cmd(indicator, countries, start, end, per_page),
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

/// Logs go to stderr so `fetch` output on stdout stays clean CSV.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_cmd(
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    start: Option<i32>,
    end: Option<i32>,
    no_charts: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if let Some(start) = start {
        config.dataset.start_year = start;
    }
    if let Some(end) = end {
        config.dataset.end_year = end;
    }
    if no_charts {
        config.output.charts = false;
    }
    config.validate()?;

    info!(
        countries = config.dataset.countries.len(),
        indicators = config.dataset.indicators.len(),
        start = config.dataset.start_year,
        end = config.dataset.end_year,
        "starting pipeline"
    );

    let transport = HttpTransport::new(config.transport_config())?;
    let fetcher = build_fetcher(&config, &transport);

    match run_pipeline(&config, &fetcher, Some(&StdoutProgress))? {
        RunOutcome::NoData { .. } => {
            println!("No data fetched. Check indicator codes, countries and years.");
        }
        RunOutcome::Exported { report, artifacts } => {
            println!();
            println!("=== Top-level summary (by latest {}) ===", report.growth_indicator);
            print!("{}", SummaryTable::from_report(&report).render_text());
            println!();
            println!(
                "=== Overall correlation ({} complete rows) ===",
                report.overall_correlation.observations
            );
            print!("{}", render_matrix_text(&report.overall_correlation));
            println!();
            println!("Artifacts saved to: {}", artifacts.output_dir.display());
        }
    }

    Ok(())
}

fn fetch_cmd(
    indicator: String,
    countries: Vec<String>,
    start: i32,
    end: i32,
    per_page: u32,
) -> Result<()> {
    if start > end {
        bail!("--start {start} is after --end {end}");
    }
    if countries.is_empty() {
        bail!("at least one country is required");
    }

    let config = PipelineConfig::default();
    let transport = HttpTransport::new(config.transport_config())?;
    let fetcher = build_fetcher(&config, &transport);
    let query = IndicatorQuery {
        indicator_code: indicator.clone(),
        countries,
        years: YearRange::new(start, end),
        per_page: per_page.max(1),
    };
    let series = fetcher
        .fetch_series(&query)
        .with_context(|| format!("failed to fetch {indicator}"))?;

    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    wtr.write_record(["country_code", "country", "year", "value", "indicator_code"])?;
    for row in &series.rows {
        let year = row.year.to_string();
        let value = row.value.map(|v| v.to_string()).unwrap_or_default();
        wtr.write_record([
            row.country_code.as_str(),
            row.country.as_str(),
            year.as_str(),
            value.as_str(),
            row.indicator_code.as_str(),
        ])?;
    }
    wtr.flush()?;

    info!(indicator = %indicator, rows = series.len(), "fetch complete");
    Ok(())
}
