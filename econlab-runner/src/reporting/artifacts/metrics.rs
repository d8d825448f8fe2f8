//! Country summary metrics export (CSV).

use anyhow::{Context, Result};
use econlab_core::analytics::CountryMetrics;
use std::path::Path;

use crate::reporting::csv_cell;

/// `country, years_observed, growth_rate, <indicator>_latest..., latest_year`
pub fn metrics_header(indicators: &[String]) -> Vec<String> {
    let mut header = vec![
        "country".to_string(),
        "years_observed".to_string(),
        "growth_rate".to_string(),
    ];
    header.extend(indicators.iter().map(|name| format!("{name}_latest")));
    header.push("latest_year".to_string());
    header
}

pub fn write_metrics_csv(path: &Path, metrics: &[CountryMetrics], indicators: &[String]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create metrics CSV {}", path.display()))?;
    wtr.write_record(metrics_header(indicators))?;

    for m in metrics {
        let mut record = vec![
            m.country.clone(),
            m.years_observed.to_string(),
            csv_cell(m.growth_rate),
        ];
        record.extend(indicators.iter().map(|name| csv_cell(m.latest_value(name))));
        record.push(m.latest_year.to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush metrics CSV {}", path.display()))?;
    Ok(())
}
