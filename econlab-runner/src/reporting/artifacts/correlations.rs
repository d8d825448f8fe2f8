//! Correlation exports (CSV): one row per country, and the overall matrix.

use anyhow::{Context, Result};
use econlab_core::analytics::{CorrelationMatrix, CountryCorrelation};
use std::path::Path;

use crate::reporting::csv_cell;

/// `country, <a>_<b>_corr` for each indicator pair, upper triangle order.
pub fn write_country_correlations_csv(
    path: &Path,
    indicators: &[String],
    rows: &[CountryCorrelation],
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create correlations CSV {}", path.display()))?;

    let mut header = vec!["country".to_string()];
    for i in 0..indicators.len() {
        for j in (i + 1)..indicators.len() {
            header.push(CorrelationMatrix::pair_column(&indicators[i], &indicators[j]));
        }
    }
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.country.clone()];
        record.extend(row.matrix.pairs().into_iter().map(|(_, _, r)| csv_cell(r)));
        wtr.write_record(&record)?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush correlations CSV {}", path.display()))?;
    Ok(())
}

/// Square indicator × indicator table; first column is `indicator`.
pub fn write_overall_correlation_csv(path: &Path, matrix: &CorrelationMatrix) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create correlation CSV {}", path.display()))?;

    let mut header = vec!["indicator".to_string()];
    header.extend(matrix.indicators.iter().cloned());
    wtr.write_record(&header)?;

    for (i, name) in matrix.indicators.iter().enumerate() {
        let mut record = vec![name.clone()];
        record.extend(matrix.row(i).iter().map(|r| csv_cell(*r)));
        wtr.write_record(&record)?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush correlation CSV {}", path.display()))?;
    Ok(())
}
