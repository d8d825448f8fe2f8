//! Per-country summary metrics over the wide table.
//!
//! Every metric is computed from one country's rows sorted by year. The
//! rolling average is computed per country into a keyed map and folded back
//! into the table, so no positional alignment is involved.

use super::growth::cagr;
use super::rolling::trailing_mean;
use crate::domain::{RowKey, WideRow, WideTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_ROLLING_WINDOW: usize = 3;

/// Summary statistics for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMetrics {
    pub country: String,
    pub country_code: String,
    /// Number of wide-table rows for this country.
    pub years_observed: usize,
    /// CAGR of the growth indicator over the observed span.
    pub growth_rate: Option<f64>,
    pub latest_year: i32,
    /// Value of each indicator at `latest_year`, in table column order.
    pub latest: Vec<(String, Option<f64>)>,
}

impl CountryMetrics {
    pub fn latest_value(&self, indicator: &str) -> Option<f64> {
        self.latest
            .iter()
            .find(|(name, _)| name == indicator)
            .and_then(|(_, v)| *v)
    }
}

/// Result of running the metrics engine over a table.
#[derive(Debug, Clone)]
pub struct MetricsOutput {
    pub metrics: Vec<CountryMetrics>,
    /// The input table with the rolling-average column folded in.
    pub table: WideTable,
}

/// Growth, snapshot and rolling-average computation for one target indicator.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    growth_indicator: String,
    window: usize,
}

impl MetricsEngine {
    pub fn new(growth_indicator: impl Into<String>, window: usize) -> Self {
        Self {
            growth_indicator: growth_indicator.into(),
            window: window.max(1),
        }
    }

    pub fn growth_indicator(&self) -> &str {
        &self.growth_indicator
    }

    /// Name of the derived column, e.g. `GDP_per_capita_3yr_roll`.
    pub fn rolling_column(&self) -> String {
        format!("{}_{}yr_roll", self.growth_indicator, self.window)
    }

    /// Per-country metrics, in table country order.
    pub fn country_metrics(&self, table: &WideTable) -> Vec<CountryMetrics> {
        table
            .by_country()
            .into_iter()
            .filter_map(|(country, rows)| self.metrics_for(table, country, &rows))
            .collect()
    }

    fn metrics_for(&self, table: &WideTable, country: &str, rows: &[&WideRow]) -> Option<CountryMetrics> {
        let latest_row = rows.iter().max_by_key(|r| r.year())?;

        let points: Vec<(i32, Option<f64>)> = rows
            .iter()
            .map(|r| (r.year(), table.value(r, &self.growth_indicator)))
            .collect();

        let latest = table
            .indicators
            .iter()
            .map(|name| (name.clone(), table.value(latest_row, name)))
            .collect();

        Some(CountryMetrics {
            country: country.to_string(),
            country_code: rows[0].country_code().to_string(),
            years_observed: rows.len(),
            growth_rate: cagr(&points),
            latest_year: latest_row.year(),
            latest,
        })
    }

    /// Trailing rolling mean of the growth indicator, keyed by row.
    ///
    /// Keys with no value in the window are absent from the map.
    pub fn rolling_average(&self, table: &WideTable) -> HashMap<RowKey, f64> {
        let mut out = HashMap::new();
        for (_, rows) in table.by_country() {
            let series: Vec<Option<f64>> = rows
                .iter()
                .map(|r| table.value(r, &self.growth_indicator))
                .collect();
            for (row, avg) in rows.iter().zip(trailing_mean(&series, self.window)) {
                if let Some(avg) = avg {
                    out.insert(row.key.clone(), avg);
                }
            }
        }
        out
    }

    /// Compute metrics and fold the rolling column into the table.
    pub fn apply(&self, table: WideTable) -> MetricsOutput {
        let metrics = self.country_metrics(&table);
        let rolling = self.rolling_average(&table);
        let table = table.with_derived_column(&self.rolling_column(), &rolling);
        MetricsOutput { metrics, table }
    }
}
