//! Flatten raw API records into canonical rows.
//!
//! Value parsing is lenient (anything non-numeric becomes missing), year
//! parsing is strict (a date that is not an integer is a schema error).

use super::provider::DataError;
use crate::domain::{CanonicalRow, IndicatorSeries, YearRange};
use serde_json::Value;
use tracing::debug;

/// Normalizer for one run's configured year range.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    years: YearRange,
}

impl Normalizer {
    pub fn new(years: YearRange) -> Self {
        Self { years }
    }

    /// Convert raw records for `indicator_code` into an [`IndicatorSeries`].
    ///
    /// Rows outside the configured year range are dropped. Empty input gives
    /// a typed-empty series.
    pub fn normalize(
        &self,
        indicator_code: &str,
        records: &[Value],
    ) -> Result<IndicatorSeries, DataError> {
        let mut rows = Vec::with_capacity(records.len());
        let mut out_of_range = 0usize;

        for (i, rec) in records.iter().enumerate() {
            let year = parse_year(&rec["date"]).ok_or_else(|| {
                DataError::Schema(format!(
                    "indicator {indicator_code}: record {i} has non-integer date {}",
                    rec["date"]
                ))
            })?;

            if !self.years.contains(year) {
                out_of_range += 1;
                continue;
            }

            let country_code = match rec["country"]["id"].as_str() {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => rec["countryiso3code"].as_str().unwrap_or_default().to_string(),
            };

            rows.push(CanonicalRow {
                country_code,
                country: rec["country"]["value"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                year,
                value: parse_value(&rec["value"]),
                indicator_code: rec["indicator"]["id"]
                    .as_str()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(indicator_code)
                    .to_string(),
            });
        }

        if out_of_range > 0 {
            debug!(indicator = indicator_code, out_of_range, "dropped rows outside year range");
        }

        Ok(IndicatorSeries {
            indicator_code: indicator_code.to_string(),
            rows,
        })
    }
}

/// Numeric value or missing. Never fails.
pub fn parse_value(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|x| x.is_finite())
}

/// Integer year, or `None` if the field cannot be read as one.
pub fn parse_year(v: &Value) -> Option<i32> {
    match v {
        Value::String(s) => s.trim().parse::<i32>().ok(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                let f = n.as_f64()?;
                (f.fract() == 0.0 && f.abs() < i32::MAX as f64).then_some(f as i32)
            }
        }
        _ => None,
    }
}
