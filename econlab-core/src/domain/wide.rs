//! The wide table: one row per (country, year), one column per indicator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Join key of the wide table.
///
/// Field order drives the derived ordering: country name, then year, then
/// country code as a tie-breaker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub country: String,
    pub year: i32,
    pub country_code: String,
}

impl RowKey {
    pub fn new(country: impl Into<String>, country_code: impl Into<String>, year: i32) -> Self {
        Self {
            country: country.into(),
            year,
            country_code: country_code.into(),
        }
    }
}

/// A single row of the wide table.
///
/// `values` is aligned with [`WideTable::indicators`], `derived` with
/// [`WideTable::derived`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub key: RowKey,
    pub values: Vec<Option<f64>>,
    pub derived: Vec<Option<f64>>,
}

impl WideRow {
    pub fn country(&self) -> &str {
        &self.key.country
    }

    pub fn country_code(&self) -> &str {
        &self.key.country_code
    }

    pub fn year(&self) -> i32 {
        self.key.year
    }
}

/// Merged per-country/per-year dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WideTable {
    pub indicators: Vec<String>,
    pub derived: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    pub fn new(indicators: Vec<String>) -> Self {
        Self {
            indicators,
            derived: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All column names after the key columns: indicators first, then derived.
    pub fn value_columns(&self) -> Vec<&str> {
        self.indicators
            .iter()
            .chain(self.derived.iter())
            .map(|s| s.as_str())
            .collect()
    }

    pub fn indicator_index(&self, name: &str) -> Option<usize> {
        self.indicators.iter().position(|c| c == name)
    }

    /// Value of a named column (indicator or derived) in `row`.
    pub fn value(&self, row: &WideRow, column: &str) -> Option<f64> {
        if let Some(i) = self.indicator_index(column) {
            return row.values.get(i).copied().flatten();
        }
        let i = self.derived.iter().position(|c| c == column)?;
        row.derived.get(i).copied().flatten()
    }

    /// Entire column in row order.
    pub fn column(&self, column: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| self.value(r, column)).collect()
    }

    /// Distinct country names in table order.
    pub fn countries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !out.contains(&row.country()) {
                out.push(row.country());
            }
        }
        out
    }

    /// Rows grouped by country name, each group sorted by year.
    pub fn by_country(&self) -> Vec<(&str, Vec<&WideRow>)> {
        let mut groups: Vec<(&str, Vec<&WideRow>)> = Vec::new();
        for row in &self.rows {
            match groups.iter().position(|(c, _)| *c == row.country()) {
                Some(i) => groups[i].1.push(row),
                None => groups.push((row.country(), vec![row])),
            }
        }
        for (_, rows) in groups.iter_mut() {
            rows.sort_by_key(|r| r.year());
        }
        groups
    }

    /// Return a copy of the table with a derived column folded in by key.
    ///
    /// Rows whose key is absent from `values` get a missing cell. If the
    /// column already exists it is replaced.
    pub fn with_derived_column(mut self, name: &str, values: &HashMap<RowKey, f64>) -> Self {
        let slot = match self.derived.iter().position(|c| c == name) {
            Some(i) => i,
            None => {
                self.derived.push(name.to_string());
                for row in self.rows.iter_mut() {
                    row.derived.push(None);
                }
                self.derived.len() - 1
            }
        };
        for row in self.rows.iter_mut() {
            row.derived[slot] = values.get(&row.key).copied();
        }
        self
    }
}
