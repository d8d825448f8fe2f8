//! Canonical long-format indicator rows.

use serde::{Deserialize, Serialize};

/// Inclusive range of calendar years requested from the indicator API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// The `date` query parameter understood by the API, e.g. `2000:2024`.
    pub fn as_query(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

/// One observation of one indicator for one country and year.
///
/// `value` is `None` when the API reported null or something that does not
/// parse as a number. It is never a raw string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub country_code: String,
    pub country: String,
    pub year: i32,
    pub value: Option<f64>,
    pub indicator_code: String,
}

/// All canonical rows fetched for a single indicator code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub indicator_code: String,
    pub rows: Vec<CanonicalRow>,
}

impl IndicatorSeries {
    /// A typed-empty series: zero rows, but the indicator code is still known.
    pub fn empty(indicator_code: impl Into<String>) -> Self {
        Self {
            indicator_code: indicator_code.into(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows carrying an actual numeric value.
    pub fn present_count(&self) -> usize {
        self.rows.iter().filter(|r| r.value.is_some()).count()
    }
}
