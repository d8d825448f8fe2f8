//! Multi-indicator outer join.
//!
//! Given canonical rows for several indicators, build one wide table keyed by
//! (country, country_code, year). Every key present in any non-empty series
//! gets a row; indicators without a value for that key get a missing cell.

use crate::domain::{IndicatorSeries, RowKey, WideRow, WideTable};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Outer-join named series into a wide table sorted by country, then year.
///
/// The column set is every configured name, in the given order, including
/// names whose series came back empty. Within one series the first row for
/// a key wins.
pub fn merge_indicators(series: &[(String, IndicatorSeries)]) -> WideTable {
    let names: Vec<String> = series.iter().map(|(name, _)| name.clone()).collect();
    let width = names.len();
    let mut merged: BTreeMap<RowKey, Vec<Option<f64>>> = BTreeMap::new();

    for (col, (name, s)) in series.iter().enumerate() {
        if s.is_empty() {
            debug!(indicator = %name, "skipping empty series");
            continue;
        }

        let mut seen: HashSet<RowKey> = HashSet::with_capacity(s.len());
        for row in &s.rows {
            let key = RowKey::new(&row.country, &row.country_code, row.year);
            if !seen.insert(key.clone()) {
                continue;
            }
            let cells = merged.entry(key).or_insert_with(|| vec![None; width]);
            cells[col] = row.value;
        }
    }

    let rows = merged
        .into_iter()
        .map(|(key, values)| WideRow {
            key,
            values,
            derived: Vec::new(),
        })
        .collect::<Vec<_>>();

    debug!(rows = rows.len(), columns = width, "merged wide table");

    WideTable {
        indicators: names,
        derived: Vec::new(),
        rows,
    }
}
