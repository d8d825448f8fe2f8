//! Property-based tests for the data pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Pagination is lossless: aggregated records equal the sum of page sizes, in order
//! 2. Merge keys are unique and their count equals the union of input keys
//! 3. Correlation matrices are symmetric with a unit diagonal
//! 4. The rolling mean never leaves the range of the values in its window

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use econlab_core::analytics::{trailing_mean, CorrelationMatrix};
use econlab_core::data::{merge_indicators, DataError, Fetcher, IndicatorQuery, Transport};
use econlab_core::domain::{CanonicalRow, IndicatorSeries, RowKey, YearRange};

// ── Strategies (proptest) ────────────────────────────────────────────

const COUNTRIES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("DE", "Germany"),
    ("BR", "Brazil"),
    ("ZA", "South Africa"),
];

fn arb_row() -> impl Strategy<Value = CanonicalRow> {
    (
        0..COUNTRIES.len(),
        2000..2006i32,
        proptest::option::of(-100.0..100.0_f64),
    )
        .prop_map(|(c, year, value)| CanonicalRow {
            country_code: COUNTRIES[c].0.into(),
            country: COUNTRIES[c].1.into(),
            year,
            value,
            indicator_code: "X".into(),
        })
}

fn arb_series() -> impl Strategy<Value = IndicatorSeries> {
    proptest::collection::vec(arb_row(), 0..20).prop_map(|rows| IndicatorSeries {
        indicator_code: "X".into(),
        rows,
    })
}

/// Replays one payload per page.
struct PagedTransport {
    pages: Mutex<Vec<Value>>,
}

impl Transport for PagedTransport {
    fn get_json(&self, _url: &str, _query: &[(String, String)]) -> Result<Value, DataError> {
        Ok(self.pages.lock().unwrap().remove(0))
    }
}

// ── 1. Pagination ────────────────────────────────────────────────────

proptest! {
    /// The concatenated records are every page's records, in page order.
    #[test]
    fn pagination_is_lossless(page_sizes in proptest::collection::vec(0usize..5, 1..6)) {
        let total = page_sizes.len();
        let mut next_id = 0u32;
        let mut pages = Vec::new();
        for size in &page_sizes {
            let records: Vec<Value> = (0..*size)
                .map(|_| {
                    next_id += 1;
                    json!({"country": {"id": "US", "value": "United States"}, "date": "2000", "value": next_id})
                })
                .collect();
            pages.push(json!([{"pages": total}, records]));
        }

        let transport = PagedTransport { pages: Mutex::new(pages) };
        let query = IndicatorQuery {
            indicator_code: "X".into(),
            countries: vec!["US".into()],
            years: YearRange::new(2000, 2000),
            per_page: 5,
        };
        let fetched = Fetcher::new(&transport)
            .with_page_delay(Duration::ZERO)
            .fetch_records(&query)
            .unwrap();

        prop_assert_eq!(fetched.records.len(), page_sizes.iter().sum::<usize>());
        prop_assert_eq!(&fetched.page_counts, &page_sizes);
        let ids: Vec<u64> = fetched.records.iter().map(|r| r["value"].as_u64().unwrap()).collect();
        let expected: Vec<u64> = (1..=next_id as u64).collect();
        prop_assert_eq!(ids, expected);
    }
}

// ── 2. Merge keys ────────────────────────────────────────────────────

proptest! {
    /// Every key appears exactly once and the row count is the key union.
    #[test]
    fn merge_keys_unique_and_complete(
        a in arb_series(),
        b in arb_series(),
        c in arb_series(),
    ) {
        let union: HashSet<RowKey> = [&a, &b, &c]
            .iter()
            .flat_map(|s| s.rows.iter())
            .map(|r| RowKey::new(&r.country, &r.country_code, r.year))
            .collect();

        let table = merge_indicators(&[
            ("a".into(), a),
            ("b".into(), b),
            ("c".into(), c),
        ]);

        let keys: HashSet<RowKey> = table.rows.iter().map(|r| r.key.clone()).collect();
        prop_assert_eq!(keys.len(), table.len());
        prop_assert_eq!(table.len(), union.len());
        prop_assert_eq!(keys, union);

        for w in table.rows.windows(2) {
            prop_assert!(w[0].key < w[1].key);
        }
    }
}

// ── 3. Correlation symmetry ──────────────────────────────────────────

proptest! {
    #[test]
    fn correlation_symmetric_unit_diagonal(
        cases in proptest::collection::vec(proptest::collection::vec(-1e3..1e3_f64, 3), 0..12)
    ) {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let m = CorrelationMatrix::from_complete_cases(names.clone(), &cases);
        for x in &names {
            prop_assert_eq!(m.get(x, x), Some(1.0));
            for y in &names {
                prop_assert_eq!(m.get(x, y), m.get(y, x));
                if let Some(r) = m.get(x, y) {
                    prop_assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
    }
}

// ── 4. Rolling mean bounds ───────────────────────────────────────────

proptest! {
    #[test]
    fn rolling_mean_within_window_bounds(
        values in proptest::collection::vec(proptest::option::of(-1e6..1e6_f64), 0..30)
    ) {
        let out = trailing_mean(&values, 3);
        prop_assert_eq!(out.len(), values.len());
        for (i, avg) in out.iter().enumerate() {
            let start = (i + 1).saturating_sub(3);
            let window: Vec<f64> = values[start..=i].iter().filter_map(|v| *v).collect();
            match avg {
                None => prop_assert!(window.is_empty()),
                Some(avg) => {
                    let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
                    let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    prop_assert!(*avg >= lo - 1e-6 && *avg <= hi + 1e-6);
                }
            }
        }
    }
}
