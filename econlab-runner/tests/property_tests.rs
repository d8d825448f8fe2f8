//! Property-based tests for summary ranking and the dataset hash.
//!
//! Uses proptest to verify:
//! 1. The summary ranks present values descending, missing values last
//! 2. The ranking is a total order independent of input order
//! 3. The dataset hash is deterministic and sensitive to cell changes

use econlab_core::analytics::CountryMetrics;
use econlab_core::domain::{RowKey, WideRow, WideTable};
use econlab_runner::reporting::artifacts::compute_dataset_hash;
use econlab_runner::reporting::SummaryTable;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

const RANK_BY: &str = "GDP_per_capita";

fn arb_metrics() -> impl Strategy<Value = Vec<CountryMetrics>> {
    proptest::collection::vec(proptest::option::of(-1e6..1e6_f64), 0..12).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| CountryMetrics {
                country: format!("Country {i:02}"),
                country_code: format!("C{i}"),
                years_observed: 1,
                growth_rate: None,
                latest_year: 2020,
                latest: vec![(RANK_BY.to_string(), v)],
            })
            .collect()
    })
}

fn arb_table() -> impl Strategy<Value = WideTable> {
    proptest::collection::vec(
        (2000..2010i32, proptest::option::of(-1e3..1e3_f64)),
        1..10,
    )
    .prop_map(|cells| {
        let mut table = WideTable::new(vec![RANK_BY.to_string()]);
        for (i, (year, value)) in cells.into_iter().enumerate() {
            table.rows.push(WideRow {
                key: RowKey::new(format!("Country {i}"), format!("C{i}"), year),
                values: vec![value],
                derived: Vec::new(),
            });
        }
        table
    })
}

// ── 1-2. Summary ranking ─────────────────────────────────────────────

proptest! {
    #[test]
    fn ranking_is_descending_with_missing_last(metrics in arb_metrics()) {
        let table = SummaryTable::new(&metrics, RANK_BY, vec![RANK_BY.to_string()]);
        prop_assert_eq!(table.rows.len(), metrics.len());

        let ranked: Vec<Option<f64>> =
            table.rows.iter().map(|m| m.latest_value(RANK_BY)).collect();
        let first_missing = ranked.iter().position(Option::is_none).unwrap_or(ranked.len());
        prop_assert!(ranked[first_missing..].iter().all(Option::is_none));

        let present: Vec<f64> = ranked[..first_missing].iter().map(|v| v.unwrap()).collect();
        for pair in present.windows(2) {
            prop_assert!(pair[0] >= pair[1], "{} before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn ranking_ignores_input_order(metrics in arb_metrics()) {
        let forward_table = SummaryTable::new(&metrics, RANK_BY, Vec::new());
        let forward = forward_table.countries();
        let mut reversed_input = metrics.clone();
        reversed_input.reverse();
        let reversed_table = SummaryTable::new(&reversed_input, RANK_BY, Vec::new());
        let reversed = reversed_table.countries();
        prop_assert_eq!(forward, reversed);
    }
}

// ── 3. Dataset hash ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn dataset_hash_is_deterministic(table in arb_table()) {
        let a = compute_dataset_hash(&table);
        let b = compute_dataset_hash(&table.clone());
        prop_assert_eq!(a.len(), 64);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn dataset_hash_changes_with_a_cell(table in arb_table(), row in 0usize..10) {
        let row = row % table.rows.len();
        let mut changed = table.clone();
        changed.rows[row].values[0] = match changed.rows[row].values[0] {
            Some(v) => Some(v + 1.0),
            None => Some(0.0),
        };
        prop_assert_ne!(compute_dataset_hash(&table), compute_dataset_hash(&changed));
    }
}
