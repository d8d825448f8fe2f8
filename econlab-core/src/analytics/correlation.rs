//! Pearson correlation among indicators, per country and across the dataset.
//!
//! Only complete cases take part: rows where every indicator in the set is
//! present.

use crate::domain::{WideRow, WideTable};
use serde::{Deserialize, Serialize};

/// Minimum complete-case rows before a per-country matrix is reported.
pub const MIN_COUNTRY_ROWS: usize = 3;

/// Pearson correlation coefficient.
///
/// `None` with fewer than two pairs or when either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    if is_constant(xs) || is_constant(ys) {
        return None;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Symmetric indicator × indicator correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub indicators: Vec<String>,
    /// Complete-case rows the coefficients were computed from.
    pub observations: usize,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Build from complete-case rows; each inner vec is aligned with `indicators`.
    pub fn from_complete_cases(indicators: Vec<String>, cases: &[Vec<f64>]) -> Self {
        let k = indicators.len();
        let columns: Vec<Vec<f64>> = (0..k)
            .map(|j| cases.iter().map(|row| row[j]).collect())
            .collect();

        let mut values = vec![vec![None; k]; k];
        for i in 0..k {
            values[i][i] = Some(1.0);
            for j in (i + 1)..k {
                let r = pearson(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Self {
            indicators,
            observations: cases.len(),
            values,
        }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.indicators.iter().position(|n| n == a)?;
        let j = self.indicators.iter().position(|n| n == b)?;
        self.values[i][j]
    }

    /// Row `i` of the matrix, aligned with `indicators`.
    pub fn row(&self, i: usize) -> &[Option<f64>] {
        &self.values[i]
    }

    /// Upper-triangle pairs in indicator order: (0,1), (0,2), (1,2), ...
    pub fn pairs(&self) -> Vec<(&str, &str, Option<f64>)> {
        let k = self.indicators.len();
        let mut out = Vec::with_capacity(k * k.saturating_sub(1) / 2);
        for i in 0..k {
            for j in (i + 1)..k {
                out.push((
                    self.indicators[i].as_str(),
                    self.indicators[j].as_str(),
                    self.values[i][j],
                ));
            }
        }
        out
    }

    /// Export column name for a pair, e.g. `gdp_unemp_corr`.
    pub fn pair_column(a: &str, b: &str) -> String {
        format!("{a}_{b}_corr")
    }
}

/// Correlation matrix for a single country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCorrelation {
    pub country: String,
    pub matrix: CorrelationMatrix,
}

/// Correlation among a fixed set of indicators.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    indicators: Vec<String>,
    min_country_rows: usize,
}

impl CorrelationEngine {
    pub fn new(indicators: Vec<String>) -> Self {
        Self {
            indicators,
            min_country_rows: MIN_COUNTRY_ROWS,
        }
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Pair column names in export order.
    pub fn pair_columns(&self) -> Vec<String> {
        let k = self.indicators.len();
        let mut out = Vec::new();
        for i in 0..k {
            for j in (i + 1)..k {
                out.push(CorrelationMatrix::pair_column(
                    &self.indicators[i],
                    &self.indicators[j],
                ));
            }
        }
        out
    }

    fn complete_cases<'a>(
        &self,
        table: &WideTable,
        rows: impl IntoIterator<Item = &'a WideRow>,
    ) -> Vec<Vec<f64>> {
        rows.into_iter()
            .filter_map(|row| {
                self.indicators
                    .iter()
                    .map(|name| table.value(row, name))
                    .collect::<Option<Vec<f64>>>()
            })
            .collect()
    }

    /// One matrix per country with at least three complete-case rows.
    pub fn per_country(&self, table: &WideTable) -> Vec<CountryCorrelation> {
        table
            .by_country()
            .into_iter()
            .filter_map(|(country, rows)| {
                let cases = self.complete_cases(table, rows.iter().copied());
                if cases.len() < self.min_country_rows {
                    return None;
                }
                Some(CountryCorrelation {
                    country: country.to_string(),
                    matrix: CorrelationMatrix::from_complete_cases(
                        self.indicators.clone(),
                        &cases,
                    ),
                })
            })
            .collect()
    }

    /// One matrix over every complete-case row in the table, no minimum.
    pub fn global(&self, table: &WideTable) -> CorrelationMatrix {
        let cases = self.complete_cases(table, table.rows.iter());
        CorrelationMatrix::from_complete_cases(self.indicators.clone(), &cases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowKey;

    fn row(country: &str, year: i32, values: [Option<f64>; 3]) -> WideRow {
        WideRow {
            key: RowKey::new(country, &country[..2], year),
            values: values.to_vec(),
            derived: Vec::new(),
        }
    }

    fn names() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn perfect_positive_and_negative() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_undefined() {
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[], &[]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[0.1, 0.1, 0.1], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn small_magnitudes_are_not_degenerate() {
        let xs = [1e-152, 2e-152, 3e-152];
        let ys = [3e-153, 2e-153, 1e-153];
        assert!((pearson(&xs, &xs).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &ys).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let cases = vec![
            vec![1.0, 5.0, 2.0],
            vec![2.0, 3.0, 4.0],
            vec![3.0, 4.0, 7.0],
            vec![4.0, 1.0, 8.0],
        ];
        let m = CorrelationMatrix::from_complete_cases(names(), &cases);
        for a in ["a", "b", "c"] {
            assert_eq!(m.get(a, a), Some(1.0));
            for b in ["a", "b", "c"] {
                assert_eq!(m.get(a, b), m.get(b, a));
            }
        }
        assert_eq!(m.observations, 4);
        let pairs = m.pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].0, pairs[0].1), ("a", "b"));
        assert_eq!((pairs[2].0, pairs[2].1), ("b", "c"));
    }

    #[test]
    fn country_with_too_few_complete_cases_is_skipped() {
        let table = WideTable {
            indicators: names(),
            derived: Vec::new(),
            rows: vec![
                row("Brazil", 2000, [Some(1.0), Some(2.0), Some(3.0)]),
                row("Brazil", 2001, [Some(2.0), Some(1.0), Some(5.0)]),
                row("Brazil", 2002, [Some(3.0), None, Some(6.0)]),
                row("Germany", 2000, [Some(1.0), Some(9.0), Some(2.0)]),
                row("Germany", 2001, [Some(2.0), Some(7.0), Some(4.0)]),
                row("Germany", 2002, [Some(3.0), Some(4.0), Some(5.0)]),
            ],
        };
        let engine = CorrelationEngine::new(names());
        let per_country = engine.per_country(&table);
        assert_eq!(per_country.len(), 1);
        assert_eq!(per_country[0].country, "Germany");
        assert_eq!(per_country[0].matrix.observations, 3);

        let global = engine.global(&table);
        assert_eq!(global.observations, 5);
    }

    #[test]
    fn global_over_empty_table_is_degenerate_not_error() {
        let engine = CorrelationEngine::new(names());
        let m = engine.global(&WideTable::new(names()));
        assert_eq!(m.observations, 0);
        assert_eq!(m.get("a", "b"), None);
        assert_eq!(m.get("a", "a"), Some(1.0));
    }

    #[test]
    fn pair_columns_follow_indicator_order() {
        let engine = CorrelationEngine::new(names());
        assert_eq!(
            engine.pair_columns(),
            vec!["a_b_corr".to_string(), "a_c_corr".into(), "b_c_corr".into()]
        );
    }
}
