//! Ranked country summary for the console and the report.

use econlab_core::analytics::{CorrelationMatrix, CountryMetrics};
use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::pipeline::PipelineReport;
use crate::reporting::fmt_opt;

/// Countries ranked by the latest value of the growth indicator, highest
/// first; countries without a latest value sort last.
#[derive(Debug, Clone)]
pub struct SummaryTable<'a> {
    pub rank_by: String,
    pub indicators: Vec<String>,
    pub rows: Vec<&'a CountryMetrics>,
}

impl<'a> SummaryTable<'a> {
    pub fn new(metrics: &'a [CountryMetrics], rank_by: &str, indicators: Vec<String>) -> Self {
        let mut rows: Vec<&CountryMetrics> = metrics.iter().collect();
        rows.sort_by(|a, b| {
            match (a.latest_value(rank_by), b.latest_value(rank_by)) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.country.cmp(&b.country))
        });
        Self {
            rank_by: rank_by.to_string(),
            indicators,
            rows,
        }
    }

    pub fn from_report(report: &'a PipelineReport) -> Self {
        Self::new(
            &report.metrics,
            &report.growth_indicator,
            report.table.indicators.clone(),
        )
    }

    pub fn countries(&self) -> Vec<&str> {
        self.rows.iter().map(|m| m.country.as_str()).collect()
    }

    fn header(&self) -> Vec<String> {
        let mut header = vec![
            "country".to_string(),
            "years".to_string(),
            "growth_rate".to_string(),
            "latest_year".to_string(),
        ];
        header.extend(self.indicators.iter().map(|n| format!("{n}_latest")));
        header
    }

    fn cells(&self, m: &CountryMetrics) -> Vec<String> {
        let mut cells = vec![
            m.country.clone(),
            m.years_observed.to_string(),
            m.growth_rate
                .map(|g| format!("{:+.2}%", g * 100.0))
                .unwrap_or_else(|| "-".to_string()),
            m.latest_year.to_string(),
        ];
        cells.extend(self.indicators.iter().map(|n| fmt_opt(m.latest_value(n), 2)));
        cells
    }

    /// Fixed-width text table for the terminal.
    pub fn render_text(&self) -> String {
        let header = self.header();
        let body: Vec<Vec<String>> = self.rows.iter().map(|m| self.cells(m)).collect();
        render_columns(&header, &body)
    }

    /// Markdown table.
    pub fn render_markdown(&self) -> String {
        let header = self.header();
        let mut out = format!("| {} |\n", header.join(" | "));
        out.push_str(&format!("|{}\n", "---|".repeat(header.len())));
        for m in &self.rows {
            out.push_str(&format!("| {} |\n", self.cells(m).join(" | ")));
        }
        out
    }
}

/// Fixed-width text rendering of a correlation matrix.
pub fn render_matrix_text(matrix: &CorrelationMatrix) -> String {
    let mut header = vec!["indicator".to_string()];
    header.extend(matrix.indicators.iter().cloned());
    let body: Vec<Vec<String>> = matrix
        .indicators
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut row = vec![name.clone()];
            row.extend(matrix.row(i).iter().map(|r| fmt_opt(*r, 3)));
            row
        })
        .collect();
    render_columns(&header, &body)
}

fn render_columns(header: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (c, &w))| {
                if i == 0 {
                    format!("{c:<w$}")
                } else {
                    format!("{c:>w$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(header));
    for row in body {
        let _ = writeln!(out, "{}", line(row));
    }
    out
}
