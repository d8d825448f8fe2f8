//! Markdown report generator.
//!
//! One document with a section per tabular artifact plus a dashboard that
//! embeds the first indicator's chart.

use econlab_core::analytics::CorrelationMatrix;

use super::SummaryTable;
use crate::pipeline::PipelineReport;
use crate::reporting::fmt_opt;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    /// `chart` is the dashboard chart path relative to the report, if one was written.
    pub fn generate(&self, report: &PipelineReport, chart: Option<&str>) -> String {
        let config = &report.config;
        let mut out = format!(
            "# EconLab Indicator Report\n\n\
- Countries: {}\n\
- Years: {}-{}\n\
- Wide rows: {}\n\
- Growth indicator: {}\n",
            config.dataset.countries.join(", "),
            config.dataset.start_year,
            config.dataset.end_year,
            report.table.len(),
            report.growth_indicator,
        );

        out.push_str("\n## Fetched indicators\n\n");
        out.push_str("| Name | Code | Rows | With value |\n");
        out.push_str("|------|------|------|------------|\n");
        for f in &report.fetched {
            out.push_str(&format!("| {} | {} | {} | {} |\n", f.name, f.code, f.rows, f.present));
        }

        out.push_str("\n## raw_wide\n\n");
        out.push_str(&Self::wide_section(report));

        out.push_str("\n## summary_metrics\n\n");
        out.push_str(&SummaryTable::from_report(report).render_markdown());

        out.push_str("\n## country_correlations\n\n");
        if report.country_correlations.is_empty() {
            out.push_str("_No country had enough complete observations._\n");
        } else {
            let pairs = report.country_correlations[0].matrix.pairs();
            let header: Vec<String> = pairs
                .iter()
                .map(|(a, b, _)| CorrelationMatrix::pair_column(a, b))
                .collect();
            out.push_str(&format!("| country | {} |\n", header.join(" | ")));
            out.push_str(&format!("|---|{}\n", "---|".repeat(header.len())));
            for c in &report.country_correlations {
                let cells: Vec<String> = c.matrix.pairs().iter().map(|(_, _, r)| fmt_opt(*r, 3)).collect();
                out.push_str(&format!("| {} | {} |\n", c.country, cells.join(" | ")));
            }
        }

        out.push_str("\n## overall_correlation\n\n");
        out.push_str(&Self::matrix_section(&report.overall_correlation));

        out.push_str("\n## dashboard\n\n");
        match chart {
            Some(path) => {
                let title = report
                    .table
                    .indicators
                    .first()
                    .map(|s| s.as_str())
                    .unwrap_or("indicator");
                out.push_str(&format!("![{title} by country]({path})\n"));
            }
            None => out.push_str("_No chart was generated._\n"),
        }

        out
    }

    fn wide_section(report: &PipelineReport) -> String {
        let table = &report.table;
        let columns = table.value_columns();
        let mut out = format!("| country | country_code | year | {} |\n", columns.join(" | "));
        out.push_str(&format!("|---|---|---|{}\n", "---|".repeat(columns.len())));
        for row in &table.rows {
            let cells: Vec<String> = columns.iter().map(|c| fmt_opt(table.value(row, c), 2)).collect();
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                row.country(),
                row.country_code(),
                row.year(),
                cells.join(" | ")
            ));
        }
        out
    }

    fn matrix_section(matrix: &CorrelationMatrix) -> String {
        let mut out = format!("Complete-case rows: {}\n\n", matrix.observations);
        out.push_str(&format!("| indicator | {} |\n", matrix.indicators.join(" | ")));
        out.push_str(&format!("|---|{}\n", "---|".repeat(matrix.indicators.len())));
        for (i, name) in matrix.indicators.iter().enumerate() {
            let cells: Vec<String> = matrix.row(i).iter().map(|r| fmt_opt(*r, 3)).collect();
            out.push_str(&format!("| {} | {} |\n", name, cells.join(" | ")));
        }
        out
    }
}
