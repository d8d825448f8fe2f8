//! Per-indicator line charts (SVG).
//!
//! One chart per indicator: years on the x axis, one polyline per country.
//! Countries with no values for the indicator are left out; a chart with no
//! series at all is not written.

use anyhow::{Context, Result};
use econlab_core::domain::WideTable;
use std::fmt::Write as _;
use std::path::Path;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 450.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 150.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;
const Y_TICKS: usize = 5;

const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

/// One country's points, sorted by year.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(i32, f64)>,
}

/// File name for an indicator's chart, e.g. `GDP_per_capita_by_country.svg`.
pub fn chart_file_name(indicator: &str) -> String {
    let safe: String = indicator
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            c => c,
        })
        .collect();
    format!("{safe}_by_country.svg")
}

/// Country series for one column of the table.
pub fn series_for(table: &WideTable, column: &str) -> Vec<ChartSeries> {
    table
        .by_country()
        .into_iter()
        .filter_map(|(country, rows)| {
            let points: Vec<(i32, f64)> = rows
                .iter()
                .filter_map(|r| table.value(r, column).map(|v| (r.year(), v)))
                .collect();
            (!points.is_empty()).then(|| ChartSeries {
                label: country.to_string(),
                points,
            })
        })
        .collect()
}

/// Render a line chart; `None` when there is nothing to draw.
pub fn render_line_chart(title: &str, series: &[ChartSeries]) -> Option<String> {
    let all = series.iter().flat_map(|s| s.points.iter());
    let (mut x_min, mut x_max) = (i32::MAX, i32::MIN);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in all {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if x_min > x_max || !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }
    if x_min == x_max {
        x_min -= 1;
        x_max += 1;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        let pad = if y_max == 0.0 { 1.0 } else { y_max.abs() * 0.1 };
        y_min -= pad;
        y_max += pad;
    }

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let sx = |x: i32| MARGIN_LEFT + (x - x_min) as f64 / (x_max - x_min) as f64 * plot_w;
    let sy = |y: f64| MARGIN_TOP + (1.0 - (y - y_min) / (y_max - y_min)) * plot_h;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="22" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    );

    // Axes
    let (left, right) = (MARGIN_LEFT, MARGIN_LEFT + plot_w);
    let (top, bottom) = (MARGIN_TOP, MARGIN_TOP + plot_h);
    let _ = writeln!(
        svg,
        r#"<path d="M{left},{top} L{left},{bottom} L{right},{bottom}" fill="none" stroke="black"/>"#
    );

    for i in 0..=Y_TICKS {
        let v = y_min + (y_max - y_min) * i as f64 / Y_TICKS as f64;
        let y = sy(v);
        let _ = writeln!(
            svg,
            r##"<line x1="{left}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"##,
            left - 6.0,
            y + 4.0,
            tick_label(v)
        );
    }

    let span = (x_max - x_min) as usize;
    let step = span.div_ceil(10).max(1);
    for year in (x_min..=x_max).step_by(step) {
        let x = sx(year);
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle">{year}</text>"#,
            bottom + 18.0
        );
    }

    for (i, s) in series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let points: Vec<String> = s
            .points
            .iter()
            .map(|&(x, y)| format!("{:.1},{:.1}", sx(x), sy(y)))
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="2"/>"#,
            points.join(" ")
        );
        for &(x, y) in &s.points {
            let _ = writeln!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="2.5" fill="{color}"/>"#,
                sx(x),
                sy(y)
            );
        }

        let ly = MARGIN_TOP + 10.0 + i as f64 * 18.0;
        let lx = right + 15.0;
        let _ = writeln!(
            svg,
            r#"<line x1="{lx}" y1="{ly}" x2="{}" y2="{ly}" stroke="{color}" stroke-width="2"/><text x="{}" y="{}">{}</text>"#,
            lx + 20.0,
            lx + 26.0,
            ly + 4.0,
            escape(&s.label)
        );
    }

    svg.push_str("</svg>\n");
    Some(svg)
}

/// Write the chart for `column`; returns `false` when no country had data.
pub fn write_indicator_chart(path: &Path, table: &WideTable, column: &str) -> Result<bool> {
    let series = series_for(table, column);
    let Some(svg) = render_line_chart(&format!("{column} by country"), &series) else {
        return Ok(false);
    };
    std::fs::write(path, svg)
        .with_context(|| format!("Failed to write chart {}", path.display()))?;
    Ok(true)
}

fn tick_label(v: f64) -> String {
    let a = v.abs();
    if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}k", v / 1e3)
    } else {
        format!("{v:.1}")
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
