//! Compound annual growth rate over a country's observed span.

/// CAGR of a yearly series.
///
/// Only non-missing points count. The span runs from the earliest to the
/// latest year actually present, not the configured window, so a country
/// with late coverage is compounded over its own shorter span.
///
/// Returns `None` with fewer than two points, a zero-length span, a
/// non-positive starting value, or a non-finite result.
pub fn cagr(points: &[(i32, Option<f64>)]) -> Option<f64> {
    let mut present: Vec<(i32, f64)> = points
        .iter()
        .filter_map(|&(year, value)| value.map(|v| (year, v)))
        .filter(|(_, v)| v.is_finite())
        .collect();

    if present.len() < 2 {
        return None;
    }
    present.sort_by_key(|&(year, _)| year);

    let (first_year, first_value) = present[0];
    let (last_year, last_value) = present[present.len() - 1];
    let n = last_year - first_year;
    if n == 0 || first_value <= 0.0 {
        return None;
    }

    let rate = (last_value / first_value).powf(1.0 / n as f64) - 1.0;
    rate.is_finite().then_some(rate)
}
