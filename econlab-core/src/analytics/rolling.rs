//! Trailing rolling mean with a narrowing window.

/// Trailing mean over `window` positions (current + `window - 1` prior).
///
/// Missing points are skipped; a value is produced when at least one point
/// in the window is present, so the first positions average fewer points
/// instead of being undefined.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let present: Vec<f64> = values[start..=i].iter().filter_map(|v| *v).collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect()
}
