//! Score normalisation functions.

/// Below this range a measure is treated as constant.
const DEGENERATE_RANGE: f64 = 1e-12;

/// Min-max normalise a slice into [0, 1], preserving order.
/// A single value or an all-equal slice normalises to all zeros.
pub fn min_max(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range < DEGENERATE_RANGE {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|&v| ((v - min) / range).clamp(0.0, 1.0))
        .collect()
}
