// src/engine/stats.rs
//
// Percentile definitions vary (nearest-rank vs. interpolated); this service
// pins interpolated rank: P_k = v[(k/100)·(n−1)], linearly interpolated
// between adjacent order statistics.

/// Interpolated-rank percentile over an ascending-sorted slice.
pub fn percentile(sorted: &[f64], k: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let rank = (k / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median(sorted: &[f64]) -> Option<f64> {
    percentile(sorted, 50.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// NaN/±inf must render as JSON null, never as a numeric literal.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_fixture() {
        let sample = [10.0, 20.0, 30.0, 40.0, 50.0, 200.0];
        assert_eq!(median(&sample), Some(35.0));
        assert_eq!(percentile(&sample, 90.0), Some(125.0));
        assert_eq!(percentile(&sample, 0.0), Some(10.0));
        assert_eq!(percentile(&sample, 100.0), Some(200.0));
    }

    #[test]
    fn empty_and_singleton() {
        assert_eq!(percentile(&[], 90.0), None);
        assert_eq!(percentile(&[42.0], 90.0), Some(42.0));
        assert_eq!(median(&[42.0]), Some(42.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn mean_and_rounding() {
        assert_eq!(mean(&[10.0, 20.0]), Some(15.0));
        assert_eq!(round2(33.3333), 33.33);
        assert_eq!(round2(66.666), 66.67);
    }

    #[test]
    fn finite_filters_non_finite() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
    }
}
