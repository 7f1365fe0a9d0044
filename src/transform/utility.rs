/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values: the middle element, or the mean of the two middle
/// elements for even lengths. Returns `None` for empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        mean(&sorted[mid - 1..=mid])
    } else {
        Some(sorted[mid])
    }
}

/// Quantile `q` (0.0–1.0) of already sorted values, linearly interpolated
/// between the two nearest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// `n + 1` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return vec![start];
    }
    let step = (end - start) / n as f64;
    (0..=n)
        .map(|i| if i == n { end } else { start + step * i as f64 })
        .collect()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Number of distinct values, comparing bit-for-bit after sorting.
pub fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = sorted(values);
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[120.0, 100.0]), Some(110.0));
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&sorted, 1.0), Some(5.0));
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(3.0));
        let q = quantile_sorted(&sorted, 0.2).unwrap();
        assert!((q - 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_linspace_hits_both_ends() {
        let points = linspace(0.0, 1.0, 4);
        assert_eq!(points, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_distinct_count() {
        assert_eq!(distinct_count(&[1.0, 1.0, 2.0]), 2);
        assert_eq!(distinct_count(&[]), 0);
    }
}
