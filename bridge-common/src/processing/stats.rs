//! Robust statistics shared by the pipeline stages

/// Consistency constant that makes MAD estimate the standard deviation of
/// normally distributed data
pub const MAD_SCALE: f64 = 1.4826;

/// Median of `values`, reordering the slice in place
///
/// Even-length slices average the two middle elements. Returns `None` for an
/// empty slice.
pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let mid = n / 2;
    let (lower, upper_mid, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper_mid = *upper_mid;

    if n % 2 == 1 {
        return Some(upper_mid);
    }

    // Largest element of the lower half is the other middle value
    let lower_mid = lower.iter().copied().max_by(f64::total_cmp).unwrap_or(upper_mid);
    Some(midpoint(lower_mid, upper_mid))
}

/// Mean of two values that stays finite when both are finite
fn midpoint(lower: f64, upper: f64) -> f64 {
    if lower == upper {
        return lower;
    }
    let mid = lower + (upper - lower) / 2.0;
    if mid.is_finite() {
        mid
    } else {
        // upper - lower overflowed (opposite signs near the f64 limits)
        lower / 2.0 + upper / 2.0
    }
}

/// Median and median absolute deviation of `values`
///
/// `scratch` is reused between calls to avoid reallocating per window.
pub fn median_and_mad(values: &[f64], scratch: &mut Vec<f64>) -> Option<(f64, f64)> {
    scratch.clear();
    scratch.extend_from_slice(values);
    let center = median_in_place(scratch)?;

    scratch.clear();
    scratch.extend(values.iter().map(|v| (v - center).abs()));
    let mad = median_in_place(scratch)?;

    Some((center, mad))
}

/// Bounds of a centered window of `window` samples around `index`, shrunk
/// at the ends of a series of `len` samples (half-open range)
pub fn centered_bounds(index: usize, window: usize, len: usize) -> (usize, usize) {
    let half = window / 2;
    let start = index.saturating_sub(half);
    let end = (index + half + 1).min(len);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn median(values: &[f64]) -> Option<f64> {
        let mut scratch = values.to_vec();
        median_in_place(&mut scratch)
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[5.0]), Some(5.0));
    }

    #[test]
    fn test_median_even_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[10.0, 20.0]), Some(15.0));
    }

    #[test]
    fn test_median_even_near_f64_limits_stays_finite() {
        assert_eq!(median(&[1.7e308; 4]), Some(1.7e308));
        let mid = median(&[1.6e308, 1.7e308]).unwrap();
        assert!(((mid - 1.65e308) / 1.65e308).abs() < 1e-12, "got {mid}");
        assert_eq!(median(&[-1.7e308, 1.7e308]), Some(0.0));
        assert_eq!(median(&[-1.7e308, -1.7e308]), Some(-1.7e308));
    }

    #[test]
    fn test_mad_of_huge_flat_window() {
        let mut scratch = Vec::new();
        assert_eq!(median_and_mad(&[1.7e308; 4], &mut scratch), Some((1.7e308, 0.0)));
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_median_leaves_input_order() {
        let values = [9.0, 1.0, 5.0];
        assert_eq!(median(&values), Some(5.0));
        assert_eq!(values, [9.0, 1.0, 5.0]);
    }

    #[test]
    fn test_median_and_mad() {
        let mut scratch = Vec::new();
        // deviations from 15: 5, 3, 1, 985, 1, 3 -> median 3
        let (center, mad) = median_and_mad(&[10.0, 12.0, 14.0, 1000.0, 16.0, 18.0], &mut scratch).unwrap();
        assert_eq!(center, 15.0);
        assert_eq!(mad, 3.0);
    }

    #[test]
    fn test_mad_of_flat_window_is_zero() {
        let mut scratch = Vec::new();
        assert_eq!(median_and_mad(&[7.0; 5], &mut scratch), Some((7.0, 0.0)));
    }

    #[test]
    fn test_centered_bounds_shrink_at_edges() {
        assert_eq!(centered_bounds(0, 7, 10), (0, 4));
        assert_eq!(centered_bounds(5, 7, 10), (2, 9));
        assert_eq!(centered_bounds(9, 7, 10), (6, 10));
        assert_eq!(centered_bounds(0, 7, 1), (0, 1));
        assert_eq!(centered_bounds(2, 1, 5), (2, 3));
    }
}
