//! Scalar statistics shared across the detection pipeline
//!
//! Quartiles use the classic lower/upper-half median split (no linear
//! interpolation), so IQR acceptance bounds agree across every strategy.
//! Mean and standard deviation use the population formulas.

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; NaN for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Median of an already sorted slice; NaN for an empty slice
pub fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// First and third quartile via the lower/upper-half median split
///
/// The halves are medians of the lower and upper half of the sorted values;
/// the middle value of an odd-length set belongs to both halves. Returns
/// `None` for fewer than two values, where no split exists.
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = median_of_sorted(&sorted[..(n + 1) / 2]);
    let q3 = median_of_sorted(&sorted[n / 2..]);
    Some((q1, q3))
}

/// Largest value; NaN for an empty slice
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NAN, f64::max)
}

/// Smallest value; NaN for an empty slice
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NAN, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn test_mean_empty_is_nan() {
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_std_dev_population() {
        // mean=5, variance = (9 + 1 + 1 + 9) / 4 = 5
        let sd = std_dev(&[2.0, 4.0, 6.0, 8.0]);
        assert!((sd - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_constant_is_zero() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_std_dev_single_value_is_zero() {
        // Population formula divides by n, so one sample has zero spread
        assert_eq!(std_dev(&[42.0]), 0.0);
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(median_of_sorted(&[1.0, 3.0, 9.0]), 3.0);
    }

    #[test]
    fn test_median_even() {
        assert_eq!(median_of_sorted(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_quartiles_median_split_even() {
        // {1..9,100}: lower half [1..5] -> 3, upper half [6,7,8,9,100] -> 8
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
        let (q1, q3) = quartiles(&values).unwrap();
        assert_eq!(q1, 3.0);
        assert_eq!(q3, 8.0);
    }

    #[test]
    fn test_quartiles_median_split_odd() {
        // Middle value included in both halves
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (q1, q3) = quartiles(&values).unwrap();
        assert_eq!(q1, 2.0);
        assert_eq!(q3, 4.0);
    }

    #[test]
    fn test_quartiles_unsorted_input() {
        let values = [9.0, 1.0, 5.0, 3.0, 7.0, 100.0, 2.0, 8.0, 4.0, 6.0];
        let (q1, q3) = quartiles(&values).unwrap();
        assert_eq!(q1, 3.0);
        assert_eq!(q3, 8.0);
    }

    #[test]
    fn test_quartiles_too_small() {
        assert!(quartiles(&[]).is_none());
        assert!(quartiles(&[1.0]).is_none());
    }

    #[test]
    fn test_min_max() {
        assert_eq!(max(&[3.0, 9.0, 1.0]), 9.0);
        assert_eq!(min(&[3.0, 9.0, 1.0]), 1.0);
        assert!(max(&[]).is_nan());
    }
}
