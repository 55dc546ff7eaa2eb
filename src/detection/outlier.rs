// Interquartile-range outlier filtering
//
// Quartiles come from the classic lower/upper-half median split; acceptance
// bounds are [Q1 - 1.5*IQR, Q3 + 1.5*IQR]. The retained subset keeps input
// order and feeds the baseline mean/stddev; the excluded complement stays
// available for the combined noise-and-outlier strategy.

use crate::stats;

const IQR_MULTIPLIER: f64 = 1.5;

/// Order-preserving split of a value set into IQR-retained and excluded parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierSplit {
    /// Values inside the acceptance bounds, in input order
    pub retained: Vec<f64>,
    /// Values outside the acceptance bounds, in input order
    pub excluded: Vec<f64>,
}

/// IQR acceptance bounds `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`
///
/// `None` for fewer than two values, where no quartile split exists.
pub fn acceptance_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let (q1, q3) = stats::quartiles(values)?;
    let iqr = q3 - q1;
    Some((q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr))
}

/// Split values against their own IQR acceptance bounds
///
/// Sets too small for a quartile split are retained whole.
///
/// # Example
/// ```
/// use hipo::detection::split_outliers;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
/// let split = split_outliers(&values);
/// assert_eq!(split.excluded, vec![100.0]);
/// assert_eq!(split.retained.len(), 9);
/// ```
pub fn split_outliers(values: &[f64]) -> OutlierSplit {
    let Some((lower, upper)) = acceptance_bounds(values) else {
        return OutlierSplit {
            retained: values.to_vec(),
            excluded: Vec::new(),
        };
    };

    let mut split = OutlierSplit::default();
    for &value in values {
        if value >= lower && value <= upper {
            split.retained.push(value);
        } else {
            split.excluded.push(value);
        }
    }
    split
}

/// IQR-retained values only (order-preserving)
pub fn filter_outliers(values: &[f64]) -> Vec<f64> {
    split_outliers(values).retained
}
