// Baseline statistics and the deviation threshold
//
// threshold = max(mean + k*std_dev, mean + f*mean, mean + 50). The +50ms
// floor keeps a minimum absolute sensitivity when the mean sits near zero.

use serde::{Deserialize, Serialize};

use crate::stats;

/// Minimum absolute deviation above the baseline mean, in milliseconds
pub const MIN_ABSOLUTE_DEVIATION_MS: f64 = 50.0;

/// Baseline mean/stddev and the derived detection threshold
///
/// Diagnostic output of a strategy run; also snapshotted into every hiccup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
}

impl BaselineStats {
    /// Compute baseline statistics over an outlier-filtered value set
    ///
    /// Mean and standard deviation use the population formulas. An empty
    /// baseline propagates NaN into the threshold, which then never opens a
    /// hiccup.
    pub fn from_baseline(
        values: &[f64],
        deviation_factor: f64,
        min_deviation_factor: f64,
    ) -> Self {
        let mean = stats::mean(values);
        let std_dev = stats::std_dev(values);
        let threshold = (mean + deviation_factor * std_dev)
            .max(mean + min_deviation_factor * mean)
            .max(mean + MIN_ABSOLUTE_DEVIATION_MS);
        Self {
            mean,
            std_dev,
            threshold,
        }
    }

    /// Baseline with an explicitly chosen threshold (the combined
    /// noise-and-outlier strategy thresholds on the maximum retained value)
    pub fn with_threshold(mean: f64, std_dev: f64, threshold: f64) -> Self {
        Self {
            mean,
            std_dev,
            threshold,
        }
    }
}
