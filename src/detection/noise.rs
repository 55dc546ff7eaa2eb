// Neighborhood-distance noise filtering
//
// A sample's noise metric is the mean absolute difference to its neighbors
// inside a fixed window; metrics are normalized by the maximum observed
// metric. Explicit-threshold mode keeps samples whose normalized metric is
// below the configured cut; percentile mode (selected by a negative
// configured threshold) derives the cut from the sorted metrics at index
// floor(N * percentile).

use crate::config::DetectionConfig;
use crate::series::Series;

/// Normalized per-sample noise metrics for a series
///
/// The metric at `i` is the mean absolute difference between sample `i` and
/// the other samples in the window centered on it, divided by the maximum
/// metric over the series. A perfectly flat series normalizes 0/0 to NaN for
/// every sample, and NaN fails every keep test, so nothing survives.
pub fn normalized_noise_metrics(series: &Series, window: usize) -> Vec<f64> {
    let values = series.values();
    let metrics: Vec<f64> = (0..values.len())
        .map(|i| local_noise_metric(&values, i, window))
        .collect();
    let max_metric = metrics.iter().copied().fold(0.0_f64, f64::max);
    metrics.iter().map(|m| m / max_metric).collect()
}

/// Mean absolute difference between sample `i` and its window neighbors,
/// excluding `i` itself; 0 when the window holds no other sample
fn local_noise_metric(values: &[f64], i: usize, window: usize) -> f64 {
    let half = window / 2;
    let lo = i.saturating_sub(half);
    let hi = (i + half).min(values.len() - 1);
    let neighbors = hi - lo;
    if neighbors == 0 {
        return 0.0;
    }
    let sum: f64 = (lo..=hi)
        .filter(|&j| j != i)
        .map(|j| (values[i] - values[j]).abs())
        .sum();
    sum / neighbors as f64
}

/// Remove locally unstable samples, keeping timestamps of the survivors
///
/// The neighborhood window is `weight_calculation_window_size`. Mode selection
/// follows the configured `noise_threshold`: non-negative uses it directly,
/// negative switches to percentile mode on `noise_percentile`.
pub fn filter_noise(series: &Series, config: &DetectionConfig) -> Series {
    if series.is_empty() {
        return Series::default();
    }

    let normalized = normalized_noise_metrics(series, config.weight_calculation_window_size);

    let threshold = if config.noise_threshold >= 0.0 {
        config.noise_threshold
    } else {
        percentile_threshold(&normalized, config.noise_percentile)
    };

    let kept: Vec<_> = series
        .iter()
        .zip(&normalized)
        .filter(|(_, &metric)| metric < threshold)
        .map(|(sample, _)| *sample)
        .collect();

    tracing::debug!(
        kept = kept.len(),
        dropped = series.len() - kept.len(),
        threshold,
        "noise filter applied"
    );

    Series::new(kept)
}

/// Effective threshold in percentile mode: the sorted normalized metric at
/// index floor(N * percentile)
fn percentile_threshold(normalized: &[f64], percentile: f64) -> f64 {
    let mut sorted = normalized.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let index = ((sorted.len() as f64 * percentile).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}
