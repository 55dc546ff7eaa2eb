// Windowed aggregation: the smoothed detection signals
//
// Three aggregators turn a raw series into the signal the segmenter
// thresholds: a centered moving average (one point per raw sample), a
// bucketed top-N mean (one point per bucket), and an inverse-distance
// weighted center of gravity.

use crate::config::DetectionConfig;
use crate::detection::outlier;
use crate::detection::segmenter::DetectionPoint;
use crate::detection::{DetectionError, Result};
use crate::series::{Sample, Series};
use crate::stats;

/// Centered moving average over `window` samples, clipped at the series
/// bounds; same cadence as the input
pub fn moving_average(series: &Series, window: usize) -> Vec<DetectionPoint> {
    let samples = series.samples();
    let values = series.values();
    let half = window / 2;
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(values.len() - 1);
            DetectionPoint {
                timestamp_ms: sample.timestamp_ms,
                value: stats::mean(&values[lo..=hi]),
                raw_value: sample.value,
                interval: None,
            }
        })
        .collect()
}

/// Bucketed top-N mean: one detection point per contiguous bucket of
/// `moving_average_window_size` samples (the last bucket may be short)
///
/// Per bucket: IQR-filter, sort ascending by value, average the top
/// `num_top_response_times` survivors. The point's timestamp is the sample at
/// the median rank among the kept top-N; the bucket's observed
/// `[min, max]` timestamps are recorded for hiccup-interval reconstruction.
pub fn bucketed_top_n(series: &Series, config: &DetectionConfig) -> Vec<DetectionPoint> {
    series
        .samples()
        .chunks(config.moving_average_window_size)
        .filter_map(|bucket| bucket_point(bucket, config.num_top_response_times))
        .collect()
}

fn bucket_point(bucket: &[Sample], num_top: usize) -> Option<DetectionPoint> {
    let values: Vec<f64> = bucket.iter().map(|s| s.value).collect();
    let bounds = outlier::acceptance_bounds(&values);

    let mut surviving: Vec<&Sample> = bucket
        .iter()
        .filter(|s| match bounds {
            Some((lower, upper)) => s.value >= lower && s.value <= upper,
            None => true,
        })
        .collect();
    if surviving.is_empty() {
        return None;
    }
    surviving.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let keep = num_top.min(surviving.len());
    let top = &surviving[surviving.len() - keep..];
    let top_mean = stats::mean(&top.iter().map(|s| s.value).collect::<Vec<_>>());
    let representative = top[keep / 2];

    // Series order makes the bucket's first/last samples its time extent
    let interval = (bucket[0].timestamp_ms, bucket[bucket.len() - 1].timestamp_ms);

    Some(DetectionPoint {
        timestamp_ms: representative.timestamp_ms,
        value: top_mean,
        raw_value: top_mean,
        interval: Some(interval),
    })
}

/// Inverse-distance-weighted center of gravity
///
/// The weight of neighbor `j` (inside the outer `center_of_gravity_window_size`
/// window) is the reciprocal of the mean absolute distance between sample
/// `i`'s value and the values in the narrower weight-calculation window
/// centered on `j`. A zero distance makes the weight infinite and the point
/// collapses to NaN; such points are discarded. Errs when no finite point
/// remains.
pub fn center_of_gravity(series: &Series, config: &DetectionConfig) -> Result<Vec<DetectionPoint>> {
    let samples = series.samples();
    let values = series.values();
    let cog_half = config.center_of_gravity_window_size / 2;
    let weight_half = config.weight_calculation_window_size / 2;

    let mut points = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        let lo = i.saturating_sub(cog_half);
        let hi = (i + cog_half).min(values.len() - 1);

        let mut weight_sum = 0.0;
        let mut weighted_value_sum = 0.0;
        for j in lo..=hi {
            let weight = 1.0 / window_distance(&values, values[i], j, weight_half);
            weight_sum += weight;
            weighted_value_sum += weight * values[j];
        }

        let value = weighted_value_sum / weight_sum;
        if value.is_finite() {
            points.push(DetectionPoint {
                timestamp_ms: sample.timestamp_ms,
                value,
                raw_value: sample.value,
                interval: None,
            });
        }
    }

    if points.is_empty() {
        return Err(DetectionError::EmptyDetectionSeries);
    }
    Ok(points)
}

/// Mean absolute distance between `reference` and the values in the window
/// centered on `center`
fn window_distance(values: &[f64], reference: f64, center: usize, half: usize) -> f64 {
    let lo = center.saturating_sub(half);
    let hi = (center + half).min(values.len() - 1);
    let sum: f64 = (lo..=hi).map(|m| (reference - values[m]).abs()).sum();
    sum / (hi - lo + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_interior_window() {
        let series = Series::from_pairs((0..7).map(|i| (i * 1000, i as f64)));
        let points = moving_average(&series, 3);
        assert_eq!(points.len(), 7);
        // Index 3 averages values 2, 3, 4
        assert_eq!(points[3].value, 3.0);
        assert_eq!(points[3].raw_value, 3.0);
    }

    #[test]
    fn test_moving_average_clipped_at_edges() {
        let series = Series::from_pairs([(0, 10.0), (1000, 20.0), (2000, 30.0)]);
        let points = moving_average(&series, 5);
        // At index 0 the window reaches indices 0..=2
        assert_eq!(points[0].value, 20.0);
        assert_eq!(points[2].value, 20.0);
    }

    #[test]
    fn test_moving_average_keeps_cadence() {
        let series = Series::from_pairs((0..21).map(|i| (i * 500, 100.0)));
        let points = moving_average(&series, 11);
        assert_eq!(points.len(), series.len());
        assert!(points.iter().all(|p| p.value == 100.0));
    }

    #[test]
    fn test_bucketed_top_n_reduced_cadence() {
        let series = Series::from_pairs((0..33).map(|i| (i * 1000, i as f64)));
        let config = DetectionConfig::default();
        let points = bucketed_top_n(&series, &config);
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn test_bucket_value_is_top_n_mean() {
        // One bucket of 11 ascending values 0..=10: top 5 are 6..=10
        let series = Series::from_pairs((0..11).map(|i| (i * 1000, i as f64)));
        let config = DetectionConfig::default();
        let points = bucketed_top_n(&series, &config);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 8.0);
        // Median rank of the kept five is the third one: value 8 at t=8000
        assert_eq!(points[0].timestamp_ms, 8000);
        assert_eq!(points[0].interval, Some((0, 10_000)));
    }

    #[test]
    fn test_bucket_iqr_filters_extreme_before_top_n() {
        let mut pairs: Vec<(i64, f64)> = (0..11).map(|i| (i * 1000, i as f64)).collect();
        pairs[10].1 = 1000.0; // extreme value pushed out by the bucket IQR filter
        let series = Series::from_pairs(pairs);
        let config = DetectionConfig::default();
        let points = bucketed_top_n(&series, &config);
        assert_eq!(points.len(), 1);
        // Survivors are 0..=9; top 5 = 5..=9
        assert_eq!(points[0].value, 7.0);
    }

    #[test]
    fn test_short_last_bucket() {
        let series = Series::from_pairs((0..13).map(|i| (i * 1000, 50.0)));
        let config = DetectionConfig::default();
        let points = bucketed_top_n(&series, &config);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].interval, Some((11_000, 12_000)));
    }

    #[test]
    fn test_center_of_gravity_tracks_plateau() {
        let mut pairs: Vec<(i64, f64)> = (0..40).map(|i| (i * 1000, 100.0 + (i % 3) as f64)).collect();
        for p in pairs.iter_mut().skip(15).take(10) {
            p.1 += 400.0;
        }
        let series = Series::from_pairs(pairs);
        let config = DetectionConfig {
            center_of_gravity_window_size: 7,
            weight_calculation_window_size: 3,
            ..Default::default()
        };
        let points = center_of_gravity(&series, &config).unwrap();
        assert!(!points.is_empty());
        let plateau_point = points
            .iter()
            .find(|p| p.timestamp_ms == 20_000)
            .expect("plateau point retained");
        assert!(plateau_point.value > 300.0);
    }

    #[test]
    fn test_center_of_gravity_constant_series_errors() {
        // Every weight window holds identical values, so every point
        // collapses and the detection series comes out empty
        let series = Series::from_pairs((0..50).map(|i| (i * 1000, 10.0)));
        let config = DetectionConfig::default();
        assert_eq!(
            center_of_gravity(&series, &config),
            Err(DetectionError::EmptyDetectionSeries)
        );
    }

    #[test]
    fn test_center_of_gravity_empty_series_errors() {
        let config = DetectionConfig::default();
        assert!(center_of_gravity(&Series::default(), &config).is_err());
    }

    #[test]
    fn test_window_distance_basic() {
        let values = [1.0, 2.0, 3.0];
        // Window of half=1 around index 1 covers all three values
        let d = window_distance(&values, 2.0, 1, 1);
        assert!((d - 2.0 / 3.0).abs() < 1e-12);
    }
}
