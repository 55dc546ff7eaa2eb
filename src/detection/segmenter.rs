// Threshold-crossing hiccup segmentation
//
// A two-state machine walks the detection signal: open a hiccup when the
// signal reaches the threshold, extend while it stays there, close once the
// signal drops and the raw-timeline gap exceeds inter_hiccup_threshold_ms.
// An in-progress hiccup at series end is finalized from the accumulated
// running sums.

use serde::{Deserialize, Serialize};

use crate::detection::threshold::BaselineStats;
use crate::series::Series;
use crate::stats;

/// One detection-signal point fed to the segmenter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionPoint {
    pub timestamp_ms: i64,
    /// Smoothed/aggregated value compared against the threshold
    pub value: f64,
    /// Raw sample value under this point, for running-sum hiccup statistics
    pub raw_value: f64,
    /// Raw time range covered by this point (bucket aggregation only)
    pub interval: Option<(i64, i64)>,
}

impl DetectionPoint {
    /// Point whose raw value coincides with the signal value (noise
    /// strategies compare the denoised raw series directly)
    pub fn from_raw(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
            raw_value: value,
            interval: None,
        }
    }
}

/// A contiguous interval where the detection signal stayed at or above the
/// calibrated threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hiccup {
    pub start_timestamp_ms: i64,
    pub end_timestamp_ms: i64,
    pub avg_raw_response_time: f64,
    pub max_raw_response_time: f64,
    pub avg_processed_value: f64,
    pub max_processed_value: f64,
    pub baseline_mean: f64,
    pub baseline_std_dev: f64,
    pub threshold_at_detection: f64,
}

impl Hiccup {
    pub fn duration_ms(&self) -> i64 {
        self.end_timestamp_ms - self.start_timestamp_ms
    }
}

/// Raw-sample range query injected for bucket-aggregated signals
///
/// Bucket points carry no per-sample raw values, so closing a hiccup
/// re-queries the raw dataset over `[start, end]` instead of reading the
/// running sums.
pub trait RangeQuery {
    /// Raw response-time values with timestamps in `[start_ms, end_ms]`
    /// (inclusive)
    fn raw_values_between(&self, start_ms: i64, end_ms: i64) -> Vec<f64>;
}

impl RangeQuery for Series {
    fn raw_values_between(&self, start_ms: i64, end_ms: i64) -> Vec<f64> {
        self.between(start_ms, end_ms)
            .iter()
            .map(|s| s.value)
            .collect()
    }
}

/// Running sums for the currently open hiccup; reset on open, read on close
#[derive(Debug, Clone)]
struct RunningSums {
    raw_sum: f64,
    raw_max: f64,
    processed_sum: f64,
    processed_max: f64,
    count: usize,
}

impl RunningSums {
    fn start(raw: f64, processed: f64) -> Self {
        Self {
            raw_sum: raw,
            raw_max: raw,
            processed_sum: processed,
            processed_max: processed,
            count: 1,
        }
    }

    fn record(&mut self, raw: f64, processed: f64) {
        self.raw_sum += raw;
        self.raw_max = self.raw_max.max(raw);
        self.processed_sum += processed;
        self.processed_max = self.processed_max.max(processed);
        self.count += 1;
    }
}

#[derive(Debug)]
struct OpenHiccup {
    start_ms: i64,
    end_ms: i64,
    sums: RunningSums,
}

/// Common threshold-crossing state machine producing `Hiccup` records
pub struct HiccupSegmenter<'a> {
    inter_hiccup_threshold_ms: i64,
    baseline: BaselineStats,
    range_query: Option<&'a dyn RangeQuery>,
}

impl<'a> HiccupSegmenter<'a> {
    pub fn new(inter_hiccup_threshold_ms: i64, baseline: BaselineStats) -> Self {
        Self {
            inter_hiccup_threshold_ms,
            baseline,
            range_query: None,
        }
    }

    /// Re-query raw statistics through `query` when closing each hiccup
    pub fn with_range_query(mut self, query: &'a dyn RangeQuery) -> Self {
        self.range_query = Some(query);
        self
    }

    /// Segment the detection signal against `baseline.threshold`
    ///
    /// Returned hiccups are ordered ascending by start timestamp and each
    /// satisfies `end >= start`; consecutive hiccups are separated by a raw
    /// timeline gap greater than `inter_hiccup_threshold_ms` by construction.
    /// A NaN threshold never opens a hiccup.
    pub fn segment(&self, points: &[DetectionPoint]) -> Vec<Hiccup> {
        let threshold = self.baseline.threshold;
        self.segment_by(points, |value| value >= threshold)
    }

    /// Segment with a variant membership test instead of the plain threshold
    /// comparison (the combined noise-and-outlier strategy requires strict
    /// exceedance of the maximum retained baseline value)
    pub fn segment_by<F>(&self, points: &[DetectionPoint], is_active: F) -> Vec<Hiccup>
    where
        F: Fn(f64) -> bool,
    {
        let mut hiccups = Vec::new();
        let mut open: Option<OpenHiccup> = None;

        for point in points {
            let above = is_active(point.value);
            open = match open {
                Some(mut current) => {
                    if above {
                        current.end_ms =
                            point.interval.map_or(point.timestamp_ms, |(_, end)| end);
                        current.sums.record(point.raw_value, point.value);
                        Some(current)
                    } else if point.timestamp_ms - current.end_ms > self.inter_hiccup_threshold_ms
                    {
                        hiccups.push(self.finalize(&current));
                        None
                    } else {
                        // Below threshold but still inside the gap tolerance
                        Some(current)
                    }
                }
                None if above => {
                    let (start_ms, end_ms) = point
                        .interval
                        .unwrap_or((point.timestamp_ms, point.timestamp_ms));
                    Some(OpenHiccup {
                        start_ms,
                        end_ms,
                        sums: RunningSums::start(point.raw_value, point.value),
                    })
                }
                None => None,
            };
        }

        if let Some(current) = open {
            hiccups.push(self.finalize(&current));
        }

        hiccups
    }

    fn finalize(&self, open: &OpenHiccup) -> Hiccup {
        let (avg_raw, max_raw) = match self.range_query {
            Some(query) => {
                let raw = query.raw_values_between(open.start_ms, open.end_ms);
                (stats::mean(&raw), stats::max(&raw))
            }
            None => (
                open.sums.raw_sum / open.sums.count as f64,
                open.sums.raw_max,
            ),
        };

        tracing::debug!(
            start_ms = open.start_ms,
            end_ms = open.end_ms,
            avg_raw,
            "hiccup closed"
        );

        Hiccup {
            start_timestamp_ms: open.start_ms,
            end_timestamp_ms: open.end_ms,
            avg_raw_response_time: avg_raw,
            max_raw_response_time: max_raw,
            avg_processed_value: open.sums.processed_sum / open.sums.count as f64,
            max_processed_value: open.sums.processed_max,
            baseline_mean: self.baseline.mean,
            baseline_std_dev: self.baseline.std_dev,
            threshold_at_detection: self.baseline.threshold,
        }
    }
}
