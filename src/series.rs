//! Foundational time-series types for response-time analysis
//!
//! Every detection strategy and the DB correlator consume a `Series`:
//! timestamp-ordered `(millisecond, f64)` pairs. Construction sorts its
//! input, so downstream code can rely on non-decreasing timestamps.

use serde::{Deserialize, Serialize};

/// A single measurement: timestamp in milliseconds plus a 64-bit float value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Measured value (response time in milliseconds for request series)
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// Timestamp-ordered sequence of samples
///
/// Invariant: non-decreasing by timestamp. Duplicate timestamps are allowed;
/// the stable construction sort keeps their relative input order.
///
/// # Example
/// ```
/// use hipo::series::Series;
///
/// let series = Series::from_pairs([(30, 3.0), (10, 1.0), (20, 2.0)]);
/// assert_eq!(series.len(), 3);
/// assert_eq!(series.first().unwrap().timestamp_ms, 10);
/// assert_eq!(series.last().unwrap().timestamp_ms, 30);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    /// Build a series from unsorted samples
    pub fn new(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp_ms);
        Self { samples }
    }

    /// Build a series from `(timestamp_ms, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(timestamp_ms, value)| Sample::new(timestamp_ms, value))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Values in timestamp order
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// All samples with timestamps in `[start_ms, end_ms]` (inclusive)
    ///
    /// Binary search on the sorted timestamps, so this stays cheap even when
    /// the segmenter re-queries raw values for every closed hiccup.
    pub fn between(&self, start_ms: i64, end_ms: i64) -> &[Sample] {
        if end_ms < start_ms {
            return &[];
        }
        let lo = self.samples.partition_point(|s| s.timestamp_ms < start_ms);
        let hi = self.samples.partition_point(|s| s.timestamp_ms <= end_ms);
        &self.samples[lo..hi]
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
