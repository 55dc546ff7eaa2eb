// Response-time hiccup detection
//
// Pipeline: filter (outlier/noise) -> aggregate to a detection signal ->
// self-calibrated threshold -> segment threshold crossings into hiccups.
// Five interchangeable strategies wire these stages differently; the
// dispatcher selects one by configuration key and runs it end to end.
//
// Key Insight: statistical noise and one-off outliers must not open a
// hiccup; only a sustained rise of the smoothed signal above the
// self-calibrated baseline counts.

mod aggregate;
mod noise;
mod outlier;
mod segmenter;
mod strategy;
mod threshold;

pub use aggregate::{bucketed_top_n, center_of_gravity, moving_average};
pub use noise::{filter_noise, normalized_noise_metrics};
pub use outlier::{acceptance_bounds, filter_outliers, split_outliers, OutlierSplit};
pub use segmenter::{DetectionPoint, Hiccup, HiccupSegmenter, RangeQuery};
pub use strategy::{
    detect_hiccups, detect_hiccups_for_key, detect_hiccups_with_store, DetectionReport, Strategy,
};
pub use threshold::{BaselineStats, MIN_ABSOLUTE_DEVIATION_MS};

use thiserror::Error;

/// Errors for detection runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    /// Every center-of-gravity point collapsed to NaN or infinity
    #[error("empty detection series: no finite center-of-gravity point remained")]
    EmptyDetectionSeries,

    #[error("invalid detection config: {0}")]
    InvalidConfig(String),

    #[error("unknown detection strategy key: {0:?}")]
    UnknownStrategy(String),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
