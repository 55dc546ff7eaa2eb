//! Detection configuration: defaults, validation, property lookup
//!
//! `DetectionConfig` is an immutable value handed into every strategy call;
//! there is no process-wide configuration state. Every key has a documented
//! default and a missing key falls back to it instead of erroring.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Property key for the strategy selection (see `Strategy::from_key`)
pub const KEY_STRATEGY: &str = "detection.strategy";

pub const KEY_OUTLIER_DEVIATION_FACTOR: &str = "outlier.deviation.factor";
pub const KEY_MIN_DEVIATION_FROM_MEAN_FACTOR: &str = "min.deviation.from.mean.factor";
pub const KEY_INTER_HICCUP_THRESHOLD_MS: &str = "inter.hiccup.threshold.ms";
pub const KEY_MOVING_AVERAGE_WINDOW_SIZE: &str = "moving.average.window.size";
pub const KEY_NUM_TOP_RESPONSE_TIMES: &str = "num.top.response.times";
pub const KEY_WEIGHT_CALCULATION_WINDOW_SIZE: &str = "weight.calculation.window.size";
pub const KEY_CENTER_OF_GRAVITY_WINDOW_SIZE: &str = "center.of.gravity.window.size";
pub const KEY_NOISE_THRESHOLD: &str = "noise.threshold";
pub const KEY_NOISE_PERCENTILE: &str = "noise.percentile";

/// Configuration for one detection run
///
/// Loaded once from the external configuration source and immutable for the
/// run. Strategies read only the fields they use.
///
/// # Example
/// ```
/// use hipo::config::DetectionConfig;
///
/// let config = DetectionConfig::default();
/// assert_eq!(config.outlier_deviation_factor, 3.0);
/// assert_eq!(config.moving_average_window_size, 11);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Deviation factor `k` in `threshold = mean + k * std_dev`
    pub outlier_deviation_factor: f64,

    /// Relative floor `f` in `threshold >= mean + f * mean`
    pub min_deviation_from_mean_factor: f64,

    /// Maximum raw-timeline gap (ms) bridged inside one hiccup; a larger gap
    /// below threshold closes the open hiccup
    pub inter_hiccup_threshold_ms: i64,

    /// Centered smoothing window (odd sample count); also the bucket size for
    /// the bucketed top-N aggregator
    pub moving_average_window_size: usize,

    /// Top response times averaged per bucket (bucketed top-N strategy)
    pub num_top_response_times: usize,

    /// Neighborhood window for the noise metric and the center-of-gravity
    /// weight calculation
    pub weight_calculation_window_size: usize,

    /// Outer neighbor window for the center-of-gravity aggregator
    pub center_of_gravity_window_size: usize,

    /// Normalized noise metric cut; samples at or above it are dropped.
    /// A negative value switches the noise filter to percentile mode.
    pub noise_threshold: f64,

    /// Percentile (0..=1) used to derive the noise cut in percentile mode;
    /// negative means unused
    pub noise_percentile: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            outlier_deviation_factor: 3.0,
            min_deviation_from_mean_factor: 0.1,
            inter_hiccup_threshold_ms: 5000,
            moving_average_window_size: 11,
            num_top_response_times: 5,
            weight_calculation_window_size: 31,
            center_of_gravity_window_size: 101,
            noise_threshold: 0.5,
            noise_percentile: -1.0,
        }
    }
}

impl DetectionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.outlier_deviation_factor < 0.0 {
            return Err(format!(
                "outlier_deviation_factor must be non-negative, got {}",
                self.outlier_deviation_factor
            ));
        }

        if self.min_deviation_from_mean_factor < 0.0 {
            return Err(format!(
                "min_deviation_from_mean_factor must be non-negative, got {}",
                self.min_deviation_from_mean_factor
            ));
        }

        if self.inter_hiccup_threshold_ms < 0 {
            return Err(format!(
                "inter_hiccup_threshold_ms must be non-negative, got {}",
                self.inter_hiccup_threshold_ms
            ));
        }

        if self.moving_average_window_size == 0 || self.moving_average_window_size % 2 == 0 {
            return Err(format!(
                "moving_average_window_size must be an odd positive integer, got {}",
                self.moving_average_window_size
            ));
        }

        if self.num_top_response_times == 0 {
            return Err("num_top_response_times must be at least 1".to_string());
        }

        if self.weight_calculation_window_size == 0 {
            return Err("weight_calculation_window_size must be at least 1".to_string());
        }

        if self.center_of_gravity_window_size == 0 {
            return Err("center_of_gravity_window_size must be at least 1".to_string());
        }

        if self.noise_threshold < 0.0 && !(0.0..=1.0).contains(&self.noise_percentile) {
            return Err(format!(
                "percentile mode needs noise_percentile in [0, 1], got {}",
                self.noise_percentile
            ));
        }

        Ok(())
    }

    /// Build a configuration from a flat property source
    ///
    /// Unknown keys are ignored and missing keys keep their defaults, so an
    /// embedder's wider property store can be passed through as-is.
    pub fn from_properties<P: PropertySource + ?Sized>(properties: &P) -> Self {
        let defaults = Self::default();
        Self {
            outlier_deviation_factor: properties.get_property_as_f64(
                KEY_OUTLIER_DEVIATION_FACTOR,
                defaults.outlier_deviation_factor,
            ),
            min_deviation_from_mean_factor: properties.get_property_as_f64(
                KEY_MIN_DEVIATION_FROM_MEAN_FACTOR,
                defaults.min_deviation_from_mean_factor,
            ),
            inter_hiccup_threshold_ms: properties.get_property_as_i64(
                KEY_INTER_HICCUP_THRESHOLD_MS,
                defaults.inter_hiccup_threshold_ms,
            ),
            moving_average_window_size: properties.get_property_as_usize(
                KEY_MOVING_AVERAGE_WINDOW_SIZE,
                defaults.moving_average_window_size,
            ),
            num_top_response_times: properties.get_property_as_usize(
                KEY_NUM_TOP_RESPONSE_TIMES,
                defaults.num_top_response_times,
            ),
            weight_calculation_window_size: properties.get_property_as_usize(
                KEY_WEIGHT_CALCULATION_WINDOW_SIZE,
                defaults.weight_calculation_window_size,
            ),
            center_of_gravity_window_size: properties.get_property_as_usize(
                KEY_CENTER_OF_GRAVITY_WINDOW_SIZE,
                defaults.center_of_gravity_window_size,
            ),
            noise_threshold: properties
                .get_property_as_f64(KEY_NOISE_THRESHOLD, defaults.noise_threshold),
            noise_percentile: properties
                .get_property_as_f64(KEY_NOISE_PERCENTILE, defaults.noise_percentile),
        }
    }

    /// Parse a configuration from TOML text; absent keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Flat string-keyed property lookup with typed accessors
///
/// The engine treats the external configuration store as read-only key/value
/// data; the typed accessors apply per-key defaults on missing or unparsable
/// values.
pub trait PropertySource {
    fn get_property(&self, key: &str) -> Option<&str>;

    fn get_property_as_f64(&self, key: &str, default: f64) -> f64 {
        self.get_property(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_property_as_i64(&self, key: &str, default: i64) -> i64 {
        self.get_property(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_property_as_usize(&self, key: &str, default: usize) -> usize {
        self.get_property(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

impl PropertySource for HashMap<String, String> {
    fn get_property(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}
