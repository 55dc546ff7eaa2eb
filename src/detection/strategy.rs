// Strategy dispatch: five interchangeable hiccup detection pipelines
//
// The set is closed and selected by a configuration key; each strategy wires
// outlier filter, noise filter, aggregator, threshold and segmenter in its
// own combination. Two asymmetries are intentional and must not be unified:
// the center-of-gravity strategy fixes its deviation factor at 2.0, and the
// combined noise-and-outlier strategy thresholds on the maximum retained
// baseline value instead of mean + k*std_dev.

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::detection::segmenter::{DetectionPoint, Hiccup, HiccupSegmenter, RangeQuery};
use crate::detection::threshold::BaselineStats;
use crate::detection::{aggregate, noise, outlier, DetectionError, Result};
use crate::series::Series;
use crate::stats;

/// Deviation factor fixed for the center-of-gravity strategy; the configured
/// outlier_deviation_factor is intentionally not used here
const CENTER_OF_GRAVITY_DEVIATION_FACTOR: f64 = 2.0;

/// Closed set of detection strategies, selected by configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Centered moving average thresholded against the IQR-filtered raw
    /// baseline
    MovingAverage,
    /// Bucketed top-N mean with raw-dataset re-query on hiccup close
    BucketedTopN,
    /// Inverse-distance weighted center of gravity (deviation factor 2.0)
    CenterOfGravity,
    /// Denoised raw series thresholded against its IQR-filtered baseline
    NoiseReduction,
    /// Noise survivors thresholded at the maximum IQR-retained value
    NoiseAndOutlier,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::MovingAverage,
        Strategy::BucketedTopN,
        Strategy::CenterOfGravity,
        Strategy::NoiseReduction,
        Strategy::NoiseAndOutlier,
    ];

    /// Configuration key for this strategy
    pub fn key(self) -> &'static str {
        match self {
            Strategy::MovingAverage => "moving_average",
            Strategy::BucketedTopN => "bucketed_top_n",
            Strategy::CenterOfGravity => "center_of_gravity",
            Strategy::NoiseReduction => "noise_reduction",
            Strategy::NoiseAndOutlier => "noise_and_outlier",
        }
    }

    /// Resolve a configuration key to a strategy
    pub fn from_key(key: &str) -> Option<Strategy> {
        Strategy::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Output of one end-to-end strategy run
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub strategy: Strategy,
    /// Baseline diagnostics the threshold was derived from
    pub baseline: BaselineStats,
    /// Detected hiccups, ascending by start timestamp
    pub hiccups: Vec<Hiccup>,
    /// The processed detection signal (for chart rendering)
    pub signal: Series,
}

impl DetectionReport {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("Strategy: {}\n", self.strategy));
        report.push_str(&format!(
            "Baseline: mean={:.2} std_dev={:.2} threshold={:.2}\n",
            self.baseline.mean, self.baseline.std_dev, self.baseline.threshold
        ));

        if self.hiccups.is_empty() {
            report.push_str("No hiccups detected\n");
            return report;
        }

        report.push_str(&format!("Hiccups detected: {}\n", self.hiccups.len()));
        for (i, hiccup) in self.hiccups.iter().enumerate() {
            report.push_str(&format!(
                "  {}. [{} - {}] ({} ms) raw avg={:.1} max={:.1}, signal avg={:.1} max={:.1}\n",
                i + 1,
                hiccup.start_timestamp_ms,
                hiccup.end_timestamp_ms,
                hiccup.duration_ms(),
                hiccup.avg_raw_response_time,
                hiccup.max_raw_response_time,
                hiccup.avg_processed_value,
                hiccup.max_processed_value,
            ));
        }
        report
    }
}

/// Run one detection strategy end to end
///
/// The raw series itself backs the range query the bucket strategy needs when
/// closing a hiccup; use [`detect_hiccups_with_store`] to re-query an
/// external dataset instead.
///
/// # Example
/// ```
/// use hipo::config::DetectionConfig;
/// use hipo::detection::{detect_hiccups, Strategy};
/// use hipo::series::Series;
///
/// let mut pairs: Vec<(i64, f64)> = (0..60).map(|i| (i * 1000, 100.0 + (i % 2) as f64)).collect();
/// for p in pairs.iter_mut().skip(25).take(10) {
///     p.1 = 900.0;
/// }
/// let series = Series::from_pairs(pairs);
/// let report = detect_hiccups(&series, &DetectionConfig::default(), Strategy::MovingAverage).unwrap();
/// assert_eq!(report.hiccups.len(), 1);
/// ```
pub fn detect_hiccups(
    series: &Series,
    config: &DetectionConfig,
    strategy: Strategy,
) -> Result<DetectionReport> {
    detect_hiccups_with_store(series, config, strategy, series)
}

/// Run one detection strategy, re-querying raw response times from `store`
/// when the bucket strategy closes a hiccup
pub fn detect_hiccups_with_store(
    series: &Series,
    config: &DetectionConfig,
    strategy: Strategy,
    store: &dyn RangeQuery,
) -> Result<DetectionReport> {
    config.validate().map_err(DetectionError::InvalidConfig)?;

    tracing::debug!(strategy = %strategy, samples = series.len(), "running detection");

    match strategy {
        Strategy::MovingAverage => run_moving_average(series, config),
        Strategy::BucketedTopN => run_bucketed_top_n(series, config, store),
        Strategy::CenterOfGravity => run_center_of_gravity(series, config),
        Strategy::NoiseReduction => run_noise_reduction(series, config),
        Strategy::NoiseAndOutlier => run_noise_and_outlier(series, config),
    }
}

/// Dispatch by configuration key (see [`Strategy::from_key`])
pub fn detect_hiccups_for_key(
    series: &Series,
    config: &DetectionConfig,
    key: &str,
) -> Result<DetectionReport> {
    let strategy =
        Strategy::from_key(key).ok_or_else(|| DetectionError::UnknownStrategy(key.to_string()))?;
    detect_hiccups(series, config, strategy)
}

fn run_moving_average(series: &Series, config: &DetectionConfig) -> Result<DetectionReport> {
    let points = aggregate::moving_average(series, config.moving_average_window_size);
    let baseline_values = outlier::filter_outliers(&series.values());
    let baseline = BaselineStats::from_baseline(
        &baseline_values,
        config.outlier_deviation_factor,
        config.min_deviation_from_mean_factor,
    );
    let hiccups = HiccupSegmenter::new(config.inter_hiccup_threshold_ms, baseline).segment(&points);
    Ok(report(Strategy::MovingAverage, baseline, hiccups, &points))
}

fn run_bucketed_top_n(
    series: &Series,
    config: &DetectionConfig,
    store: &dyn RangeQuery,
) -> Result<DetectionReport> {
    let points = aggregate::bucketed_top_n(series, config);
    let baseline_values = outlier::filter_outliers(&series.values());
    let baseline = BaselineStats::from_baseline(
        &baseline_values,
        config.outlier_deviation_factor,
        config.min_deviation_from_mean_factor,
    );
    let hiccups = HiccupSegmenter::new(config.inter_hiccup_threshold_ms, baseline)
        .with_range_query(store)
        .segment(&points);
    Ok(report(Strategy::BucketedTopN, baseline, hiccups, &points))
}

fn run_center_of_gravity(series: &Series, config: &DetectionConfig) -> Result<DetectionReport> {
    let points = aggregate::center_of_gravity(series, config)?;
    let signal_values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let baseline_values = outlier::filter_outliers(&signal_values);
    let baseline = BaselineStats::from_baseline(
        &baseline_values,
        CENTER_OF_GRAVITY_DEVIATION_FACTOR,
        config.min_deviation_from_mean_factor,
    );
    let hiccups = HiccupSegmenter::new(config.inter_hiccup_threshold_ms, baseline).segment(&points);
    Ok(report(Strategy::CenterOfGravity, baseline, hiccups, &points))
}

fn run_noise_reduction(series: &Series, config: &DetectionConfig) -> Result<DetectionReport> {
    let denoised = noise::filter_noise(series, config);
    let points = raw_points(&denoised);
    let baseline_values = outlier::filter_outliers(&denoised.values());
    let baseline = BaselineStats::from_baseline(
        &baseline_values,
        config.outlier_deviation_factor,
        config.min_deviation_from_mean_factor,
    );
    let hiccups = HiccupSegmenter::new(config.inter_hiccup_threshold_ms, baseline).segment(&points);
    Ok(report(Strategy::NoiseReduction, baseline, hiccups, &points))
}

fn run_noise_and_outlier(series: &Series, config: &DetectionConfig) -> Result<DetectionReport> {
    let denoised = noise::filter_noise(series, config);
    let points = raw_points(&denoised);
    let split = outlier::split_outliers(&denoised.values());
    // Effective threshold is the maximum retained baseline value. Membership
    // is strict exceedance: a noise survivor above every retained value is
    // exactly one the IQR filter excluded on the high side, i.e. locally
    // stable yet statistically extreme.
    let threshold = stats::max(&split.retained);
    let baseline = BaselineStats::with_threshold(
        stats::mean(&split.retained),
        stats::std_dev(&split.retained),
        threshold,
    );
    let hiccups = HiccupSegmenter::new(config.inter_hiccup_threshold_ms, baseline)
        .segment_by(&points, |value| value > threshold);
    Ok(report(Strategy::NoiseAndOutlier, baseline, hiccups, &points))
}

/// Detection points whose signal is the raw (denoised) sample value itself
fn raw_points(denoised: &Series) -> Vec<DetectionPoint> {
    denoised
        .iter()
        .map(|s| DetectionPoint::from_raw(s.timestamp_ms, s.value))
        .collect()
}

fn report(
    strategy: Strategy,
    baseline: BaselineStats,
    hiccups: Vec<Hiccup>,
    points: &[DetectionPoint],
) -> DetectionReport {
    let signal = points
        .iter()
        .map(|p| crate::series::Sample::new(p.timestamp_ms, p.value))
        .collect();
    DetectionReport {
        strategy,
        baseline,
        hiccups,
        signal,
    }
}
