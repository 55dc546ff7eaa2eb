//! JSON report format for machine parsing

use serde::{Deserialize, Serialize};

use crate::db_correlation::PerOperationDbStat;
use crate::detection::{DetectionReport, Hiccup};

/// A single detected hiccup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonHiccup {
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_ms: i64,
    pub avg_raw_response_time: f64,
    pub max_raw_response_time: f64,
    pub avg_processed_value: f64,
    pub max_processed_value: f64,
}

impl From<&Hiccup> for JsonHiccup {
    fn from(hiccup: &Hiccup) -> Self {
        Self {
            start_ms: hiccup.start_timestamp_ms,
            end_ms: hiccup.end_timestamp_ms,
            duration_ms: hiccup.duration_ms(),
            avg_raw_response_time: hiccup.avg_raw_response_time,
            max_raw_response_time: hiccup.max_raw_response_time,
            avg_processed_value: hiccup.avg_processed_value,
            max_processed_value: hiccup.max_processed_value,
        }
    }
}

/// Baseline diagnostics of a detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonBaseline {
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
}

/// Full detection result of one strategy run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDetectionReport {
    /// Strategy configuration key
    pub strategy: String,
    pub baseline: JsonBaseline,
    pub hiccup_count: usize,
    pub hiccups: Vec<JsonHiccup>,
}

impl JsonDetectionReport {
    pub fn from_report(report: &DetectionReport) -> Self {
        Self {
            strategy: report.strategy.key().to_string(),
            baseline: JsonBaseline {
                mean: report.baseline.mean,
                std_dev: report.baseline.std_dev,
                threshold: report.baseline.threshold,
            },
            hiccup_count: report.hiccups.len(),
            hiccups: report.hiccups.iter().map(JsonHiccup::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Per-operation DB overhead verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDbOperationStat {
    pub operation: String,
    pub mean_queries_per_transaction: f64,
    pub min_queries: f64,
    pub max_queries: f64,
    pub detected: bool,
}

impl From<&PerOperationDbStat> for JsonDbOperationStat {
    fn from(stat: &PerOperationDbStat) -> Self {
        Self {
            operation: stat.operation.clone(),
            mean_queries_per_transaction: stat.mean_queries_per_transaction,
            min_queries: stat.min_queries,
            max_queries: stat.max_queries,
            detected: stat.detected(),
        }
    }
}

/// DB correlation result across all operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDbCorrelationReport {
    pub operations: Vec<JsonDbOperationStat>,
    /// True when any operation's overhead verdict fired
    pub detected: bool,
}

impl JsonDbCorrelationReport {
    pub fn from_stats(stats: &[PerOperationDbStat]) -> Self {
        let operations: Vec<JsonDbOperationStat> =
            stats.iter().map(JsonDbOperationStat::from).collect();
        let detected = operations.iter().any(|o| o.detected);
        Self {
            operations,
            detected,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
