//! Measurement dataset access
//!
//! The engine only needs a narrow queryable surface from the measurement
//! store: response-time samples for an operation filter, DB activity samples
//! by process id and user count, and the raw range query used when closing
//! bucket-aggregated hiccups. CSV loading covers the semicolon-delimited
//! files the CLI consumes.

use anyhow::{Context, Result};
use std::path::Path;

use crate::db_correlation::{DbSample, RequestEvent};
use crate::detection::RangeQuery;
use crate::series::{Sample, Series};

/// Read access to a measurement store
pub trait MeasurementStore {
    /// All response-time samples, optionally filtered by operation name
    fn response_series(&self, operation: Option<&str>) -> Series;

    /// DB activity counter samples, optionally filtered by process id and
    /// concurrent-user count
    fn db_samples(&self, process_id: Option<&str>, num_users: Option<u32>) -> Vec<DbSample>;
}

/// One response-time record with its operation name
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub operation: String,
    pub sample: Sample,
}

/// One DB activity record with its process id and user-count parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DbRecord {
    pub process_id: String,
    pub num_users: u32,
    pub sample: DbSample,
}

/// In-memory measurement records backing tests and the CLI
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    response_records: Vec<ResponseRecord>,
    db_records: Vec<DbRecord>,
}

impl InMemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&mut self, operation: impl Into<String>, timestamp_ms: i64, value: f64) {
        self.response_records.push(ResponseRecord {
            operation: operation.into(),
            sample: Sample::new(timestamp_ms, value),
        });
    }

    pub fn push_db(
        &mut self,
        process_id: impl Into<String>,
        num_users: u32,
        timestamp_ms: i64,
        cumulative_queries: f64,
    ) {
        self.db_records.push(DbRecord {
            process_id: process_id.into(),
            num_users,
            sample: DbSample::new(timestamp_ms, cumulative_queries),
        });
    }
}

impl MeasurementStore for InMemoryDataset {
    fn response_series(&self, operation: Option<&str>) -> Series {
        self.response_records
            .iter()
            .filter(|r| operation.map_or(true, |op| r.operation == op))
            .map(|r| r.sample)
            .collect()
    }

    fn db_samples(&self, process_id: Option<&str>, num_users: Option<u32>) -> Vec<DbSample> {
        let mut samples: Vec<DbSample> = self
            .db_records
            .iter()
            .filter(|r| process_id.map_or(true, |pid| r.process_id == pid))
            .filter(|r| num_users.map_or(true, |n| r.num_users == n))
            .map(|r| r.sample)
            .collect();
        samples.sort_by_key(|s| s.timestamp_ms);
        samples
    }
}

impl RangeQuery for InMemoryDataset {
    fn raw_values_between(&self, start_ms: i64, end_ms: i64) -> Vec<f64> {
        self.response_series(None)
            .between(start_ms, end_ms)
            .iter()
            .map(|s| s.value)
            .collect()
    }
}

/// Load a response-time series from a semicolon CSV (`timestamp;value` after
/// a header row)
pub fn load_series_csv(path: &Path) -> Result<Series> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read series CSV {}", path.display()))?;
    let mut samples = Vec::new();
    for (line_number, line) in data_lines(&text) {
        let (first, second) = split_two(line, line_number)?;
        samples.push(Sample::new(
            parse_field(first, "timestamp", line_number)?,
            parse_field(second, "value", line_number)?,
        ));
    }
    Ok(Series::new(samples))
}

/// Load request events from a semicolon CSV (`start;end;operation` after a
/// header row); output is sorted by start timestamp
pub fn load_requests_csv(path: &Path) -> Result<Vec<RequestEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read requests CSV {}", path.display()))?;
    let mut requests = Vec::new();
    for (line_number, line) in data_lines(&text) {
        let mut fields = line.split(';');
        let (Some(start), Some(end), Some(operation)) =
            (fields.next(), fields.next(), fields.next())
        else {
            anyhow::bail!("line {}: expected start;end;operation", line_number);
        };
        requests.push(RequestEvent::new(
            parse_field(start, "start", line_number)?,
            parse_field(end, "end", line_number)?,
            operation.trim(),
        ));
    }
    requests.sort_by_key(|r| r.start_ms);
    Ok(requests)
}

/// Load DB activity samples from a semicolon CSV (`timestamp;queries` after a
/// header row); output is sorted by timestamp
pub fn load_db_samples_csv(path: &Path) -> Result<Vec<DbSample>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read DB samples CSV {}", path.display()))?;
    let mut samples = Vec::new();
    for (line_number, line) in data_lines(&text) {
        let (first, second) = split_two(line, line_number)?;
        samples.push(DbSample::new(
            parse_field(first, "timestamp", line_number)?,
            parse_field(second, "queries", line_number)?,
        ));
    }
    samples.sort_by_key(|s| s.timestamp_ms);
    Ok(samples)
}

/// Non-empty data lines with their 1-based line numbers, header skipped
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .skip(1)
}

fn split_two(line: &str, line_number: usize) -> Result<(&str, &str)> {
    line.split_once(';')
        .with_context(|| format!("line {}: expected two semicolon-separated fields", line_number))
}

fn parse_field<T: std::str::FromStr>(field: &str, name: &str, line_number: usize) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    field
        .trim()
        .parse()
        .with_context(|| format!("line {}: invalid {} {:?}", line_number, name, field))
}
