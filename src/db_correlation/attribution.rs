// Sweep-line attribution of DB activity to request events
//
// A single forward-moving cursor walks the DB sample series once; it is
// never rewound below its last position. Requests whose attribution window
// cannot be isolated from a neighboring request are skipped silently.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::stats;

/// Mean queries/transaction at or above which DB overhead counts as detected
const DETECTION_MEAN_THRESHOLD: f64 = 3.0;
/// Query-count range at or above which DB overhead counts as detected
const DETECTION_RANGE_THRESHOLD: f64 = 3.0;

/// One application request event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    pub start_ms: i64,
    pub end_ms: i64,
    pub operation: String,
}

impl RequestEvent {
    pub fn new(start_ms: i64, end_ms: i64, operation: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            operation: operation.into(),
        }
    }
}

/// One DB activity sample: a cumulative query counter at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbSample {
    pub timestamp_ms: i64,
    pub cumulative_queries: f64,
}

impl DbSample {
    pub fn new(timestamp_ms: i64, cumulative_queries: f64) -> Self {
        Self {
            timestamp_ms,
            cumulative_queries,
        }
    }
}

/// Per-operation DB overhead statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerOperationDbStat {
    pub operation: String,
    pub mean_queries_per_transaction: f64,
    pub min_queries: f64,
    pub max_queries: f64,
}

impl PerOperationDbStat {
    pub fn range(&self) -> f64 {
        self.max_queries - self.min_queries
    }

    /// DB overhead verdict: `mean >= 3 || range >= 3`
    pub fn detected(&self) -> bool {
        self.mean_queries_per_transaction >= DETECTION_MEAN_THRESHOLD
            || self.range() >= DETECTION_RANGE_THRESHOLD
    }
}

/// Attribute DB query counts to requests with an unambiguous window
///
/// Both inputs must be sorted ascending by timestamp. For every request
/// except the first and last:
///
/// 1. the "before" sample is the last DB sample strictly before the request
///    start; the request is skipped when the previous request's end reaches
///    that sample,
/// 2. the "after" sample is the first DB sample at or past the request end;
///    the request is skipped when the next request's start reaches back to
///    that sample,
/// 3. otherwise `after - before` cumulative queries are attributed to the
///    request's operation.
///
/// Output is one stat per operation, sorted by operation name.
///
/// # Example
/// ```
/// use hipo::db_correlation::{correlate_db_activity, DbSample, RequestEvent};
///
/// let requests = vec![
///     RequestEvent::new(0, 10, "browse"),
///     RequestEvent::new(20, 30, "checkout"),
///     RequestEvent::new(40, 50, "browse"),
/// ];
/// let samples = vec![
///     DbSample::new(5, 0.0),
///     DbSample::new(15, 3.0),
///     DbSample::new(25, 3.0),
///     DbSample::new(35, 8.0),
///     DbSample::new(45, 8.0),
/// ];
/// let stats = correlate_db_activity(&requests, &samples);
/// assert_eq!(stats.len(), 1);
/// assert_eq!(stats[0].operation, "checkout");
/// assert_eq!(stats[0].mean_queries_per_transaction, 5.0);
/// ```
pub fn correlate_db_activity(
    requests: &[RequestEvent],
    db_samples: &[DbSample],
) -> Vec<PerOperationDbStat> {
    let mut per_operation: HashMap<String, Vec<f64>> = HashMap::new();

    if requests.len() >= 3 && !db_samples.is_empty() {
        let mut cursor = 0usize;

        for index in 1..requests.len() - 1 {
            let request = &requests[index];
            let previous = &requests[index - 1];
            let next = &requests[index + 1];

            while cursor < db_samples.len() && db_samples[cursor].timestamp_ms < request.start_ms {
                cursor += 1;
            }
            if cursor == 0 {
                // No DB sample precedes the request window
                continue;
            }
            let before = db_samples[cursor - 1];
            if previous.end_ms >= before.timestamp_ms {
                tracing::debug!(
                    operation = %request.operation,
                    start_ms = request.start_ms,
                    "skipping request: left attribution edge ambiguous"
                );
                continue;
            }

            while cursor < db_samples.len() && db_samples[cursor].timestamp_ms < request.end_ms {
                cursor += 1;
            }
            let Some(&after) = db_samples.get(cursor) else {
                // DB series exhausted; no later request can be attributed
                break;
            };
            if next.start_ms <= after.timestamp_ms {
                tracing::debug!(
                    operation = %request.operation,
                    end_ms = request.end_ms,
                    "skipping request: right attribution edge ambiguous"
                );
                continue;
            }

            let attributed = after.cumulative_queries - before.cumulative_queries;
            per_operation
                .entry(request.operation.clone())
                .or_default()
                .push(attributed);
        }
    }

    let mut out: Vec<PerOperationDbStat> = per_operation
        .into_iter()
        .map(|(operation, counts)| PerOperationDbStat {
            operation,
            mean_queries_per_transaction: stats::mean(&counts),
            min_queries: stats::min(&counts),
            max_queries: stats::max(&counts),
        })
        .collect();
    out.sort_by(|a, b| a.operation.cmp(&b.operation));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_requests() -> Vec<RequestEvent> {
        vec![
            RequestEvent::new(0, 10, "op"),
            RequestEvent::new(20, 30, "op"),
            RequestEvent::new(40, 50, "op"),
        ]
    }

    #[test]
    fn test_middle_request_attribution() {
        let samples = vec![
            DbSample::new(5, 0.0),
            DbSample::new(15, 3.0),
            DbSample::new(25, 3.0),
            DbSample::new(35, 8.0),
            DbSample::new(45, 8.0),
        ];
        let stats = correlate_db_activity(&fixture_requests(), &samples);
        assert_eq!(stats.len(), 1);
        // before = (15, 3), after = (35, 8)
        assert_eq!(stats[0].mean_queries_per_transaction, 5.0);
        assert_eq!(stats[0].min_queries, 5.0);
        assert_eq!(stats[0].max_queries, 5.0);
    }

    #[test]
    fn test_first_and_last_requests_never_attributed() {
        let samples = vec![DbSample::new(15, 3.0), DbSample::new(35, 8.0)];
        let requests = vec![
            RequestEvent::new(0, 10, "first"),
            RequestEvent::new(20, 30, "middle"),
            RequestEvent::new(40, 50, "last"),
        ];
        let stats = correlate_db_activity(&requests, &samples);
        assert!(stats.iter().all(|s| s.operation == "middle"));
    }

    #[test]
    fn test_left_edge_ambiguity_skips() {
        // Previous request ends at 15, exactly on the before sample
        let requests = vec![
            RequestEvent::new(0, 15, "op"),
            RequestEvent::new(20, 30, "op"),
            RequestEvent::new(40, 50, "op"),
        ];
        let samples = vec![
            DbSample::new(15, 3.0),
            DbSample::new(35, 8.0),
            DbSample::new(45, 9.0),
        ];
        let stats = correlate_db_activity(&requests, &samples);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_right_edge_ambiguity_skips() {
        // Next request starts at 35, exactly on the after sample
        let requests = vec![
            RequestEvent::new(0, 10, "op"),
            RequestEvent::new(20, 30, "op"),
            RequestEvent::new(35, 50, "op"),
        ];
        let samples = vec![DbSample::new(15, 3.0), DbSample::new(35, 8.0)];
        let stats = correlate_db_activity(&requests, &samples);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_no_sample_before_request_skips() {
        let requests = fixture_requests();
        // First DB sample arrives after the middle request starts
        let samples = vec![DbSample::new(25, 3.0), DbSample::new(35, 8.0)];
        let stats = correlate_db_activity(&requests, &samples);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_exhausted_db_series_skips_remaining() {
        let requests = vec![
            RequestEvent::new(0, 10, "op"),
            RequestEvent::new(20, 30, "op"),
            RequestEvent::new(40, 50, "op"),
            RequestEvent::new(60, 70, "op"),
            RequestEvent::new(80, 90, "op"),
        ];
        let samples = vec![DbSample::new(15, 3.0), DbSample::new(35, 8.0)];
        let stats = correlate_db_activity(&requests, &samples);
        // Only the request at (20, 30) has an after sample
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].mean_queries_per_transaction, 5.0);
    }

    #[test]
    fn test_adjacent_requests_attributed_independently() {
        let requests = vec![
            RequestEvent::new(0, 10, "op"),
            RequestEvent::new(20, 30, "pay"),
            RequestEvent::new(32, 45, "search"),
            RequestEvent::new(60, 70, "op"),
        ];
        let samples = vec![
            DbSample::new(15, 2.0),
            DbSample::new(31, 5.0),
            DbSample::new(50, 9.0),
            DbSample::new(75, 9.0),
        ];
        let stats = correlate_db_activity(&requests, &samples);
        // "pay" reads (15,2)->(31,5); "search" reads (31,5)->(50,9), with
        // the shared sample at t=31 counted toward exactly one request each
        let pay = stats.iter().find(|s| s.operation == "pay").unwrap();
        assert_eq!(pay.mean_queries_per_transaction, 3.0);
        let search = stats.iter().find(|s| s.operation == "search").unwrap();
        assert_eq!(search.mean_queries_per_transaction, 4.0);
    }

    #[test]
    fn test_detection_heuristic_mean() {
        let stat = PerOperationDbStat {
            operation: "op".to_string(),
            mean_queries_per_transaction: 3.6,
            min_queries: 1.0,
            max_queries: 10.0,
        };
        assert_eq!(stat.range(), 9.0);
        assert!(stat.detected());
    }

    #[test]
    fn test_detection_heuristic_range_only() {
        let stat = PerOperationDbStat {
            operation: "op".to_string(),
            mean_queries_per_transaction: 2.0,
            min_queries: 0.0,
            max_queries: 4.0,
        };
        assert!(stat.detected());
    }

    #[test]
    fn test_detection_heuristic_negative() {
        let stat = PerOperationDbStat {
            operation: "op".to_string(),
            mean_queries_per_transaction: 1.5,
            min_queries: 1.0,
            max_queries: 2.0,
        };
        assert!(!stat.detected());
    }

    #[test]
    fn test_fewer_than_three_requests_yield_nothing() {
        let requests = vec![
            RequestEvent::new(0, 10, "op"),
            RequestEvent::new(20, 30, "op"),
        ];
        let samples = vec![DbSample::new(15, 3.0), DbSample::new(35, 8.0)];
        assert!(correlate_db_activity(&requests, &samples).is_empty());
    }

    #[test]
    fn test_output_sorted_by_operation() {
        let requests = vec![
            RequestEvent::new(0, 10, "z"),
            RequestEvent::new(20, 30, "zeta"),
            RequestEvent::new(40, 50, "alpha"),
            RequestEvent::new(60, 70, "alpha"),
        ];
        let samples = vec![
            DbSample::new(15, 1.0),
            DbSample::new(33, 2.0),
            DbSample::new(52, 4.0),
            DbSample::new(75, 4.0),
        ];
        let stats = correlate_db_activity(&requests, &samples);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].operation, "alpha");
        assert_eq!(stats[1].operation, "zeta");
    }
}
