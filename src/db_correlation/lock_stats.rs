// Per-user-count lock statistics
//
// Groups DB lock-wait counts and lock-hold durations by the concurrent-user
// count of the run, per DB process identifier; a plain grouped average with
// no sweep-line involvement.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats;

/// One DB lock sample from the measurement store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockSample {
    /// DB process identifier the sample belongs to
    pub process_id: String,
    /// Concurrent-user count of the run
    pub num_users: u32,
    /// Observed lock waits
    pub lock_waits: f64,
    /// Observed lock hold time in milliseconds
    pub lock_time_ms: f64,
}

/// Grouped averages for one distinct concurrent-user count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockStatsRow {
    pub num_users: u32,
    pub avg_lock_waits: f64,
    pub avg_lock_time_ms: f64,
}

/// Average lock waits and lock hold times per distinct user count
///
/// Restrict to one DB process with `process_id`, or pass `None` to aggregate
/// across all processes. Rows come out ascending by user count, one per
/// distinct value.
pub fn aggregate_lock_stats(samples: &[LockSample], process_id: Option<&str>) -> Vec<LockStatsRow> {
    let mut grouped: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();

    for sample in samples {
        if let Some(pid) = process_id {
            if sample.process_id != pid {
                continue;
            }
        }
        let (waits, times) = grouped.entry(sample.num_users).or_default();
        waits.push(sample.lock_waits);
        times.push(sample.lock_time_ms);
    }

    grouped
        .into_iter()
        .map(|(num_users, (waits, times))| LockStatsRow {
            num_users,
            avg_lock_waits: stats::mean(&waits),
            avg_lock_time_ms: stats::mean(&times),
        })
        .collect()
}

/// Distinct DB process identifiers present in the samples, sorted
pub fn process_ids(samples: &[LockSample]) -> Vec<String> {
    let mut ids: Vec<String> = samples.iter().map(|s| s.process_id.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}
