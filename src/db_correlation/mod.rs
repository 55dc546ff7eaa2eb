// DB-activity correlation
//
// Two independent analyses over database measurement series: a sweep-line
// correlator that attributes cumulative query counts to individual requests
// without double-counting, and a per-user-count lock-statistics aggregator.
//
// Key Insight: a DB counter sample between two overlapping request windows
// cannot be attributed to either request; such requests are skipped, not
// guessed at.

mod attribution;
mod lock_stats;

pub use attribution::{
    correlate_db_activity, DbSample, PerOperationDbStat, RequestEvent,
};
pub use lock_stats::{aggregate_lock_stats, process_ids, LockSample, LockStatsRow};
