//! Semicolon-delimited CSV export for lock statistics
//!
//! Two-column exports with a header row (`NumUsers;LockWaits` or
//! `NumUsers;LockTime`), one data row per distinct concurrent-user count,
//! values rendered as decimal text.

use crate::db_correlation::LockStatsRow;

const SEPARATOR: char = ';';

/// Which lock metric a CSV export carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockColumn {
    /// Average lock waits per user count
    Waits,
    /// Average lock hold time per user count
    Time,
}

impl LockColumn {
    fn header(self) -> &'static str {
        match self {
            LockColumn::Waits => "NumUsers;LockWaits",
            LockColumn::Time => "NumUsers;LockTime",
        }
    }

    fn value(self, row: &LockStatsRow) -> f64 {
        match self {
            LockColumn::Waits => row.avg_lock_waits,
            LockColumn::Time => row.avg_lock_time_ms,
        }
    }
}

/// Render lock statistics rows as a two-column semicolon CSV
pub fn lock_stats_to_csv(rows: &[LockStatsRow], column: LockColumn) -> String {
    let mut output = String::new();
    output.push_str(column.header());
    output.push('\n');

    for row in rows {
        output.push_str(&row.num_users.to_string());
        output.push(SEPARATOR);
        output.push_str(&format_decimal(column.value(row)));
        output.push('\n');
    }

    output
}

/// Decimal text without a forced fraction: `3` stays `3`, `42.5` stays `42.5`
fn format_decimal(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<LockStatsRow> {
        vec![
            LockStatsRow {
                num_users: 10,
                avg_lock_waits: 3.0,
                avg_lock_time_ms: 150.0,
            },
            LockStatsRow {
                num_users: 50,
                avg_lock_waits: 8.5,
                avg_lock_time_ms: 712.25,
            },
        ]
    }

    #[test]
    fn test_lock_waits_csv() {
        let csv = lock_stats_to_csv(&rows(), LockColumn::Waits);
        assert_eq!(csv, "NumUsers;LockWaits\n10;3\n50;8.5\n");
    }

    #[test]
    fn test_lock_time_csv() {
        let csv = lock_stats_to_csv(&rows(), LockColumn::Time);
        assert_eq!(csv, "NumUsers;LockTime\n10;150\n50;712.25\n");
    }

    #[test]
    fn test_empty_rows_only_header() {
        let csv = lock_stats_to_csv(&[], LockColumn::Waits);
        assert_eq!(csv, "NumUsers;LockWaits\n");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(3.0), "3");
        assert_eq!(format_decimal(42.5), "42.5");
    }
}
