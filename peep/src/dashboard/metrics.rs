//! Staleness policy for metrics snapshots
//!
//! The instrumented program overwrites the snapshot file every
//! [`SAMPLE_INTERVAL`](crate::domain::SAMPLE_INTERVAL). Once it exits or
//! stalls the file stops changing, and a snapshot older than the threshold
//! is hidden rather than shown as a frozen value.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::domain::MetricsSnapshot;

/// Served in place of a missing, unreadable or stale snapshot.
pub const EMPTY_METRICS: &str = "{}";

/// What to make of the bytes read from the snapshot file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotStatus {
    /// Recent enough to forward as-is
    Fresh(MetricsSnapshot),
    /// Well formed but older than the threshold
    Stale { age_ms: i64 },
    /// Not a complete snapshot
    Unreadable,
}

/// Classify `bytes` against the wall clock `now_ms`.
pub fn evaluate_snapshot(bytes: &[u8], now_ms: i64, stale_after: Duration) -> SnapshotStatus {
    let Ok(snapshot) = serde_json::from_slice::<MetricsSnapshot>(bytes) else {
        return SnapshotStatus::Unreadable;
    };
    let limit = i64::try_from(stale_after.as_millis()).unwrap_or(i64::MAX);
    let age_ms = now_ms.saturating_sub(snapshot.timestamp_ms);
    if age_ms > limit {
        SnapshotStatus::Stale { age_ms }
    } else {
        SnapshotStatus::Fresh(snapshot)
    }
}

/// Milliseconds since the Unix epoch, the clock the snapshots are stamped with.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::STALE_AFTER;

    fn snapshot_at(ts: i64) -> Vec<u8> {
        format!(
            r#"{{"alloc":1024,"totalAlloc":4096,"sys":8192,"numGC":3,"pauseTotal":120,"cpuPercent":12.5,"timestampMs":{ts}}}"#
        )
        .into_bytes()
    }

    #[test]
    fn test_recent_snapshot_is_fresh() {
        match evaluate_snapshot(&snapshot_at(10_000), 10_500, STALE_AFTER) {
            SnapshotStatus::Fresh(s) => {
                assert_eq!(s.num_gc, 3);
                assert!((s.cpu_percent - 12.5).abs() < f64::EPSILON);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(matches!(
            evaluate_snapshot(&snapshot_at(10_000), 12_000, STALE_AFTER),
            SnapshotStatus::Fresh(_)
        ));
        assert_eq!(
            evaluate_snapshot(&snapshot_at(10_000), 12_001, STALE_AFTER),
            SnapshotStatus::Stale { age_ms: 2001 }
        );
    }

    #[test]
    fn test_three_second_old_snapshot_is_stale() {
        assert_eq!(
            evaluate_snapshot(&snapshot_at(7_000), 10_000, STALE_AFTER),
            SnapshotStatus::Stale { age_ms: 3000 }
        );
    }

    #[test]
    fn test_garbage_and_partial_are_unreadable() {
        assert_eq!(evaluate_snapshot(b"not json", 0, STALE_AFTER), SnapshotStatus::Unreadable);
        assert_eq!(evaluate_snapshot(b"{\"alloc\":1", 0, STALE_AFTER), SnapshotStatus::Unreadable);
        assert_eq!(
            evaluate_snapshot(br#"{"alloc":1}"#, 0, STALE_AFTER),
            SnapshotStatus::Unreadable
        );
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
