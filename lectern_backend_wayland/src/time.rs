// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic clock reads and conversions to poll timeouts.

use lectern_core::time::{Duration, HostTime};
use rustix::time::{ClockId, Timespec, clock_gettime};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Returns the current `CLOCK_MONOTONIC` time in nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    host_time(clock_gettime(ClockId::Monotonic))
}

/// Nanoseconds since the clock's epoch. Negative fields count as zero.
fn host_time(ts: Timespec) -> HostTime {
    let secs = u64::try_from(ts.tv_sec).unwrap_or(0);
    let subsec = u64::try_from(ts.tv_nsec).unwrap_or(0).min(NANOS_PER_SEC - 1);
    HostTime(
        secs.checked_mul(NANOS_PER_SEC)
            .and_then(|ns| ns.checked_add(subsec))
            .unwrap_or(u64::MAX),
    )
}

/// Converts a wait bound into the relative timeout `poll(2)` expects.
pub(crate) fn duration_to_timespec(duration: Duration) -> Timespec {
    Timespec {
        tv_sec: i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
        tv_nsec: i64::from(duration.subsec_nanos()),
    }
}

#[cfg(test)]
mod tests {
    use super::{duration_to_timespec, host_time, now};
    use lectern_core::time::{Duration, HostTime};
    use rustix::time::Timespec;

    #[test]
    fn clock_never_goes_backwards() {
        let a = now();
        let b = now();
        assert!(b >= a, "CLOCK_MONOTONIC went from {a:?} to {b:?}");
    }

    #[test]
    fn seconds_and_nanos_combine() {
        let input = Timespec {
            tv_sec: 12,
            tv_nsec: 345_678_901,
        };
        assert_eq!(
            host_time(input),
            HostTime(12 * 1_000_000_000 + 345_678_901)
        );
    }

    #[test]
    fn huge_timespec_saturates() {
        let input = Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 999_999_999,
        };
        assert_eq!(host_time(input), HostTime(u64::MAX));
    }

    #[test]
    fn timeout_splits_seconds_and_nanos() {
        let ts = duration_to_timespec(Duration(2_500_000_001));
        assert_eq!((ts.tv_sec, ts.tv_nsec), (2, 500_000_001));
    }

    #[test]
    fn unbounded_timeout_clamps_seconds() {
        let ts = duration_to_timespec(Duration::MAX);
        assert_eq!(ts.tv_sec, 18_446_744_073, "u64::MAX ns fits i64 seconds");
    }
}
