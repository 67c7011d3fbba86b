#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! Lightweight atomics keep the latest readings and failure counters. The
//! periodic health summary reads them through [`snapshot`], and a debugger can
//! inspect them without stopping the polling task.

use acs712_core::poller::CycleReport;
use portable_atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

/// Cycles completed since boot.
static CYCLES: AtomicU32 = AtomicU32::new(0);
/// Conversions that failed since boot.
static FAILED_READS: AtomicU32 = AtomicU32::new(0);
/// Last reported current in milliamps.
static LAST_MILLIAMPS: AtomicI32 = AtomicI32::new(0);
/// Last reported sensor output in millivolts.
static LAST_MILLIVOLTS: AtomicI32 = AtomicI32::new(0);
/// Whether the last cycle came from two successful conversions.
static LAST_VALID: AtomicBool = AtomicBool::new(false);

/// Point-in-time copy of the stored metrics.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub cycles: u32,
    pub failed_reads: u32,
    pub milliamps: i32,
    pub millivolts: i32,
    pub last_valid: bool,
}

#[allow(clippy::cast_possible_truncation)]
fn to_milli(value: f32) -> i32 {
    // `as` saturates, so out-of-range values pin to i32::MIN/MAX.
    (value * 1_000.0) as i32
}

/// Stores the readings of a completed cycle.
pub fn record_cycle(report: &CycleReport) {
    LAST_MILLIAMPS.store(to_milli(report.current.value), Ordering::Relaxed);
    LAST_MILLIVOLTS.store(to_milli(report.voltage.value), Ordering::Relaxed);
    LAST_VALID.store(report.is_valid(), Ordering::Relaxed);
    CYCLES.fetch_add(1, Ordering::Relaxed);
}

/// Counts a failed conversion.
pub fn record_failure() {
    FAILED_READS.fetch_add(1, Ordering::Relaxed);
}

/// Builds a [`StatusSnapshot`] from the stored metrics.
pub fn snapshot() -> StatusSnapshot {
    StatusSnapshot {
        cycles: CYCLES.load(Ordering::Relaxed),
        failed_reads: FAILED_READS.load(Ordering::Relaxed),
        milliamps: LAST_MILLIAMPS.load(Ordering::Relaxed),
        millivolts: LAST_MILLIVOLTS.load(Ordering::Relaxed),
        last_valid: LAST_VALID.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acs712_core::sensor::{Reading, SampleStatus};

    #[test]
    fn milli_conversion_saturates() {
        assert_eq!(to_milli(-1.25), -1_250);
        assert_eq!(to_milli(7.5), 7_500);
        assert_eq!(to_milli(f32::MAX), i32::MAX);
    }

    // Other tests publish through the same statics, so only monotonic
    // counters are compared against the earlier snapshot.
    #[test]
    fn snapshot_tracks_latest_cycle() {
        let before = snapshot();

        let report = CycleReport {
            cycle: 0,
            current: Reading {
                raw: 2_048,
                value: -1.25,
                status: SampleStatus::Adc,
            },
            voltage: Reading {
                raw: 0,
                value: 0.0,
                status: SampleStatus::Fallback,
            },
        };
        record_failure();
        record_cycle(&report);

        let after = snapshot();
        assert!(after.cycles > before.cycles);
        assert!(after.failed_reads > before.failed_reads);
    }
}
