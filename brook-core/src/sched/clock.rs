//! Simulated clock
//!
//! Holds the run's monotonically increasing seconds counter and the frozen
//! wall-clock value derived from it. The counter only ever moves inside the
//! sleep cycle's completion step (`SimScheduler::tick_once`), exactly once
//! per completed cycle; everything else reads it lock-free.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// The simulated seconds counter plus its frozen wall-clock anchor.
pub struct SimClock {
    /// Wall-clock instant the run started at; never changes afterwards.
    start: SystemTime,
    elapsed: AtomicU64,
}

impl SimClock {
    pub(crate) fn new(start: SystemTime) -> Self {
        Self {
            start,
            elapsed: AtomicU64::new(0),
        }
    }

    /// Seconds elapsed since the start of the run.
    #[inline]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Acquire)
    }

    /// The frozen wall-clock value: run start plus elapsed simulated seconds.
    #[inline]
    pub fn now(&self) -> SystemTime {
        self.start + Duration::from_secs(self.elapsed_seconds())
    }

    /// Wall-clock instant the run started at.
    #[inline]
    pub fn start(&self) -> SystemTime {
        self.start
    }

    /// Advance by one second, returning the new value. Crate-private: only
    /// the sleep cycle's completion step may call this.
    pub(crate) fn advance(&self) -> u64 {
        self.elapsed.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_advances_by_one() {
        let clock = SimClock::new(SystemTime::UNIX_EPOCH);
        assert_eq!(clock.elapsed_seconds(), 0);
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        assert_eq!(clock.elapsed_seconds(), 2);
    }

    #[test]
    fn frozen_time_derives_from_start() {
        let clock = SimClock::new(SystemTime::UNIX_EPOCH);
        clock.advance();
        clock.advance();
        clock.advance();
        assert_eq!(
            clock.now(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(3)
        );
    }
}
