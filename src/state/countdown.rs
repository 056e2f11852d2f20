//! Wall-clock anchored countdown arithmetic
//!
//! Remaining time is always derived from an absolute end timestamp. A tick that
//! fires late (throttled, suspended, backgrounded) simply observes a later `now`
//! and the countdown catches up on its own.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::Utc;

/// Source of wall-clock time in epoch milliseconds
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> i64;
}

/// Real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Clones share the same underlying instant, so a test can keep one handle and
/// give another to the authority.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.fetch_add(secs * 1000, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set_ms(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// `ceil((target - now) / 1000)`, never below zero
pub fn remaining_seconds(target_end_ms: i64, now_ms: i64) -> u32 {
    let diff = target_end_ms.saturating_sub(now_ms);
    if diff <= 0 {
        return 0;
    }
    let secs = (diff + 999) / 1000;
    u32::try_from(secs).unwrap_or(u32::MAX)
}

/// End timestamp for a countdown of `remaining_seconds` starting at `now_ms`
pub fn target_end(now_ms: i64, remaining_seconds: u32) -> i64 {
    now_ms.saturating_add(i64::from(remaining_seconds) * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_partial_seconds_up() {
        assert_eq!(remaining_seconds(10_000, 0), 10);
        assert_eq!(remaining_seconds(10_000, 1), 10);
        assert_eq!(remaining_seconds(10_000, 999), 10);
        assert_eq!(remaining_seconds(10_000, 1_000), 9);
        assert_eq!(remaining_seconds(10_000, 9_999), 1);
    }

    #[test]
    fn clamps_at_zero_after_target() {
        assert_eq!(remaining_seconds(10_000, 10_000), 0);
        assert_eq!(remaining_seconds(10_000, 25_000), 0);
    }

    #[test]
    fn skipped_ticks_do_not_accumulate_drift() {
        let clock = ManualClock::new(1_000_000);
        let target = target_end(clock.now_ms(), 10);

        // No intermediate ticks observed at all
        clock.advance_secs(15);
        assert_eq!(remaining_seconds(target, clock.now_ms()), 0);
    }

    #[test]
    fn target_end_round_trips_whole_seconds() {
        let now = 1_700_000_000_000;
        let target = target_end(now, 1400);
        assert_eq!(target - now, 1_400_000);
        assert_eq!(remaining_seconds(target, now), 1400);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new(0);
        let b = a.clone();
        a.advance_ms(250);
        assert_eq!(b.now_ms(), 250);
        b.set_ms(5);
        assert_eq!(a.now_ms(), 5);
    }
}
