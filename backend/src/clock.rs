//! Time sources for cache expiry and the historical/live cutover.
//!
//! Engine code never reads the wall clock directly; the facade asks a
//! [`Clock`] and passes the answer down. Tests use [`ManualClock`].

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Source of "now" for expiry and of "today" for the cutover.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for TTL expiry.
    fn now(&self) -> Instant;

    /// Calendar date used as the cutover between historical and live data.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time in the server's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// System time for expiry, with a fixed cutover date.
///
/// Used when the configuration pins the cutover (staging, replaying a report).
#[derive(Debug, Clone, Copy)]
pub struct FixedCutoverClock {
    cutover: NaiveDate,
}

impl FixedCutoverClock {
    pub fn new(cutover: NaiveDate) -> Self {
        Self { cutover }
    }
}

impl Clock for FixedCutoverClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        self.cutover
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug)]
struct ManualState {
    elapsed: Duration,
    today: NaiveDate,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            base: Instant::now(),
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                today,
            }),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.state.lock().elapsed += by;
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.state.lock().today = today;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.state.lock().elapsed
    }

    fn today(&self) -> NaiveDate {
        self.state.lock().today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_moves_only_when_advanced() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();
        let clock = ManualClock::new(today);
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now() - start, Duration::from_secs(2));

        let tomorrow = today.succ_opt().unwrap();
        clock.set_today(tomorrow);
        assert_eq!(clock.today(), tomorrow);
    }

    #[test]
    fn test_fixed_cutover() {
        let cutover = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(FixedCutoverClock::new(cutover).today(), cutover);
    }
}
