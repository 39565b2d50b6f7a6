// Helpers to handle budgeting subsystems based on time
//
// Austin Shafer - 2020 (style); OpenKneeboard contributors - timing
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn get_current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Error getting system time")
}

// Helper to get the current time in milliseconds
#[allow(dead_code)]
pub fn get_current_millis() -> u64 {
    get_current_time().as_millis() as u64
}

/// Manages subsystem timings
///
/// The motivation for this is frame callbacks, which need to run once
/// per frame. This struct tracks how much time is remaining before an
/// action needs to be called, and callers can use this number for
/// their timeout values or per-frame work budgets (see the ordered
/// APIEvent queue's per-frame time budget).
pub struct TimingManager {
    // length of time we are counting down from
    tm_period: Duration,
    // the last time we reset this manager
    tm_start: Duration,
}

impl TimingManager {
    // create a new manager to track time periods of length `period`
    pub fn new(period_ms: u64) -> TimingManager {
        TimingManager {
            tm_period: Duration::from_millis(period_ms),
            tm_start: get_current_time(),
        }
    }

    // Reset the manager to the current time
    pub fn reset(&mut self) {
        self.tm_start = get_current_time();
    }

    // Returns true if period ms have passed since this manager was reset
    pub fn is_overdue(&mut self) -> bool {
        get_current_time() - self.tm_start >= self.tm_period
    }

    // Returns the number of ms remaining in this tracker.
    //
    // If 0 is returned, it is overdue and should be reset.
    pub fn time_remaining(&mut self) -> Duration {
        if self.is_overdue() {
            return Duration::from_millis(0);
        }
        let elapsed = get_current_time() - self.tm_start;
        self.tm_period - elapsed
    }
}

// A stopclock for measuring time intervals
//
// The order of use MUST be `new`, `start`, `end` after that the
// recorded duration can be got with `get_duration`
#[allow(dead_code)]
pub struct StopWatch {
    sw_start: Duration,
    sw_end: Duration,
}

impl StopWatch {
    // Create an empty stopwatch
    pub fn new() -> StopWatch {
        StopWatch {
            sw_start: Duration::from_millis(0),
            sw_end: Duration::from_millis(0),
        }
    }

    pub fn start(&mut self) {
        self.sw_start = get_current_time();
    }

    pub fn end(&mut self) {
        self.sw_end = get_current_time();
    }

    pub fn get_duration(&mut self) -> Duration {
        self.sw_end - self.sw_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn timing_manager_becomes_overdue() {
        let mut tm = TimingManager::new(5);
        assert!(!tm.is_overdue());
        thread::sleep(Duration::from_millis(20));
        assert!(tm.is_overdue());
        assert_eq!(tm.time_remaining(), Duration::from_millis(0));
    }

    #[test]
    fn stopwatch_measures_elapsed_time() {
        let mut sw = StopWatch::new();
        sw.start();
        thread::sleep(Duration::from_millis(5));
        sw.end();
        assert!(sw.get_duration() >= Duration::from_millis(5));
    }
}
