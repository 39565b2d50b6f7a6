// The atomic-ish state machine underlying every cancellable wait in
// this crate: `Init -> StartingWait -> Waiting ->
// (HaveResult|Canceling) -> Resuming -> Resumed`.
//
// A `Mutex<AwaitState>` + `Condvar` stands in for the original's
// lock-free atomic version; correctness matters more than avoiding a
// futex here; the transition diagram is identical.
use std::sync::{Condvar, Mutex};

use utils::log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwaitOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AwaitState {
    Init,
    StartingWait,
    Waiting,
    HaveResult(AwaitOutcome),
    Canceling,
    Resumed,
}

/// A single-use rendezvous between a waiting thread and whatever
/// completes it (a timer firing, a signal being raised, or the
/// associated `StopToken` being cancelled).
pub struct Awaiter {
    state: Mutex<AwaitState>,
    cond: Condvar,
}

impl Awaiter {
    pub fn new() -> Self {
        Awaiter {
            state: Mutex::new(AwaitState::Init),
            cond: Condvar::new(),
        }
    }

    /// If cancellation has already landed, returns it immediately
    /// without ever blocking (the documented no-throw fast path for
    /// "cancellation before the await"). Otherwise transitions into
    /// `Waiting` and the caller should proceed to `block`.
    pub fn begin_wait(&self) -> Option<AwaitOutcome> {
        let mut state = self.state.lock().unwrap();
        match *state {
            AwaitState::Init => {
                *state = AwaitState::StartingWait;
            }
            other => log::fatal!("Awaiter::begin_wait called twice (state was {:?})", other),
        }
        *state = AwaitState::Waiting;
        None
    }

    /// Blocks until `complete` or `cancel` is called from another
    /// thread, then consumes the result.
    pub fn block(&self) -> AwaitOutcome {
        let mut state = self.state.lock().unwrap();
        loop {
            match *state {
                AwaitState::Waiting | AwaitState::StartingWait => {
                    state = self.cond.wait(state).unwrap();
                }
                AwaitState::HaveResult(outcome) => {
                    *state = AwaitState::Resumed;
                    return outcome;
                }
                AwaitState::Canceling => {
                    *state = AwaitState::Resumed;
                    return AwaitOutcome::Cancelled;
                }
                other => log::fatal!("Awaiter::block observed invalid state {:?}", other),
            }
        }
    }

    /// Called by the timer thread / signal raiser when the awaited
    /// event completes normally. A no-op if cancellation already won
    /// the race.
    pub fn complete(&self, outcome: AwaitOutcome) {
        let mut state = self.state.lock().unwrap();
        match *state {
            AwaitState::StartingWait | AwaitState::Waiting => {
                *state = AwaitState::HaveResult(outcome);
                self.cond.notify_all();
            }
            AwaitState::Canceling | AwaitState::HaveResult(_) | AwaitState::Resumed => {}
            AwaitState::Init => log::fatal!("Awaiter::complete called before begin_wait"),
        }
    }

    /// Called when the associated `StopToken` is cancelled.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        match *state {
            AwaitState::Init => {
                *state = AwaitState::HaveResult(AwaitOutcome::Cancelled);
            }
            AwaitState::StartingWait | AwaitState::Waiting => {
                *state = AwaitState::Canceling;
                self.cond.notify_all();
            }
            AwaitState::Canceling | AwaitState::HaveResult(_) | AwaitState::Resumed => {}
        }
    }
}

impl Default for Awaiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn completes_normally_when_no_cancellation_races_it() {
        let awaiter = Arc::new(Awaiter::new());
        assert!(awaiter.begin_wait().is_none());

        let a = Arc::clone(&awaiter);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            a.complete(AwaitOutcome::Completed);
        });

        assert_eq!(awaiter.block(), AwaitOutcome::Completed);
        handle.join().unwrap();
    }

    #[test]
    fn cancel_before_begin_wait_is_fast_path() {
        let awaiter = Awaiter::new();
        awaiter.cancel();
        assert!(awaiter.begin_wait().is_none());
        assert_eq!(awaiter.block(), AwaitOutcome::Cancelled);
    }

    #[test]
    fn cancel_after_begin_wait_wakes_the_blocked_thread() {
        let awaiter = Arc::new(Awaiter::new());
        awaiter.begin_wait();

        let a = Arc::clone(&awaiter);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            a.cancel();
        });

        assert_eq!(awaiter.block(), AwaitOutcome::Cancelled);
        handle.join().unwrap();
    }
}
