//! The cooperative task runtime.
//!
//! The original engine builds `task<T>` on top of C++ coroutines and a
//! Windows thread pool. This workspace's forebear never reached for an
//! async runtime either: `category5` runs each subsystem on its own
//! `std::thread` and communicates over channels. We keep that house
//! style rather than pulling in `tokio`/`async-std`: `task<T>` here is
//! a small handle over a dedicated OS thread plus a completion cell,
//! `resume_after` is serviced by one shared timer thread, and
//! `resume_on_signal` parks one waiter thread per outstanding wait.
//! See DESIGN.md for the Open Question this resolves.
pub mod awaiter;
pub mod stop;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use utils::log;

pub use stop::{StopSource, StopToken};

use awaiter::{AwaitOutcome, Awaiter};

/// The result of a `resume_after` wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerResult {
    Timeout,
    Cancelled,
}

/// The result of a `resume_on_signal` wait: `true` on signal,
/// `false` on cancel.
pub type SignalResult = bool;

/// A spawned unit of cooperative work. Awaiting it blocks the calling
/// thread until the task body returns; the result (or a captured
/// panic, rethrown as a `TaskError::Panicked`) is forwarded.
pub struct Task<T> {
    handle: Option<thread::JoinHandle<()>>,
    result: Arc<Mutex<Option<thread::Result<T>>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task body panicked: {0}")]
    Panicked(String),
}

impl<T: Send + 'static> Task<T> {
    /// Blocks the calling thread until the task body completes.
    pub fn join(mut self) -> Result<T, TaskError> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let result = self.result.lock().unwrap().take();
        match result {
            Some(Ok(value)) => Ok(value),
            Some(Err(panic)) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "<opaque panic payload>".to_string());
                Err(TaskError::Panicked(msg))
            }
            None => log::fatal!("Task::join called twice"),
        }
    }
}

/// Spawns `body` on a dedicated OS thread and returns a handle that can
/// be `join`ed for the result.
pub fn spawn<T, F>(name: &str, body: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let result = Arc::new(Mutex::new(None));
    let captured = Arc::clone(&result);
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(body));
            *captured.lock().unwrap() = Some(outcome);
        })
        .expect("failed to spawn task thread");
    Task {
        handle: Some(handle),
        result,
    }
}

/// Detaches `body` onto a dedicated OS thread without keeping a handle
/// to it. An uncaught panic in a `fire_and_forget` task is elevated to
/// `fatal!` unless it represents a `Cancelled` outcome (the caller is
/// expected to have already swallowed cancellation before it would
/// ever unwind).
pub fn fire_and_forget<F>(name: &str, body: F)
where
    F: FnOnce() + Send + 'static,
{
    let name = name.to_string();
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(body));
            if outcome.is_err() {
                log::fatal!("fire_and_forget task '{}' panicked", name);
            }
        })
        .expect("failed to spawn fire_and_forget thread");
}

/// One pending `resume_after` wait, ordered by deadline so the timer
/// thread's heap always pops the next thing to fire.
struct TimerEntry {
    deadline: Instant,
    awaiter: Arc<Awaiter>,
}

struct TimerQueue {
    heap: BinaryHeap<Reverse<(Instant, usize)>>,
    entries: std::collections::HashMap<usize, TimerEntry>,
    next_id: usize,
}

/// The shared timer thread.
struct TimerService {
    queue: Mutex<TimerQueue>,
    wake: Condvar,
}

impl TimerService {
    fn new() -> Arc<Self> {
        let service = Arc::new(TimerService {
            queue: Mutex::new(TimerQueue {
                heap: BinaryHeap::new(),
                entries: std::collections::HashMap::new(),
                next_id: 0,
            }),
            wake: Condvar::new(),
        });
        let worker = Arc::clone(&service);
        thread::Builder::new()
            .name("task-timer".to_string())
            .spawn(move || worker.run())
            .expect("failed to spawn shared timer thread");
        service
    }

    fn arm(self: &Arc<Self>, duration: Duration, awaiter: Arc<Awaiter>) {
        let mut queue = self.queue.lock().unwrap();
        let id = queue.next_id;
        queue.next_id += 1;
        let deadline = Instant::now() + duration;
        queue.heap.push(Reverse((deadline, id)));
        queue.entries.insert(id, TimerEntry { deadline, awaiter });
        self.wake.notify_all();
    }

    fn run(self: Arc<Self>) {
        loop {
            let mut queue = self.queue.lock().unwrap();
            loop {
                match queue.heap.peek() {
                    None => {
                        queue = self.wake.wait(queue).unwrap();
                    }
                    Some(Reverse((deadline, _))) => {
                        let now = Instant::now();
                        if *deadline <= now {
                            break;
                        }
                        let (q, _timeout) =
                            self.wake.wait_timeout(queue, *deadline - now).unwrap();
                        queue = q;
                    }
                }
            }
            let Reverse((_, id)) = queue.heap.pop().unwrap();
            let entry = queue.entries.remove(&id);
            drop(queue);
            if let Some(entry) = entry {
                entry.awaiter.complete(AwaitOutcome::Completed);
            }
        }
    }
}

lazy_static::lazy_static! {
    static ref TIMER_SERVICE: Arc<TimerService> = TimerService::new();
}

/// Arms a one-shot timer on the shared timer thread and blocks until
/// either `duration` elapses or `stop_token` is cancelled. Never
/// panics on cancellation.
pub fn resume_after(duration: Duration, stop_token: &StopToken) -> TimerResult {
    let awaiter = Arc::new(Awaiter::new());
    if let Some(outcome) = awaiter.begin_wait() {
        return to_timer_result(outcome);
    }
    stop_token.register(&awaiter);
    TIMER_SERVICE.arm(duration, Arc::clone(&awaiter));
    to_timer_result(awaiter.block())
}

fn to_timer_result(outcome: AwaitOutcome) -> TimerResult {
    match outcome {
        AwaitOutcome::Completed => TimerResult::Timeout,
        AwaitOutcome::Cancelled => TimerResult::Cancelled,
    }
}

/// A Win32-kernel-like signal: anything that can be waited on and
/// raised exactly once. `resume_on_signal` below is generic over any
/// implementor, so production code can wait on a real Win32 event
/// handle (via `windows::Win32::System::Threading::WaitForSingleObject`)
/// while tests wait on an in-process stand-in.
pub trait KernelSignal: Send + Sync + 'static {
    /// Blocks the calling thread until the signal is raised. Returns
    /// immediately if it was already raised.
    fn wait(&self);
}

/// Waits on `signal`, on a dedicated waiter thread, racing
/// `stop_token`'s cancellation. Returns `true` if the signal won,
/// `false` if cancellation won.
pub fn resume_on_signal<S: KernelSignal>(signal: Arc<S>, stop_token: &StopToken) -> SignalResult {
    let awaiter = Arc::new(Awaiter::new());
    if let Some(outcome) = awaiter.begin_wait() {
        return outcome == AwaitOutcome::Completed;
    }
    stop_token.register(&awaiter);

    let waiter_awaiter = Arc::clone(&awaiter);
    thread::Builder::new()
        .name("task-signal-waiter".to_string())
        .spawn(move || {
            signal.wait();
            waiter_awaiter.complete(AwaitOutcome::Completed);
        })
        .expect("failed to spawn signal waiter thread");

    awaiter.block() == AwaitOutcome::Completed
}

/// Guards a component with idempotent, re-entrant-safe async shutdown
///. `start_once` returns `true` to exactly one
/// caller across the lifetime of the component; every other caller
/// (concurrent or subsequent) gets `false` and should treat the
/// dispose as already in flight or complete.
pub struct DisposalState {
    started: Mutex<bool>,
}

impl DisposalState {
    pub fn new() -> Self {
        DisposalState {
            started: Mutex::new(false),
        }
    }

    pub fn start_once(&self) -> bool {
        let mut started = self.started.lock().unwrap();
        if *started {
            return false;
        }
        *started = true;
        true
    }

    pub fn is_disposing(&self) -> bool {
        *self.started.lock().unwrap()
    }
}

impl Default for DisposalState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    #[test]
    fn spawn_and_join_forwards_result() {
        let task = spawn("test-task", || 40 + 2);
        assert_eq!(task.join().unwrap(), 42);
    }

    #[test]
    fn spawn_and_join_forwards_panics_as_task_error() {
        let task: Task<()> = spawn("test-task", || panic!("boom"));
        assert!(matches!(task.join(), Err(TaskError::Panicked(_))));
    }

    #[test]
    fn resume_after_times_out_without_cancellation() {
        let source = StopSource::new();
        let result = resume_after(Duration::from_millis(5), &source.token());
        assert_eq!(result, TimerResult::Timeout);
    }

    #[test]
    fn resume_after_cancelled_immediately_returns_fast() {
        // Cancelling before/at the start of a 1s wait must return
        // Cancelled in well under the timer duration.
        let source = StopSource::new();
        source.request_stop();
        let start = Instant::now();
        let result = resume_after(Duration::from_secs(1), &source.token());
        assert_eq!(result, TimerResult::Cancelled);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    struct NeverSignal;
    impl KernelSignal for NeverSignal {
        fn wait(&self) {
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
    }

    struct ImmediateSignal;
    impl KernelSignal for ImmediateSignal {
        fn wait(&self) {}
    }

    #[test]
    fn resume_on_signal_returns_true_when_signalled() {
        let source = StopSource::new();
        assert!(resume_on_signal(Arc::new(ImmediateSignal), &source.token()));
    }

    #[test]
    fn resume_on_signal_returns_false_when_cancelled() {
        let source = StopSource::new();
        source.request_stop();
        assert!(!resume_on_signal(Arc::new(NeverSignal), &source.token()));
    }

    #[test]
    fn disposal_state_start_once_wins_exactly_once() {
        let state = Arc::new(DisposalState::new());
        let winners = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();
        let win_count = Arc::new(std::sync::atomic::AtomicU32::new(0));
        for _ in 0..8 {
            let state = Arc::clone(&state);
            let win_count = Arc::clone(&win_count);
            handles.push(thread::spawn(move || {
                if state.start_once() {
                    win_count.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        let _ = winners.load(Ordering::SeqCst);
        assert_eq!(win_count.load(Ordering::SeqCst), 1);
        assert!(state.is_disposing());
        assert!(!state.start_once());
    }
}
