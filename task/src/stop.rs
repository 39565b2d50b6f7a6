// Cooperative cancellation: a `StopSource`/`StopToken` pair,
// the Rust analogue of a `std::stop_source`/`std::stop_token`. Every
// `resume_after`/`resume_on_signal` call takes a `StopToken` so a
// caller can cancel a pending wait without the awaited thing (timer,
// signal) ever needing to know about it.
use std::sync::{Arc, Mutex};

use crate::awaiter::Awaiter;

struct StopInner {
    cancelled: Mutex<bool>,
    awaiters: Mutex<Vec<Arc<Awaiter>>>,
}

/// Owns the ability to cancel every `StopToken` cloned from it.
#[derive(Clone)]
pub struct StopSource {
    inner: Arc<StopInner>,
}

/// A cheaply cloneable, passively-checked handle to a `StopSource`'s
/// cancellation state.
#[derive(Clone)]
pub struct StopToken {
    inner: Arc<StopInner>,
}

impl StopSource {
    pub fn new() -> Self {
        StopSource {
            inner: Arc::new(StopInner {
                cancelled: Mutex::new(false),
                awaiters: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn token(&self) -> StopToken {
        StopToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Cancels every wait registered against this source, past or
    /// future. Idempotent.
    pub fn request_stop(&self) {
        let mut cancelled = self.inner.cancelled.lock().unwrap();
        if *cancelled {
            return;
        }
        *cancelled = true;
        for awaiter in self.inner.awaiters.lock().unwrap().drain(..) {
            awaiter.cancel();
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.inner.cancelled.lock().unwrap()
    }
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StopToken {
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock().unwrap()
    }

    /// Registers `awaiter` to be cancelled when this token's source
    /// calls `request_stop`. If the source has already requested a
    /// stop, cancels `awaiter` immediately instead of registering it,
    /// so a late registration never blocks waiting for a stop signal
    /// that already happened.
    pub(crate) fn register(&self, awaiter: &Arc<Awaiter>) {
        let cancelled = self.inner.cancelled.lock().unwrap();
        if *cancelled {
            awaiter.cancel();
            return;
        }
        self.inner
            .awaiters
            .lock()
            .unwrap()
            .push(Arc::clone(awaiter));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_stop_is_idempotent() {
        let source = StopSource::new();
        source.request_stop();
        source.request_stop();
        assert!(source.is_stop_requested());
    }

    #[test]
    fn token_sees_stop_requested_by_its_source() {
        let source = StopSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());
        source.request_stop();
        assert!(token.is_cancelled());
    }
}
