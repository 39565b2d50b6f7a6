// Generic event bus, generalizing the original engine's
// `OpenKneeboard/Events.h`: `Event<Args...>`, `EventHandlerToken`,
// `EventContext` and `EventReceiver`.
//
// `EventHandlerToken`/`EventContext` are minted from `utils::handle`
// instead of hand-rolled `UniqueIDBase<T>` subclasses. Receivers hold
// only a `Weak` reference to the events they're subscribed to (see
// the ownership rule in the data model: "every shared-ownership
// relation whose holder can outlive the referent stores a weak
// reference and locks at use") so an `Event<A>` and the code that
// subscribes to it can be torn down in either order.
use std::sync::mpsc;
use std::sync::{Arc, Mutex, Weak};

use utils::handle::{Handle, HandleAllocator};

pub struct EventHandlerTag;
pub struct EventContextTag;

pub type EventHandlerToken = Handle<EventHandlerTag>;
pub type EventContext = Handle<EventContextTag>;

static HANDLER_TOKENS: HandleAllocator<EventHandlerTag> = HandleAllocator::new();
static EVENT_CONTEXTS: HandleAllocator<EventContextTag> = HandleAllocator::new();

/// Returned by a hook installed with [`Event::push_hook`]. Mirrors the
/// original `EventHookResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    AllowPropagation,
    StopPropagation,
}

type Handler<A> = Arc<dyn Fn(A) + Send + Sync>;
type Hook<A> = Arc<dyn Fn(&A) -> HookResult + Send + Sync>;

/// Type-erased handle to an `Event<A>` so `EventReceiver` can hold a
/// mixed bag of subscriptions across many different `Args` types.
pub trait EventSource: Send + Sync {
    fn remove_handler(&self, token: EventHandlerToken);
}

struct EventInner<A> {
    receivers: Vec<(EventHandlerToken, Handler<A>)>,
    hooks: Vec<Hook<A>>,
}

/// A single named event with payload `A`. Always held behind an `Arc`
/// so `EventReceiver` can keep a `Weak` back-reference for cleanup.
pub struct Event<A> {
    inner: Mutex<EventInner<A>>,
}

impl<A: Clone + Send + 'static> Event<A> {
    pub fn new() -> Arc<Self> {
        Arc::new(Event {
            inner: Mutex::new(EventInner {
                receivers: Vec::new(),
                hooks: Vec::new(),
            }),
        })
    }

    /// Subscribes `handler`, tying its lifetime to `receiver`: when
    /// `receiver` is dropped, this subscription (and every other one
    /// it owns) is automatically removed.
    pub fn add_handler(
        self: &Arc<Self>,
        receiver: &EventReceiver,
        handler: impl Fn(A) + Send + Sync + 'static,
    ) -> EventHandlerToken {
        let token = HANDLER_TOKENS.mint();
        self.inner
            .lock()
            .unwrap()
            .receivers
            .push((token, Arc::new(handler)));
        receiver.track(Arc::downgrade(self) as Weak<dyn EventSource>, token);
        token
    }

    /// Removes a previously added handler. Idempotent: removing an
    /// already-removed or unknown token is a no-op, matching
    /// `EventReceiver`'s drop-time cleanup racing with an explicit
    /// unsubscribe.
    pub fn remove_handler(&self, token: EventHandlerToken) {
        self.inner
            .lock()
            .unwrap()
            .receivers
            .retain(|(t, _)| *t != token);
    }

    /// Pushes a hook onto the front of the hook chain. Hooks run
    /// before receivers, in most-recently-pushed order, and can
    /// short-circuit the emit entirely by returning
    /// `HookResult::StopPropagation`. Used by [`EventDelay`] to
    /// coalesce bursts of emits into one.
    pub fn push_hook(&self, hook: impl Fn(&A) -> HookResult + Send + Sync + 'static) {
        self.inner.lock().unwrap().hooks.insert(0, Arc::new(hook));
    }

    /// Pops the most recently pushed hook. Panics if the hook chain
    /// is empty, since `push_hook`/`pop_hook` is meant to be used as a
    /// strictly nested stack (typically via `EventDelay`'s `Drop`).
    pub fn pop_hook(&self) {
        let removed = self.inner.lock().unwrap().hooks.remove(0);
        drop(removed);
    }

    /// Runs the hook chain, then - unless a hook stopped propagation -
    /// invokes every current receiver with a clone of `args`.
    ///
    /// Both the hook chain and the receiver list are snapshotted
    /// before anything runs, so `Emit` is safe to call re-entrantly
    /// from inside a handler: handlers added or removed during this
    /// call don't affect the in-flight snapshot.
    pub fn emit(&self, args: A) {
        let (hooks, receivers) = {
            let inner = self.inner.lock().unwrap();
            (inner.hooks.clone(), inner.receivers.clone())
        };
        for hook in &hooks {
            if hook(&args) == HookResult::StopPropagation {
                return;
            }
        }
        for (_, handler) in &receivers {
            handler(args.clone());
        }
    }

    /// Defers `emit` onto the dispatch queue identified by `dq`,
    /// rather than running handlers synchronously on the calling
    /// thread.
    pub fn enqueue_for_context(self: &Arc<Self>, dq: &DispatchQueue, args: A) {
        let event = Arc::clone(self);
        dq.enqueue(move || event.emit(args));
    }
}

impl<A: Clone + Send + 'static> EventSource for Event<A> {
    fn remove_handler(&self, token: EventHandlerToken) {
        Event::remove_handler(self, token)
    }
}

/// Owns the reverse edge of every subscription made through
/// `Event::add_handler(self, receiver, ...)`. Dropping it unsubscribes
/// from everything at once, so a struct that owns handlers just needs
/// to hold one `EventReceiver` field alongside them.
#[derive(Default)]
pub struct EventReceiver {
    subscriptions: Mutex<Vec<(Weak<dyn EventSource>, EventHandlerToken)>>,
}

impl EventReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    fn track(&self, source: Weak<dyn EventSource>, token: EventHandlerToken) {
        self.subscriptions.lock().unwrap().push((source, token));
    }
}

impl Drop for EventReceiver {
    fn drop(&mut self) {
        for (source, token) in self.subscriptions.lock().unwrap().drain(..) {
            if let Some(source) = source.upgrade() {
                source.remove_handler(token);
            }
        }
    }
}

/// A scoped guard that coalesces repeated emits of one `Event<A>` into
/// at most one re-emit, carrying the most recent args, when the guard
/// is dropped. Intended for batch updates (e.g. applying several
/// settings changes) that would otherwise each trigger their own
/// repaint.
pub struct EventDelay<A: Clone + Send + 'static> {
    event: Arc<Event<A>>,
    pending: Arc<Mutex<Option<A>>>,
}

impl<A: Clone + Send + 'static> EventDelay<A> {
    pub fn new(event: Arc<Event<A>>) -> Self {
        let pending = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&pending);
        event.push_hook(move |args: &A| {
            *captured.lock().unwrap() = Some(args.clone());
            HookResult::StopPropagation
        });
        EventDelay { event, pending }
    }
}

impl<A: Clone + Send + 'static> Drop for EventDelay<A> {
    fn drop(&mut self) {
        self.event.pop_hook();
        if let Some(args) = self.pending.lock().unwrap().take() {
            self.event.emit(args);
        }
    }
}

/// A thread-affine work queue identified by an [`EventContext`].
/// Pairs with a [`DispatchQueueRunner`] that actually drains it;
/// typically one per "thread with a message loop" (UI thread, render
/// thread, ...), mirroring the original engine's per-thread dispatch
/// queues used to hop `Event::Enqueue`d work back onto the owning
/// thread.
#[derive(Clone)]
pub struct DispatchQueue {
    context: EventContext,
    sender: mpsc::Sender<Box<dyn FnOnce() + Send>>,
}

impl DispatchQueue {
    pub fn new() -> (DispatchQueue, DispatchQueueRunner) {
        let (sender, receiver) = mpsc::channel();
        let context = EVENT_CONTEXTS.mint();
        (
            DispatchQueue { context, sender },
            DispatchQueueRunner { receiver },
        )
    }

    pub fn context(&self) -> EventContext {
        self.context
    }

    pub fn enqueue(&self, f: impl FnOnce() + Send + 'static) {
        // The only way `send` fails is if every `DispatchQueueRunner`
        // for this queue has been dropped; there's nothing useful to
        // do with the closure at that point.
        let _ = self.sender.send(Box::new(f));
    }
}

pub struct DispatchQueueRunner {
    receiver: mpsc::Receiver<Box<dyn FnOnce() + Send>>,
}

impl DispatchQueueRunner {
    /// Drains whatever work is queued right now without blocking.
    /// Called once per iteration of a thread's message loop.
    pub fn run_pending(&self) {
        while let Ok(f) = self.receiver.try_recv() {
            f();
        }
    }

    /// Blocks for the next queued item and runs it. Returns `false`
    /// once every `DispatchQueue` handle for this runner has been
    /// dropped.
    pub fn run_one_blocking(&self) -> bool {
        match self.receiver.recv() {
            Ok(f) => {
                f();
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn handler_is_invoked_with_emitted_args() {
        let event: Arc<Event<u32>> = Event::new();
        let receiver = EventReceiver::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        event.add_handler(&receiver, move |v| captured.lock().unwrap().push(v));

        event.emit(1);
        event.emit(2);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn dropping_receiver_unsubscribes() {
        let event: Arc<Event<u32>> = Event::new();
        let count = Arc::new(AtomicU32::new(0));
        {
            let receiver = EventReceiver::new();
            let captured = Arc::clone(&count);
            event.add_handler(&receiver, move |_| {
                captured.fetch_add(1, Ordering::SeqCst);
            });
            event.emit(1);
        }
        // receiver dropped here; handler must no longer fire.
        event.emit(2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hook_can_stop_propagation() {
        let event: Arc<Event<u32>> = Event::new();
        let receiver = EventReceiver::new();
        let hit = Arc::new(AtomicU32::new(0));
        let captured = Arc::clone(&hit);
        event.add_handler(&receiver, move |_| {
            captured.fetch_add(1, Ordering::SeqCst);
        });

        event.push_hook(|_| HookResult::StopPropagation);
        event.emit(1);
        assert_eq!(hit.load(Ordering::SeqCst), 0);

        event.pop_hook();
        event.emit(2);
        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn emit_is_reentrancy_safe() {
        // A handler that adds another handler mid-emit must not see
        // its own addition invoked in the same Emit call.
        let event: Arc<Event<u32>> = Event::new();
        let receiver = EventReceiver::new();
        let total_calls = Arc::new(AtomicU32::new(0));

        let event_clone = Arc::clone(&event);
        let receiver_ref: &'static EventReceiver = Box::leak(Box::new(EventReceiver::new()));
        let calls_clone = Arc::clone(&total_calls);
        event.add_handler(&receiver, move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            let calls_inner = Arc::clone(&calls_clone);
            event_clone.add_handler(receiver_ref, move |_| {
                calls_inner.fetch_add(100, Ordering::SeqCst);
            });
        });

        event.emit(1);
        assert_eq!(total_calls.load(Ordering::SeqCst), 1);

        event.emit(2);
        // second emit: original handler fires (+1) and the handler
        // registered during the first emit now fires too (+100), plus
        // a newly registered one from *this* emit doesn't run yet.
        assert_eq!(total_calls.load(Ordering::SeqCst), 1 + 1 + 100);
    }

    #[test]
    fn event_delay_coalesces_into_one_emit() {
        let event: Arc<Event<u32>> = Event::new();
        let receiver = EventReceiver::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        event.add_handler(&receiver, move |v| captured.lock().unwrap().push(v));

        {
            let _delay = EventDelay::new(Arc::clone(&event));
            event.emit(1);
            event.emit(2);
            event.emit(3);
            assert!(seen.lock().unwrap().is_empty());
        }

        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn dispatch_queue_runs_enqueued_work_on_runner_thread() {
        let (dq, runner) = DispatchQueue::new();
        let ran = Arc::new(AtomicU32::new(0));
        let captured = Arc::clone(&ran);
        dq.enqueue(move || {
            captured.fetch_add(1, Ordering::SeqCst);
        });
        runner.run_pending();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_contexts_are_distinct_per_queue() {
        let (dq_a, _runner_a) = DispatchQueue::new();
        let (dq_b, _runner_b) = DispatchQueue::new();
        assert_ne!(dq_a.context(), dq_b.context());
    }
}
