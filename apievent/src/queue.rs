//! Ordered dispatch of received `APIEvent`s onto the UI/orchestrator
//! thread.
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::builtin::{decode_multi_event, BuiltinDecodeError};
use crate::protocol::{APIEvent, EVT_MULTI_EVENT};

/// A strictly FIFO queue of events awaiting dispatch. `MultiEvent`
/// packets are expanded into their constituent events at enqueue
/// time, immediately after the ones already queued, rather than being
/// dispatched as a single opaque unit - this is what lets the UI
/// thread observe (and act on) intermediate state between entries
/// instead of only the last one.
#[derive(Default)]
pub struct EventQueue {
    entries: Mutex<VecDeque<APIEvent>>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("malformed MultiEvent payload: {0}")]
    MultiEvent(#[from] BuiltinDecodeError),
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueues one received packet, expanding `MultiEvent` in place.
    /// A malformed `MultiEvent` payload is rejected without
    /// disturbing entries already queued.
    pub fn enqueue(&self, event: APIEvent) -> Result<(), EnqueueError> {
        if event.name == EVT_MULTI_EVENT {
            let expanded = decode_multi_event(&event.value)?;
            let mut entries = self.entries.lock().unwrap();
            entries.extend(expanded);
        } else {
            self.entries.lock().unwrap().push_back(event);
        }
        Ok(())
    }

    /// Pops the next event in enqueue order, if any.
    pub fn pop_front(&self) -> Option<APIEvent> {
        self.entries.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains every currently-queued event, one at a time and in
    /// order, through `handler`. Events enqueued by the handler itself
    /// (e.g. a handler that triggers a profile switch which emits
    /// further events) are picked up in the same drain, since each
    /// iteration re-reads the front of the queue rather than
    /// snapshotting it up front.
    pub fn drain_with<F: FnMut(APIEvent)>(&self, mut handler: F) {
        while let Some(event) = self.pop_front() {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_events_dispatch_in_fifo_order() {
        let queue = EventQueue::new();
        queue.enqueue(APIEvent::new("NextPage", "")).unwrap();
        queue.enqueue(APIEvent::new("PreviousPage", "")).unwrap();

        let mut seen = Vec::new();
        queue.drain_with(|e| seen.push(e.name));
        assert_eq!(seen, vec!["NextPage", "PreviousPage"]);
    }

    #[test]
    fn multi_event_is_expanded_in_place_preserving_order() {
        // A MultiEvent must expand to its constituent events in place,
        // preserving the order they were listed in.
        let queue = EventQueue::new();
        queue.enqueue(APIEvent::new("PreviousPage", "")).unwrap();
        let multi = APIEvent::new(
            EVT_MULTI_EVENT,
            r#"[["RemoteUserAction","NextPage"],["RemoteUserAction","NextPage"]]"#,
        );
        queue.enqueue(multi).unwrap();
        queue.enqueue(APIEvent::new("ToggleVisibility", "")).unwrap();

        let mut seen = Vec::new();
        queue.drain_with(|e| seen.push((e.name, e.value)));
        assert_eq!(
            seen,
            vec![
                ("PreviousPage".to_string(), "".to_string()),
                ("RemoteUserAction".to_string(), "NextPage".to_string()),
                ("RemoteUserAction".to_string(), "NextPage".to_string()),
                ("ToggleVisibility".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_multi_event_is_rejected_without_touching_existing_entries() {
        let queue = EventQueue::new();
        queue.enqueue(APIEvent::new("NextPage", "")).unwrap();
        let bad = APIEvent::new(EVT_MULTI_EVENT, "not json");
        assert!(queue.enqueue(bad).is_err());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn handler_enqueueing_more_events_is_drained_in_the_same_call() {
        let queue = EventQueue::new();
        queue.enqueue(APIEvent::new("First", "")).unwrap();

        let mut seen = Vec::new();
        // Simulate a handler that reacts to "First" by enqueueing
        // "Second" before the drain loop re-checks the queue.
        let mut first_seen = false;
        loop {
            let Some(event) = queue.pop_front() else {
                break;
            };
            if event.name == "First" && !first_seen {
                first_seen = true;
                queue.enqueue(APIEvent::new("Second", "")).unwrap();
            }
            seen.push(event.name);
        }
        assert_eq!(seen, vec!["First", "Second"]);
    }
}
