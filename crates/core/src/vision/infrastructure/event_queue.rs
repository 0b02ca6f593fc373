use crossbeam_channel::{Receiver, Sender};

use crate::vision::domain::sighting_event::SightingEvent;

/// Creates a connected producer/consumer pair.
pub fn event_queue() -> (EventSender, EventQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSender { tx }, EventQueue { rx })
}

/// Producer side, cloned into every engine-side callback.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<SightingEvent>,
}

impl EventSender {
    /// Returns `false` once the consumer has gone away.
    pub fn send(&self, event: SightingEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer side, owned by the control loop.
///
/// Unbounded FIFO: nothing enqueued is ever dropped before a drain.
pub struct EventQueue {
    rx: Receiver<SightingEvent>,
}

impl EventQueue {
    /// Everything enqueued since the previous drain, oldest first. Never blocks.
    pub fn drain_all(&self) -> Vec<SightingEvent> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
