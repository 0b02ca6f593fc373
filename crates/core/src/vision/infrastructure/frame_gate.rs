use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::shared::frame::Frame;

/// Single-slot, most-recent-wins handoff from the capture source to the
/// engine worker.
///
/// `submit` never blocks beyond the slot lock and never fails: an unconsumed
/// frame is overwritten, so recognition latency cannot accumulate a backlog.
#[derive(Default)]
pub struct FrameGate {
    slot: Mutex<Option<Frame>>,
    ready: Condvar,
    dropped: AtomicU64,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, frame: Frame) {
        let mut slot = self.lock_slot();
        if let Some(stale) = slot.replace(frame) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("Dropping unconsumed frame {}", stale.index());
        }
        self.ready.notify_all();
    }

    /// Takes the pending frame, waiting up to `timeout` for one to arrive.
    pub fn wait(&self, timeout: Duration) -> Option<Frame> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock_slot();
        loop {
            if let Some(frame) = slot.take() {
                return Some(frame);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            slot = self
                .ready
                .wait_timeout(slot, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    pub fn take(&self) -> Option<Frame> {
        self.lock_slot().take()
    }

    /// Number of frames waiting for the engine: always 0 or 1.
    pub fn pending(&self) -> usize {
        usize::from(self.lock_slot().is_some())
    }

    /// Frames overwritten before the engine consumed them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // Slot contents stay valid across a poisoned lock.
    fn lock_slot(&self) -> MutexGuard<'_, Option<Frame>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
