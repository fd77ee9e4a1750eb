//! Single-slot, last-write-wins handoff between threads.

use parking_lot::Mutex;

/// Holds at most one value; a newer `put` replaces an unconsumed one.
#[derive(Debug)]
pub struct PendingSlot<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for PendingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store `value`, returning whether an older value was overwritten.
    pub fn put(&self, value: T) -> bool {
        self.slot.lock().replace(value).is_some()
    }

    /// Remove and return the pending value, if any.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}
