//! Single-slot notification channel
//!
//! A mailbox rather than a queue: it holds at most one unconsumed value and
//! a new `send` replaces whatever is still buffered. Consumers therefore
//! see the latest value at the time they run, possibly skipping
//! intermediate ones. Each buffered value is taken by exactly one receiver.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

use crate::error::ChannelError;

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    closed: bool,
}

/// Thread-safe single-slot channel carrying the most recent value of `T`
#[derive(Debug)]
pub struct PhaseChannel<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Default for PhaseChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PhaseChannel<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    // The slot is a plain Option, so a panic while it was held cannot leave
    // it half-updated; recover instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` as the sole buffered item and wake one receiver.
    ///
    /// Never blocks on receivers. An unconsumed earlier value is discarded.
    /// Sending into a closed channel drops the value.
    pub fn send(&self, value: T) {
        let mut slot = self.lock();
        if slot.closed {
            trace!("Dropping value sent into closed channel");
            return;
        }
        if slot.value.replace(value).is_some() {
            trace!("Overwrote unconsumed value");
        }
        drop(slot);
        self.ready.notify_one();
    }

    /// Block until a value is buffered, then take it.
    ///
    /// Returns [`ChannelError::Closed`] only once the channel is closed and
    /// nothing is left to take.
    pub fn receive(&self) -> Result<T, ChannelError> {
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.value.take() {
                return Ok(value);
            }
            if slot.closed {
                return Err(ChannelError::Closed);
            }
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`receive`](Self::receive) but gives up after `timeout`.
    ///
    /// A timeout too large to represent as a deadline waits without bound.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, ChannelError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.receive();
        };
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.value.take() {
                return Ok(value);
            }
            if slot.closed {
                return Err(ChannelError::Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ChannelError::Timeout);
            }
            let (guard, _) = self
                .ready
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            slot = guard;
        }
    }

    /// Take the buffered value if there is one, without blocking.
    pub fn try_receive(&self) -> Option<T> {
        self.lock().value.take()
    }

    /// Close the channel and wake every blocked receiver.
    ///
    /// A value still buffered can be received; after that receivers get
    /// [`ChannelError::Closed`]. Closing twice is a no-op.
    pub fn close(&self) {
        let mut slot = self.lock();
        if slot.closed {
            return;
        }
        slot.closed = true;
        drop(slot);
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
