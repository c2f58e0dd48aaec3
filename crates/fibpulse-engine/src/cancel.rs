//! Cooperative cancellation flag with an interruptible wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Shared stop flag for one worker.
///
/// The controller owns the single instance and is the only writer; the
/// traversal engine reads it at its checkpoints. The condvar lets a stop
/// request cut a pacing delay short instead of waiting it out.
#[derive(Debug, Default)]
pub struct CancelFlag {
    stopped: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl CancelFlag {
    /// Create a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stop has been requested.
    pub fn is_set(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Request a stop and wake any pacing waiter.
    ///
    /// The notify is delivered unconditionally, even if nobody is waiting
    /// yet; the flag is re-tested after every wait, so the wake cannot be
    /// lost.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.wake.notify_all();
    }

    /// Clear the flag. Called by the controller when arming a fresh run,
    /// never anywhere else.
    pub fn reset(&self) {
        self.stopped.store(false, Ordering::Release);
    }

    /// Hold for `delay`, returning early if a stop is requested.
    ///
    /// Returns whether the flag was set when the wait ended.
    pub fn pace(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let mut guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        while !self.is_set() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (next, _timeout) = self
                .wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            guard = next;
        }
        self.is_set()
    }
}
