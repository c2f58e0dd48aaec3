//! External notification collaborators for fibpulse.
//!
//! The traversal engine treats the observer as an opaque, possibly-slow,
//! possibly-failing external call. This crate defines that boundary as the
//! [`Notifier`] trait and ships the concrete collaborators:
//!
//! - [`CommandFileNotifier`]: truncate-writes one `SPAWN_GUI` line per
//!   event to a command file an observer process can watch.
//! - [`CommandNotifier`]: launches a configured program per event and
//!   waits for it to exit.
//! - [`NullNotifier`]: discards events; used when no observer is attached.

mod command_file;
mod process;

pub use command_file::CommandFileNotifier;
pub use process::CommandNotifier;

use fibpulse_core::{NotificationEvent, NotifyError};

/// The external observer of visited nodes.
///
/// Called exactly once per visited node. `notify` may block on the
/// collaborator and may fail; failures are soft at the traversal level.
pub trait Notifier: Send + Sync {
    /// One-time external setup, performed before the worker is usable.
    fn init(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    /// Deliver one event to the observer.
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Notifier that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_notifier_accepts_everything() {
        let notifier = NullNotifier;
        assert!(notifier.init().is_ok());
        let event = NotificationEvent {
            index: 3,
            depth: 0,
            derived_value: None,
            worker: "test".into(),
        };
        assert!(notifier.notify(&event).is_ok());
    }
}
