//! Process-launching notifier.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use fibpulse_core::{NotificationEvent, NotifyError};

use crate::Notifier;

/// Notifier that launches an observer program once per event and waits for
/// it to exit.
///
/// The program receives the node's index and depth as its first two
/// arguments, followed by the derived value when present. The wait makes
/// this the slow, blocking hand-off the engine must tolerate.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: PathBuf,
}

impl CommandNotifier {
    /// Create a notifier launching the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let mut command = Command::new(&self.program);
        command
            .arg(event.index.to_string())
            .arg(event.depth.to_string());
        if let Some(derived) = event.derived_value {
            command.arg(derived.to_string());
        }

        debug!(target: "fibpulse::notify", program = %self.program.display(), index = event.index, "launching observer");

        let status = command.status().map_err(|source| NotifyError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !status.success() {
            return Err(NotifyError::CommandFailed {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    fn event(index: u32, depth: u32, derived_value: Option<u64>) -> NotificationEvent {
        NotificationEvent {
            index,
            depth,
            derived_value,
            worker: "test".into(),
        }
    }

    #[test]
    fn test_successful_command() {
        let notifier = CommandNotifier::new("true");
        assert!(notifier.notify(&event(3, 0, None)).is_ok());
    }

    #[test]
    fn test_failing_command() {
        let notifier = CommandNotifier::new("false");
        let err = notifier.notify(&event(3, 0, None)).unwrap_err();
        assert!(matches!(err, NotifyError::CommandFailed { .. }));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let notifier = CommandNotifier::new("/nonexistent/fibpulse-observer");
        let err = notifier.notify(&event(1, 0, Some(1))).unwrap_err();
        assert!(matches!(err, NotifyError::Spawn { .. }));
    }
}
