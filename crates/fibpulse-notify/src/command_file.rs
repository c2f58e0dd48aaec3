//! Command-file notifier.

use std::fs;
use std::path::{Path, PathBuf};

use fibpulse_core::{NotificationEvent, NotifyError};

use crate::Notifier;

/// Notifier that signals an observer through a command file.
///
/// Each event truncate-writes the file with a single
/// `SPAWN_GUI <index> <depth>` line, so the file always holds the most
/// recently visited node. An observer watches the file for changes.
#[derive(Debug, Clone)]
pub struct CommandFileNotifier {
    path: PathBuf,
}

impl CommandFileNotifier {
    /// Create a notifier writing to the given command file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the command file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for CommandFileNotifier {
    /// Create the command file, clearing any content left by a prior run.
    fn init(&self) -> Result<(), NotifyError> {
        fs::write(&self.path, b"").map_err(|source| NotifyError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let line = format!("SPAWN_GUI {} {}\n", event.index, event.depth);
        fs::write(&self.path, line).map_err(|source| NotifyError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn event(index: u32, depth: u32) -> NotificationEvent {
        NotificationEvent {
            index,
            depth,
            derived_value: None,
            worker: "test".into(),
        }
    }

    #[test]
    fn test_init_creates_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cmd");
        let notifier = CommandFileNotifier::new(&path);

        notifier.init().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_init_clears_stale_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cmd");
        fs::write(&path, "SPAWN_GUI 9 9\n").unwrap();

        CommandFileNotifier::new(&path).init().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_notify_writes_single_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cmd");
        let notifier = CommandFileNotifier::new(&path);
        notifier.init().unwrap();

        notifier.notify(&event(3, 0)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "SPAWN_GUI 3 0\n");

        // Each event replaces the previous one.
        notifier.notify(&event(2, 2)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "SPAWN_GUI 2 2\n");
    }

    #[test]
    fn test_notify_missing_directory_is_io_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("cmd");
        let notifier = CommandFileNotifier::new(&path);

        let err = notifier.notify(&event(1, 0)).unwrap_err();
        assert!(matches!(err, NotifyError::Io { .. }));
    }
}
