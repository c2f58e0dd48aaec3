//! Error types for the worker lifecycle and the notification channel.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::state::WorkerState;

/// Errors surfaced by the worker controller.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// `start` or `rearm` was invoked outside the permitted state.
    #[error("worker is already running (state: {state})")]
    AlreadyRunning { state: WorkerState },

    /// The worker thread could not be created.
    #[error("failed to spawn worker thread")]
    SpawnFailed {
        #[source]
        source: std::io::Error,
    },

    /// `rearm` was invoked before `start`.
    #[error("worker has not been started")]
    NotStarted,

    /// `rearm` was invoked after the worker stopped.
    #[error("worker has been stopped")]
    AlreadyStopped,

    /// Configuration was rejected before any recursion began.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The notifier's one-time setup failed.
    #[error("notifier initialization failed")]
    Init {
        #[source]
        source: NotifyError,
    },
}

/// Errors from the external notification collaborator.
///
/// Always soft at the traversal level: logged and counted, never fatal.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Writing the command file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The observer command could not be launched.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The observer command ran but exited with a failure status.
    #[error("{program} exited with {status}")]
    CommandFailed { program: PathBuf, status: ExitStatus },
}
