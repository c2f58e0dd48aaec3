//! Worker lifecycle state.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Lifecycle state of the traversal worker.
///
/// Owned exclusively by the controller; transitions are the only place
/// lifecycle correctness is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// No worker thread exists yet.
    Idle,
    /// A traversal is in flight.
    Running,
    /// The last traversal completed; the thread is waiting to be re-armed
    /// or stopped.
    Parked,
    /// A stop has been requested and the thread is winding down.
    Stopping,
    /// The worker thread has exited. Terminal.
    Stopped,
}

impl WorkerState {
    /// Whether a traversal is currently in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, WorkerState::Running)
    }

    /// Whether the worker can accept a new run via re-arm.
    pub fn is_parked(&self) -> bool {
        matches!(self, WorkerState::Parked)
    }
}
