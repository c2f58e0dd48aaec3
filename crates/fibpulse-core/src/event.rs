//! Notification events and per-run reports.

use std::time::Duration;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::config::TraversalShape;

/// Immutable record handed to the notification collaborator for every
/// visited node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Fibonacci index of the visited node.
    pub index: u32,
    /// Depth of the node in the traversal tree (root is 0).
    pub depth: u32,
    /// Auxiliary computed quantity; the fan-out shape uses it to decide
    /// how many children to spawn. Absent in the binary shape.
    pub derived_value: Option<u64>,
    /// Identity of the worker that visited the node.
    pub worker: CompactString,
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TraversalOutcome {
    /// Every node was visited.
    Completed,
    /// The cancellation flag truncated the traversal.
    Cancelled,
}

/// Summary of one traversal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalReport {
    /// Root index the run was armed with.
    pub root_index: u32,
    /// Shape the run used.
    pub shape: TraversalShape,
    /// How the run ended.
    pub outcome: TraversalOutcome,
    /// Number of nodes visited before the run ended.
    pub nodes_visited: u64,
    /// Number of notification attempts that failed.
    pub notify_failures: u64,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(TraversalOutcome::Completed.to_string(), "completed");
        assert_eq!(TraversalOutcome::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_event_equality() {
        let event = NotificationEvent {
            index: 4,
            depth: 2,
            derived_value: Some(3),
            worker: CompactString::const_new("fibpulse-worker"),
        };
        let same = event.clone();
        assert_eq!(event, same);
        assert_eq!(event.worker, "fibpulse-worker");
    }
}
