//! Recursive traversal engine producing the Fibonacci branching pattern.

use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{info, warn};

use fibpulse_core::{
    NotificationEvent, TraversalOutcome, TraversalReport, TraversalShape, WorkerConfig,
};
use fibpulse_notify::Notifier;

use crate::cancel::CancelFlag;

/// Capacity of the in-process event channel.
const EVENT_CHANNEL_SIZE: usize = 256;

/// Plain Fibonacci, `fib(0) = 0`, `fib(1) = 1`.
///
/// Iterative; the fan-out shape calls it once per node at the modest
/// indices this worker is built for.
pub fn fib(n: u32) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}

/// The recursive visitor.
///
/// Stateless across runs except for the broadcast channel handed to
/// subscribers; the shared cancellation flag is read at the start of every
/// visit and before committing to each child.
pub struct Traversal {
    config: WorkerConfig,
    events_tx: broadcast::Sender<NotificationEvent>,
}

/// Per-run counters.
#[derive(Debug, Default)]
struct VisitStats {
    nodes_visited: u64,
    notify_failures: u64,
}

impl Traversal {
    /// Create a new engine for the given configuration.
    pub fn new(config: WorkerConfig) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self { config, events_tx }
    }

    /// Subscribe to the events emitted for every visited node.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events_tx.subscribe()
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Traverse the tree rooted at `root_index`.
    ///
    /// Returns a report whether the run completed or was truncated by the
    /// flag. The engine itself has no fatal errors.
    pub fn run(
        &self,
        root_index: u32,
        flag: &CancelFlag,
        notifier: &dyn Notifier,
    ) -> TraversalReport {
        let start = Instant::now();
        let mut stats = VisitStats::default();

        let outcome = match self.config.shape {
            TraversalShape::Binary => self.visit_binary(root_index, 0, flag, notifier, &mut stats),
            TraversalShape::FanOut => self.visit_fan_out(root_index, 0, flag, notifier, &mut stats),
        };

        TraversalReport {
            root_index,
            shape: self.config.shape,
            outcome,
            nodes_visited: stats.nodes_visited,
            notify_failures: stats.notify_failures,
            duration: start.elapsed(),
        }
    }

    /// Doubly-recursive shape: children `index-1` then `index-2`, both at
    /// `depth + depth_increment`. Leaves (`index < 2`) hold the pacing delay.
    fn visit_binary(
        &self,
        index: u32,
        depth: u32,
        flag: &CancelFlag,
        notifier: &dyn Notifier,
        stats: &mut VisitStats,
    ) -> TraversalOutcome {
        if flag.is_set() {
            return TraversalOutcome::Cancelled;
        }

        self.visit_node(index, depth, None, notifier, stats);

        if index < 2 {
            flag.pace(self.config.pacing);
            return TraversalOutcome::Completed;
        }

        let step = self.config.depth_increment;
        if self.visit_binary(index - 1, depth + step, flag, notifier, stats)
            == TraversalOutcome::Cancelled
        {
            return TraversalOutcome::Cancelled;
        }
        if flag.is_set() {
            return TraversalOutcome::Cancelled;
        }
        self.visit_binary(index - 2, depth + step, flag, notifier, stats)
    }

    /// Fan-out shape: `fib(index)` children at `(index-1, depth+1)`, with
    /// pacing between siblings.
    fn visit_fan_out(
        &self,
        index: u32,
        depth: u32,
        flag: &CancelFlag,
        notifier: &dyn Notifier,
        stats: &mut VisitStats,
    ) -> TraversalOutcome {
        if flag.is_set() {
            return TraversalOutcome::Cancelled;
        }

        let fan_out = fib(index);
        self.visit_node(index, depth, Some(fan_out), notifier, stats);
        flag.pace(self.config.pacing);

        if index == 0 {
            return TraversalOutcome::Completed;
        }

        for child in 0..fan_out {
            if flag.is_set() {
                return TraversalOutcome::Cancelled;
            }
            if child > 0 {
                flag.pace(self.config.pacing);
            }
            if self.visit_fan_out(index - 1, depth + 1, flag, notifier, stats)
                == TraversalOutcome::Cancelled
            {
                return TraversalOutcome::Cancelled;
            }
        }
        TraversalOutcome::Completed
    }

    /// Visit one node: exactly one trace line and one notification attempt,
    /// unconditionally, even for the last node before a stop.
    fn visit_node(
        &self,
        index: u32,
        depth: u32,
        derived_value: Option<u64>,
        notifier: &dyn Notifier,
        stats: &mut VisitStats,
    ) {
        stats.nodes_visited += 1;

        info!(target: "fibpulse::traversal", "{:indent$}fib({index})", "", indent = depth as usize);

        let event = NotificationEvent {
            index,
            depth,
            derived_value,
            worker: self.config.worker_name.clone(),
        };
        let _ = self.events_tx.send(event.clone());

        if let Err(err) = notifier.notify(&event) {
            stats.notify_failures += 1;
            warn!(target: "fibpulse::traversal", index, depth, "notification failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use fibpulse_core::NotifyError;
    use fibpulse_notify::NullNotifier;

    /// Records every `(index, depth)` pair it is notified of.
    #[derive(Default)]
    struct RecordingNotifier {
        visits: Mutex<Vec<(u32, u32)>>,
    }

    impl RecordingNotifier {
        fn visits(&self) -> Vec<(u32, u32)> {
            self.visits.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
            self.visits.lock().unwrap().push((event.index, event.depth));
            Ok(())
        }
    }

    /// Fails every notification.
    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
            Err(NotifyError::Io {
                path: "/dev/full".into(),
                source: std::io::Error::other("broken observer"),
            })
        }
    }

    fn config(shape: TraversalShape, depth_increment: u32) -> WorkerConfig {
        WorkerConfig::builder()
            .depth_increment(depth_increment)
            .pacing(Duration::ZERO)
            .shape(shape)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fib_values() {
        let expected = [0u64, 1, 1, 2, 3, 5, 8, 13, 21, 34];
        for (n, want) in expected.iter().enumerate() {
            assert_eq!(fib(n as u32), *want);
        }
    }

    #[test]
    fn test_binary_node_counts() {
        // 2*fib(n+1)-1 calls for the doubly-recursive shape.
        let expected = [1u64, 1, 3, 5, 9];
        for (n, want) in expected.iter().enumerate() {
            let engine = Traversal::new(config(TraversalShape::Binary, 2));
            let report = engine.run(n as u32, &CancelFlag::new(), &NullNotifier);
            assert_eq!(report.nodes_visited, *want, "root index {n}");
            assert_eq!(report.outcome, TraversalOutcome::Completed);
        }
    }

    #[test]
    fn test_binary_visit_order() {
        let engine = Traversal::new(config(TraversalShape::Binary, 1));
        let notifier = RecordingNotifier::default();
        engine.run(3, &CancelFlag::new(), &notifier);

        // First child before second child, all the way down.
        assert_eq!(
            notifier.visits(),
            vec![(3, 0), (2, 1), (1, 2), (0, 2), (1, 1)]
        );
    }

    #[test]
    fn test_binary_is_deterministic() {
        let first = {
            let engine = Traversal::new(config(TraversalShape::Binary, 2));
            let notifier = RecordingNotifier::default();
            engine.run(6, &CancelFlag::new(), &notifier);
            notifier.visits()
        };
        let second = {
            let engine = Traversal::new(config(TraversalShape::Binary, 2));
            let notifier = RecordingNotifier::default();
            engine.run(6, &CancelFlag::new(), &notifier);
            notifier.visits()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_binary_depth_increment() {
        let engine = Traversal::new(config(TraversalShape::Binary, 2));
        let notifier = RecordingNotifier::default();
        engine.run(2, &CancelFlag::new(), &notifier);

        // Root at depth 0, both children two deeper.
        assert_eq!(notifier.visits(), vec![(2, 0), (1, 2), (0, 2)]);
    }

    #[test]
    fn test_fan_out_node_counts() {
        // f(0) = 1, f(n) = 1 + fib(n) * f(n-1).
        let expected = [1u64, 2, 3, 7, 22];
        for (n, want) in expected.iter().enumerate() {
            let engine = Traversal::new(config(TraversalShape::FanOut, 1));
            let report = engine.run(n as u32, &CancelFlag::new(), &NullNotifier);
            assert_eq!(report.nodes_visited, *want, "root index {n}");
        }
    }

    #[test]
    fn test_fan_out_depth_and_order() {
        let engine = Traversal::new(config(TraversalShape::FanOut, 1));
        let notifier = RecordingNotifier::default();
        engine.run(3, &CancelFlag::new(), &notifier);

        // fib(3) = 2 children under the root, each a fan-out of index 2.
        assert_eq!(
            notifier.visits(),
            vec![(3, 0), (2, 1), (1, 2), (0, 3), (2, 1), (1, 2), (0, 3)]
        );
    }

    #[test]
    fn test_fan_out_carries_derived_value() {
        let engine = Traversal::new(config(TraversalShape::FanOut, 1));
        let mut events = engine.subscribe();
        engine.run(2, &CancelFlag::new(), &NullNotifier);

        let root = events.try_recv().unwrap();
        assert_eq!(root.index, 2);
        assert_eq!(root.derived_value, Some(1));
    }

    #[test]
    fn test_binary_has_no_derived_value() {
        let engine = Traversal::new(config(TraversalShape::Binary, 2));
        let mut events = engine.subscribe();
        engine.run(1, &CancelFlag::new(), &NullNotifier);

        let root = events.try_recv().unwrap();
        assert_eq!(root.derived_value, None);
    }

    #[test]
    fn test_cancelled_before_first_visit() {
        let engine = Traversal::new(config(TraversalShape::Binary, 2));
        let flag = CancelFlag::new();
        flag.request_stop();

        let report = engine.run(10, &flag, &NullNotifier);
        assert_eq!(report.outcome, TraversalOutcome::Cancelled);
        assert_eq!(report.nodes_visited, 0);
    }

    #[test]
    fn test_notify_failure_does_not_abort() {
        let engine = Traversal::new(config(TraversalShape::Binary, 2));
        let report = engine.run(4, &CancelFlag::new(), &FailingNotifier);

        assert_eq!(report.outcome, TraversalOutcome::Completed);
        assert_eq!(report.nodes_visited, 9);
        assert_eq!(report.notify_failures, 9);
    }

    #[test]
    fn test_events_mirror_notifications() {
        let engine = Traversal::new(config(TraversalShape::Binary, 1));
        let mut events = engine.subscribe();
        let notifier = RecordingNotifier::default();
        engine.run(3, &CancelFlag::new(), &notifier);

        let mut broadcast_pairs = Vec::new();
        while let Ok(event) = events.try_recv() {
            broadcast_pairs.push((event.index, event.depth));
        }
        assert_eq!(broadcast_pairs, notifier.visits());
    }
}
