//! Worker controller owning the cancellation flag and lifecycle state.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tokio::sync::broadcast;
use tracing::info;

use fibpulse_core::{NotificationEvent, TraversalReport, WorkerConfig, WorkerError, WorkerState};
use fibpulse_notify::Notifier;

use crate::cancel::CancelFlag;
use crate::traversal::Traversal;

/// Commands handed to the worker thread through the control mutex.
#[derive(Debug, Clone, Copy)]
enum Command {
    /// Run another traversal from this root.
    Rearm(u32),
    /// Exit the control loop.
    Stop,
}

/// State shared between the controller and the worker thread.
#[derive(Debug)]
struct Control {
    state: WorkerState,
    pending: Option<Command>,
}

struct Shared {
    flag: CancelFlag,
    control: Mutex<Control>,
    wake: Condvar,
    last_report: Mutex<Option<TraversalReport>>,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Controller for the traversal worker.
///
/// Owns the one shared [`CancelFlag`] and the worker's run/park/stop
/// lifecycle. Exactly one traversal runs at a time, on a dedicated thread;
/// all public operations are called from the owning context.
pub struct Controller {
    shared: Arc<Shared>,
    traversal: Arc<Traversal>,
    notifier: Arc<dyn Notifier>,
    handle: Option<JoinHandle<()>>,
}

impl Controller {
    /// Build a controller and perform the notifier's one-time setup.
    ///
    /// No thread is spawned; the worker stays `Idle` until [`start`] is
    /// called. Safe to tear down again without ever starting.
    ///
    /// [`start`]: Controller::start
    pub fn init(config: WorkerConfig, notifier: Arc<dyn Notifier>) -> Result<Self, WorkerError> {
        notifier
            .init()
            .map_err(|source| WorkerError::Init { source })?;

        Ok(Self {
            shared: Arc::new(Shared {
                flag: CancelFlag::new(),
                control: Mutex::new(Control {
                    state: WorkerState::Idle,
                    pending: None,
                }),
                wake: Condvar::new(),
                last_report: Mutex::new(None),
            }),
            traversal: Arc::new(Traversal::new(config)),
            notifier,
            handle: None,
        })
    }

    /// Subscribe to the events emitted for every visited node.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.traversal.subscribe()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.shared.control().state
    }

    /// Whether a traversal is currently in flight.
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Report of the most recently finished run, if any.
    pub fn last_report(&self) -> Option<TraversalReport> {
        self.shared
            .last_report
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Spawn the worker thread and arm the first traversal.
    ///
    /// Fails with `AlreadyRunning` unless the worker is `Idle`; a failed
    /// spawn reverts the state to `Idle`.
    pub fn start(&mut self, root_index: u32) -> Result<(), WorkerError> {
        {
            let mut control = self.shared.control();
            if control.state != WorkerState::Idle {
                return Err(WorkerError::AlreadyRunning {
                    state: control.state,
                });
            }
            control.state = WorkerState::Running;
        }

        self.shared.flag.reset();

        let shared = Arc::clone(&self.shared);
        let traversal = Arc::clone(&self.traversal);
        let notifier = Arc::clone(&self.notifier);
        let name = traversal.config().worker_name.to_string();

        let spawned = thread::Builder::new()
            .name(name)
            .spawn(move || control_loop(shared, traversal, notifier, root_index));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(source) => {
                self.shared.control().state = WorkerState::Idle;
                Err(WorkerError::SpawnFailed { source })
            }
        }
    }

    /// Arm another traversal on the parked worker.
    pub fn rearm(&self, root_index: u32) -> Result<(), WorkerError> {
        let mut control = self.shared.control();
        match control.state {
            WorkerState::Parked => {
                control.pending = Some(Command::Rearm(root_index));
                control.state = WorkerState::Running;
                self.shared.wake.notify_all();
                Ok(())
            }
            WorkerState::Running | WorkerState::Stopping => Err(WorkerError::AlreadyRunning {
                state: control.state,
            }),
            WorkerState::Idle => Err(WorkerError::NotStarted),
            WorkerState::Stopped => Err(WorkerError::AlreadyStopped),
        }
    }

    /// Stop the worker and wait for its thread to exit.
    ///
    /// Sets the flag, wakes the thread wherever it is (parked, pacing, or
    /// mid-traversal), and joins it. Cancellation is cooperative, so the
    /// wait covers at most the in-flight node's notify plus one pacing
    /// step. Idempotent: stopping a stopped worker is a no-op.
    pub fn request_stop(&mut self) {
        {
            let mut control = self.shared.control();
            match control.state {
                WorkerState::Stopped => return,
                WorkerState::Idle => {
                    control.state = WorkerState::Stopped;
                    return;
                }
                _ => {
                    control.pending = Some(Command::Stop);
                    control.state = WorkerState::Stopping;
                }
            }
        }

        self.shared.flag.request_stop();
        self.shared.wake.notify_all();

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        self.shared.control().state = WorkerState::Stopped;
        info!(target: "fibpulse::worker", "worker stopped");
    }

    /// Lifecycle-boundary teardown. Safe to call even if `start` was never
    /// invoked.
    pub fn shutdown(&mut self) {
        self.request_stop();
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.request_stop();
    }
}

/// The worker thread: run a traversal, park until re-armed or stopped.
fn control_loop(
    shared: Arc<Shared>,
    traversal: Arc<Traversal>,
    notifier: Arc<dyn Notifier>,
    first_root: u32,
) {
    info!(target: "fibpulse::worker", root_index = first_root, "worker started");

    let mut root_index = first_root;
    loop {
        let report = traversal.run(root_index, &shared.flag, notifier.as_ref());
        info!(
            target: "fibpulse::worker",
            root_index,
            nodes = report.nodes_visited,
            outcome = %report.outcome,
            "traversal finished"
        );
        *shared
            .last_report
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(report);

        let mut control = shared.control();
        loop {
            // The command is re-tested after every wake, so a spurious wake
            // parks again and a stop requested mid-traversal is picked up
            // before the first wait.
            if let Some(command) = control.pending.take() {
                match command {
                    Command::Stop => {
                        control.state = WorkerState::Stopping;
                        return;
                    }
                    Command::Rearm(next_root) => {
                        root_index = next_root;
                        control.state = WorkerState::Running;
                        break;
                    }
                }
            }
            control.state = WorkerState::Parked;
            control = shared
                .wake
                .wait(control)
                .unwrap_or_else(|e| e.into_inner());
        }
        drop(control);

        // Fresh arm: the flag is cleared here and nowhere else while the
        // worker lives.
        shared.flag.reset();
    }
}
