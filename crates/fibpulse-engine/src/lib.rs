//! Cancellable traversal engine and worker controller for fibpulse.
//!
//! This crate is the core of fibpulse: a recursive [`Traversal`] engine
//! producing a Fibonacci-shaped branching pattern, and the [`Controller`]
//! that runs it on a dedicated worker thread with cooperative cancellation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fibpulse_engine::{Controller, WorkerConfig};
//! use fibpulse_notify::NullNotifier;
//!
//! let config = WorkerConfig::default();
//! let mut controller = Controller::init(config, Arc::new(NullNotifier)).unwrap();
//! controller.start(3).unwrap();
//! // ... later
//! controller.request_stop();
//! ```
//!
//! # Event Monitoring
//!
//! Subscribe to the per-node events before starting:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use fibpulse_engine::{Controller, WorkerConfig};
//! # use fibpulse_notify::NullNotifier;
//! let controller = Controller::init(WorkerConfig::default(), Arc::new(NullNotifier)).unwrap();
//! let mut events = controller.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("visited fib({}) at depth {}", event.index, event.depth);
//!     }
//! });
//! ```

mod cancel;
mod traversal;
mod worker;

pub use cancel::CancelFlag;
pub use traversal::{Traversal, fib};
pub use worker::Controller;

// Re-export core types for convenience
pub use fibpulse_core::{
    NotificationEvent, NotifyError, TraversalOutcome, TraversalReport, TraversalShape,
    WorkerConfig, WorkerError, WorkerState,
};
