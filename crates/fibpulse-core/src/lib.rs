//! Core types for fibpulse.
//!
//! This crate provides the fundamental data structures shared across
//! the fibpulse ecosystem: worker configuration, lifecycle state,
//! notification events, and error types.

mod config;
mod error;
mod event;
mod state;

pub use config::{TraversalShape, WorkerConfig, WorkerConfigBuilder};
pub use error::{NotifyError, WorkerError};
pub use event::{NotificationEvent, TraversalOutcome, TraversalReport};
pub use state::WorkerState;
