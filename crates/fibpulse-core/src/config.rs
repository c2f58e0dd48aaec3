//! Worker configuration types.

use std::time::Duration;

use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Which branching pattern the traversal engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TraversalShape {
    /// Doubly-recursive shape: each node at `index >= 2` has two children,
    /// `index-1` and `index-2`. Only leaves pace.
    Binary,
    /// Each node at `index >= 1` spawns `fib(index)` children at `index-1`.
    /// Every node paces, and siblings pace between each other.
    FanOut,
}

/// Configuration for the traversal worker.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WorkerConfig {
    /// Fibonacci index of the root node.
    #[builder(default = "3")]
    #[serde(default = "default_root_index")]
    pub root_index: u32,

    /// How much deeper each child sits relative to its parent.
    /// Applies to the binary shape; fan-out children always sit one deeper.
    #[builder(default = "2")]
    #[serde(default = "default_depth_increment")]
    pub depth_increment: u32,

    /// Delay held at each pacing point. A visualization aid, not a contract.
    #[builder(default = "Duration::from_millis(500)")]
    #[serde(default = "default_pacing")]
    pub pacing: Duration,

    /// Branching pattern to produce.
    #[builder(default = "TraversalShape::Binary")]
    #[serde(default = "default_shape")]
    pub shape: TraversalShape,

    /// Identity carried in every notification and used as the worker
    /// thread's name.
    #[builder(default = "CompactString::const_new(\"fibpulse-worker\")")]
    #[serde(default = "default_worker_name")]
    pub worker_name: CompactString,
}

fn default_root_index() -> u32 {
    3
}

fn default_depth_increment() -> u32 {
    2
}

fn default_pacing() -> Duration {
    Duration::from_millis(500)
}

fn default_shape() -> TraversalShape {
    TraversalShape::Binary
}

fn default_worker_name() -> CompactString {
    CompactString::const_new("fibpulse-worker")
}

impl WorkerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.depth_increment {
            return Err("depth_increment must be at least 1".to_string());
        }
        if let Some(ref name) = self.worker_name {
            if name.is_empty() {
                return Err("worker_name cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl WorkerConfig {
    /// Create a new worker config builder.
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    /// Create a config for the given root index with default settings.
    pub fn new(root_index: u32) -> Self {
        Self {
            root_index,
            depth_increment: default_depth_increment(),
            pacing: default_pacing(),
            shape: default_shape(),
            worker_name: default_worker_name(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(default_root_index())
    }
}
