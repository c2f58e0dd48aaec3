//! fibpulse - A background worker that pulses a Fibonacci traversal to an
//! external observer.
//!
//! Usage:
//!   fibp                     Run the resident worker (ctrl-c to stop)
//!   fibp --once              Run one traversal, then exit
//!   fibp tree                Print one traversal immediately, no pacing
//!   fibp --help              Show help

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use fibpulse_core::{NotificationEvent, NotifyError, TraversalShape, WorkerConfig, WorkerState};
use fibpulse_engine::{CancelFlag, Controller, Traversal};
use fibpulse_notify::{CommandFileNotifier, CommandNotifier, Notifier, NullNotifier};

#[derive(Parser)]
#[command(
    name = "fibpulse",
    version,
    about = "A background worker that pulses a Fibonacci traversal to an external observer",
    long_about = "fibpulse walks a Fibonacci-shaped tree on a background worker thread,\n\
                  announcing every visited node to an external observer and tracing the\n\
                  tree as it goes. The worker parks after each traversal and can be\n\
                  re-armed or stopped at any point, including mid-recursion."
)]
struct Cli {
    /// Fibonacci index of the root node
    #[arg(short = 'n', long, default_value = "3")]
    root_index: u32,

    /// Traversal shape
    #[arg(long, value_enum, default_value = "binary")]
    shape: ShapeArg,

    /// Pacing delay per node, in milliseconds
    #[arg(long, default_value = "500")]
    pacing_ms: u64,

    /// How much deeper children sit relative to their parent (binary shape)
    #[arg(long, default_value = "2")]
    depth_increment: u32,

    /// Command file the observer watches (one SPAWN_GUI line per node)
    #[arg(long)]
    command_file: Option<PathBuf>,

    /// Observer program launched once per visited node
    #[arg(long = "command", conflicts_with = "command_file")]
    observer: Option<PathBuf>,

    /// Exit after the first traversal parks instead of staying resident
    #[arg(long)]
    once: bool,

    #[command(subcommand)]
    subcommand: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print one traversal immediately, without pacing or a worker thread
    Tree {
        /// Fibonacci index of the root node
        #[arg(short = 'n', long, default_value = "3")]
        root_index: u32,

        /// Traversal shape
        #[arg(long, value_enum, default_value = "binary")]
        shape: ShapeArg,

        /// How much deeper children sit relative to their parent (binary shape)
        #[arg(long, default_value = "2")]
        depth_increment: u32,

        /// Emit the run report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ShapeArg {
    #[default]
    Binary,
    FanOut,
}

impl From<ShapeArg> for TraversalShape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Binary => TraversalShape::Binary,
            ShapeArg::FanOut => TraversalShape::FanOut,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.subcommand {
        Some(Command::Tree {
            root_index,
            shape,
            depth_increment,
            json,
        }) => run_tree(root_index, shape.into(), depth_increment, json),
        None => run_worker(cli).await,
    }
}

/// Run the resident worker until ctrl-c (or until the first traversal
/// parks, with `--once`).
async fn run_worker(cli: Cli) -> Result<()> {
    let config = WorkerConfig::builder()
        .root_index(cli.root_index)
        .depth_increment(cli.depth_increment)
        .pacing(Duration::from_millis(cli.pacing_ms))
        .shape(TraversalShape::from(cli.shape))
        .build()
        .context("Invalid configuration")?;

    let notifier: Arc<dyn Notifier> = if let Some(path) = cli.command_file {
        Arc::new(CommandFileNotifier::new(path))
    } else if let Some(program) = cli.observer {
        Arc::new(CommandNotifier::new(program))
    } else {
        Arc::new(NullNotifier)
    };

    let mut controller = Controller::init(config, notifier)?;
    let mut events = controller.subscribe();
    controller.start(cli.root_index)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Ok(event) => print_node(&event),
                Err(RecvError::Lagged(skipped)) => eprintln!("... fell behind by {skipped} events"),
                Err(RecvError::Closed) => break,
            },
            _ = poll.tick() => {
                if cli.once && controller.state() == WorkerState::Parked {
                    break;
                }
            }
        }
    }

    controller.shutdown();

    if let Some(report) = controller.last_report() {
        eprintln!(
            "fib({}) [{}]: {} nodes, {} ({} notify failures) in {:.2?}",
            report.root_index,
            report.shape,
            report.nodes_visited,
            report.outcome,
            report.notify_failures,
            report.duration
        );
    }

    Ok(())
}

/// Traverse once with zero pacing and print the visitation tree.
fn run_tree(root_index: u32, shape: TraversalShape, depth_increment: u32, json: bool) -> Result<()> {
    let config = WorkerConfig::builder()
        .root_index(root_index)
        .depth_increment(depth_increment)
        .pacing(Duration::ZERO)
        .shape(shape)
        .build()
        .context("Invalid configuration")?;

    let engine = Traversal::new(config);
    let report = engine.run(root_index, &CancelFlag::new(), &PrintNotifier);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("{}", "─".repeat(60));
        println!(
            " fib({root_index}) [{shape}]: {} nodes in {:.2?}",
            report.nodes_visited, report.duration
        );
        println!("{}", "─".repeat(60));
    }

    Ok(())
}

/// Print one visited node as an indented tree line.
fn print_node(event: &NotificationEvent) {
    match event.derived_value {
        Some(derived) => println!(
            "{:indent$}fib({}) = {derived}",
            "",
            event.index,
            indent = event.depth as usize
        ),
        None => println!("{:indent$}fib({})", "", event.index, indent = event.depth as usize),
    }
}

/// Notifier that renders each visited node straight to stdout.
struct PrintNotifier;

impl Notifier for PrintNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        print_node(event);
        Ok(())
    }
}
