//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "vwcar", version, about = "VW MQB/PQ/MEB CAN translation layer")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/vwcar.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Unit system shown on the cluster; drives the emulator's display steps.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Units {
    Metric,
    Imperial,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded frame log and print one JSON line per tick
    Replay {
        /// CSV frame log (header: frame,source,message,signal,value)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Write the command log here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Cluster units
        #[arg(long, value_enum, default_value = "metric")]
        units: Units,
        /// Start with speed limit control enabled in the parameter store
        #[arg(long, action = ArgAction::SetTrue)]
        slc: bool,
        /// Omit frames that produced no outgoing messages
        #[arg(long, action = ArgAction::SetTrue)]
        skip_empty: bool,
    },
    /// Print the subscription tables for the configured car
    Signals,
    /// Build a session from the config and run one idle tick
    SelfCheck,
}
