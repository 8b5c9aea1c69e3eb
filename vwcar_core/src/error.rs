use thiserror::Error;

/// Construction-time errors. Never produced once a `Session` is running.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing car params")]
    MissingCarParams,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Malformed input while replaying a recorded frame log.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReplayError {
    #[error("line {line}: malformed row: {reason}")]
    MalformedRow { line: usize, reason: String },
    #[error("line {line}: unknown bus {bus:?}")]
    UnknownBus { line: usize, bus: String },
    #[error("line {line}: frame {frame} goes backwards (last {last})")]
    FrameOrder { line: usize, frame: u64, last: u64 },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
