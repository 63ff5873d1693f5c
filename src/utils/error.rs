//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while loading a trace run
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),
}

/// Errors that can occur during topology lookups
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Unknown topology level: {0}")]
    UnknownLevel(String),

    #[error("Node {node:?} is not part of level {level}")]
    UnknownNode { level: String, node: Vec<u32> },

    #[error("CPU {cpu} is not part of level {level}")]
    CpuNotInLevel { level: String, cpu: u32 },

    #[error("Failed to read topology: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by single-thread and batched assertions
#[derive(Error, Debug)]
pub enum AssertError {
    #[error("No assertion helper for PID {0}")]
    UnknownPid(u32),

    #[error("Unsupported operation: {0}")]
    UnknownOperation(String),

    #[error("Rank is only meaningful for assert operations, got {0}")]
    RankOnQuery(String),

    #[error("Parameter name '{0}' is reserved")]
    ReservedParam(String),

    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow { start: f64, end: f64 },

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors that can occur while rendering an event plot
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("No events to plot")]
    NoEvents,
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
