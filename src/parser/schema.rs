//! Input and output JSON schema definitions.
//!
//! `SchedSwitch` is the record we read from trace exports; `Report` is the
//! structure of the JSON files we write to disk. The report schema is
//! versioned to allow future evolution.

use crate::aggregator::ThreadResults;
use serde::{Deserialize, Serialize};

/// A single sched_switch record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedSwitch {
    /// Timestamp in seconds
    #[serde(alias = "timestamp")]
    pub ts: f64,

    /// CPU the switch happened on
    pub cpu: u32,

    /// Task being switched out
    pub prev_comm: String,
    pub prev_pid: u32,

    /// Scheduler state of the outgoing task ("R", "S", "D", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_state: Option<String>,

    /// Task being switched in
    pub next_comm: String,
    pub next_pid: u32,
}

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Trace file the report was computed from
    pub trace: String,

    /// Process names the threads were resolved from
    pub execnames: Vec<String>,

    /// Combined per-thread results of every request
    pub results: ThreadResults,

    /// Quorum verdicts for requests that carried a rank
    pub checks: Vec<QuorumCheck>,
}

/// Verdict of a ranked assert request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumCheck {
    /// Result key the per-thread values were stored under
    pub param: String,

    /// Operation that was dispatched
    pub operation: String,

    /// Number of threads required to pass
    pub rank: usize,

    /// Whether exactly `rank` threads passed
    pub passed: bool,
}
