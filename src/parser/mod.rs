//! Trace parsing and schema definitions.
//!
//! This module handles:
//! - Parsing sched_switch JSON exports into a `TraceRun`
//! - Resolving process names to PIDs
//! - Defining the report schema written to disk

pub mod schema;
pub mod sched_trace;

// Re-export main types
pub use schema::{QuorumCheck, Report, SchedSwitch};
pub use sched_trace::{init_run, load_run, parse_trace, Pid, RunSource, TraceRun};
