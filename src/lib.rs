//! sched-multi-assert
//!
//! Batched scheduler assertions across every thread of one or more
//! processes in a sched_switch trace.
//!
//! A `SchedMultiAssert` resolves process names to PIDs, wraps each PID in
//! a single-thread `SchedAssert`, and runs typed requests over all of
//! them, returning either the per-thread values or a quorum verdict.
//!
//! ```ignore
//! use sched_multi_assert::aggregator::{Request, SchedMultiAssert};
//! use sched_multi_assert::assert::{Comparison, Operation};
//! use sched_multi_assert::topology::Topology;
//!
//! let topology = Topology::from_clusters(vec![vec![0, 1], vec![2, 3]]);
//! let multi = SchedMultiAssert::new("trace.json", &topology, "worker")?;
//!
//! let request = Request::new(Operation::AssertFirstCpu { cpus: vec![0, 1], window: None })
//!     .with_rank(2);
//! let both_started_little = multi.dispatch(&request)?.quorum();
//! ```

pub mod aggregator;
pub mod assert;
pub mod commands;
pub mod output;
pub mod parser;
pub mod plot;
pub mod topology;
pub mod utils;

pub use aggregator::{Outcome, Request, SchedMultiAssert, ThreadResults};
pub use assert::{Operation, SchedAssert};
pub use parser::TraceRun;
pub use topology::Topology;
