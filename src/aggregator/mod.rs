//! Batched assertions across every thread of a set of processes.
//!
//! This module turns one single-thread operation into a call over all
//! resolved threads, and combines the per-thread answers into:
//! - A per-thread result map (for `get_*` and unranked `assert_*` requests)
//! - A quorum verdict (for ranked `assert_*` requests)
//! - One merged event stream for plotting

pub mod dispatch;
pub mod multi_assert;

// Re-export main types
pub use dispatch::{Outcome, Request, ThreadReport, ThreadResults};
pub use multi_assert::{ExecNames, SchedMultiAssert};
