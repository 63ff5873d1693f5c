//! Single-thread scheduler assertions.
//!
//! This module provides:
//! - Residency spans derived from the sched_switch stream
//! - The typed operation catalogue (`Operation`, `OperationKind`)
//! - `SchedAssert`, which evaluates those operations for one PID

pub mod operation;
pub mod residency;
pub mod sched_assert;

// Re-export main types
pub use operation::{Align, Comparison, MetricValue, Operation, OperationKind, Window};
pub use residency::Residency;
pub use sched_assert::{Event, SchedAssert};
