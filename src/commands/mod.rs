//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod check;
pub mod models;
pub mod plot;
pub mod utils;

// Re-export main command functions
pub use check::{execute_check, read_requests};
pub use models::{CheckArgs, PlotArgs, TraceArgs};
pub use plot::execute_plot;
pub use utils::{display_version, list_pids};
