use crate::plot::PlotConfig;
use std::path::PathBuf;

/// Inputs shared by every command that builds an aggregator
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct TraceArgs {
    /// sched_switch trace export
    pub trace: PathBuf,

    /// Topology JSON (derived from the trace when absent)
    pub topology: Option<PathBuf>,

    /// Process names to resolve
    pub execnames: Vec<String>,
}

/// Arguments for the check command
#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub trace: TraceArgs,

    /// JSON file holding a list of requests
    pub requests: PathBuf,

    /// Output path for the JSON report (optional)
    pub output: Option<PathBuf>,

    /// Print the per-thread results to stdout
    pub print_summary: bool,
}

/// Arguments for the plot command
#[derive(Debug, Clone)]
pub struct PlotArgs {
    pub trace: TraceArgs,

    /// Output path for the SVG plot
    pub output: PathBuf,

    pub config: PlotConfig,
}
