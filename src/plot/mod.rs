//! Event plots of scheduler activity.
//!
//! This module converts merged per-thread events into an SVG timeline,
//! one row per CPU lane.

pub mod event_plot;

// Re-export main types
pub use event_plot::{EventPlot, PlotConfig};
