//! Output writers for reports and plots.
//!
//! This module handles writing data to disk in various formats:
//! - JSON reports
//! - SVG event plots

pub mod json;
pub mod svg;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report};
pub use svg::{validate_path, write_svg};
