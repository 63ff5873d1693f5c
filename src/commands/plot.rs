//! Plot command implementation.
//!
//! Builds the combined timeline of every resolved thread and writes it as SVG.

use super::models::PlotArgs;
use super::utils::load_inputs;
use crate::aggregator::SchedMultiAssert;
use crate::output::write_svg;
use anyhow::{Context, Result};
use log::info;

/// Execute the plot command
///
/// **Public** - main entry point called from main.rs
pub fn execute_plot(args: PlotArgs) -> Result<()> {
    let (run, topology) = load_inputs(&args.trace)?;
    let multi = SchedMultiAssert::new(run, &topology, args.trace.execnames.clone())?;

    let plot = multi.plot().context("Failed to build event plot")?;
    info!(
        "Plotting {} events for {} threads",
        plot.events.len(),
        plot.names.len()
    );

    let svg = plot
        .render_svg(&args.config)
        .context("Failed to render event plot")?;

    write_svg(&svg, &args.output).context("Failed to write plot SVG")?;
    info!("✓ Plot written to: {}", args.output.display());

    Ok(())
}
