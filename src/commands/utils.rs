use super::models::TraceArgs;
use crate::aggregator::SchedMultiAssert;
use crate::parser::{load_run, TraceRun};
use crate::topology::{load_topology, Topology};
use crate::utils::config::REPORT_SCHEMA_VERSION;
use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;

/// Load the run and topology named by the CLI
pub fn load_inputs(args: &TraceArgs) -> Result<(Arc<TraceRun>, Topology)> {
    if args.execnames.is_empty() {
        bail!("At least one process name is required");
    }

    let run = load_run(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;

    let topology = match &args.topology {
        Some(path) => load_topology(path)
            .with_context(|| format!("Failed to load topology {}", path.display()))?,
        None => {
            info!("No topology given, deriving one from the trace");
            Topology::from_run(&run)
        }
    };

    Ok((Arc::new(run), topology))
}

/// List the threads resolved for the given process names
pub fn list_pids(args: &TraceArgs) -> Result<()> {
    let (run, topology) = load_inputs(args)?;
    let multi = SchedMultiAssert::new(run, &topology, args.execnames.clone())?;

    let run = multi.run();
    let levels: Vec<String> = multi
        .topology()
        .levels()
        .map(|level| format!("{} ({})", level, multi.topology().level_span(level).unwrap_or(0)))
        .collect();

    println!(
        "Trace: {:.6}s .. {:.6}s ({:.6}s)",
        run.start_time,
        run.end_time,
        run.duration()
    );
    println!("Topology: {}", levels.join(", "));
    println!("Process names: {}", args.execnames.join(", "));
    println!("Threads: {}", multi.pids().len());
    for (pid, helper) in multi.asserts() {
        println!("  {:>7}  {:<16}  {} spans", pid, helper.execname, helper.residencies().len());
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("sched-multi-assert v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_SCHEMA_VERSION);
    println!();
    println!("Batched scheduler assertions across every thread of a process.");
}
