//! Check command implementation.
//!
//! The check command:
//! 1. Loads the trace and topology
//! 2. Resolves process names to threads
//! 3. Runs every request into one combined result map
//! 4. Records quorum verdicts for ranked requests
//! 5. Writes the JSON report

use super::models::CheckArgs;
use super::utils::load_inputs;
use crate::aggregator::{Request, SchedMultiAssert, ThreadResults};
use crate::output::write_report;
use crate::parser::schema::{QuorumCheck, Report};
use crate::utils::config::REPORT_SCHEMA_VERSION;
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

/// Read a JSON list of requests
pub fn read_requests(path: impl AsRef<Path>) -> Result<Vec<Request>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open requests {}", path.display()))?;
    let requests: Vec<Request> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid requests in {}", path.display()))?;

    debug!("Loaded {} requests", requests.len());
    Ok(requests)
}

/// Execute the check command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// `true` if every ranked request met its quorum
///
/// # Errors
/// * Trace, topology or request loading failures
/// * Any per-thread operation failure
/// * Report write errors
pub fn execute_check(args: CheckArgs) -> Result<bool> {
    let start_time = Instant::now();

    info!("Step 1/4: Loading inputs...");
    let (run, topology) = load_inputs(&args.trace)?;
    let requests = read_requests(&args.requests)?;

    info!("Step 2/4: Resolving threads for {:?}...", args.trace.execnames);
    let multi = SchedMultiAssert::new(run, &topology, args.trace.execnames.clone())?;
    info!("Found {} threads", multi.pids().len());

    info!("Step 3/4: Running {} requests...", requests.len());
    let mut results = ThreadResults::new();
    let mut checks = Vec::new();

    for request in &requests {
        let kind = request.operation.kind();
        let verdict = multi
            .dispatch_into(request, &mut results)
            .with_context(|| format!("Request {} failed", kind))?;

        if let (Some(passed), Some(rank)) = (verdict, request.rank) {
            info!(
                "{} {}: {} (rank {})",
                if passed { "✓" } else { "✗" },
                kind,
                if passed { "met" } else { "not met" },
                rank
            );
            checks.push(QuorumCheck {
                param: request.param_name()?,
                operation: kind.to_string(),
                rank,
                passed,
            });
        }
    }

    let all_passed = checks.iter().all(|c| c.passed);

    let report = Report {
        version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        trace: args.trace.trace.display().to_string(),
        execnames: multi.execnames().to_vec(),
        results,
        checks,
    };

    if let Some(output) = &args.output {
        info!("Step 4/4: Writing report...");
        write_report(&report, output).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", output.display());
    } else {
        info!("Step 4/4: Skipping report (no output path)");
    }

    if args.print_summary {
        print_summary(&report);
    }

    info!("Check completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(all_passed)
}

fn print_summary(report: &Report) {
    println!("\n{}", "=".repeat(80));
    println!("SCHED ASSERT SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Trace:   {}", report.trace);
    println!("Threads: {}", report.results.len());

    for (pid, thread) in &report.results {
        println!("\n  {} ({})", thread.task_name, pid);
        for (param, value) in &thread.values {
            let shown = serde_json::to_string(value).unwrap_or_default();
            println!("    {:<20} {}", param, shown);
        }
    }

    if !report.checks.is_empty() {
        println!("\nQuorum checks:");
        for check in &report.checks {
            println!(
                "  {} {:<24} rank {:<3} {}",
                if check.passed { "✓" } else { "✗" },
                check.operation,
                check.rank,
                check.param
            );
        }
    }
    println!("{}", "=".repeat(80));
}
