//! sched-multi-assert CLI
//!
//! Runs batched scheduler assertions over every thread of the given
//! processes and plots their combined CPU timeline.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::process::ExitCode;

use sched_multi_assert::commands::{
    display_version, execute_check, execute_plot, list_pids, CheckArgs, PlotArgs, TraceArgs,
};
use sched_multi_assert::plot::PlotConfig;
use sched_multi_assert::utils::config::DEFAULT_PLOT_WIDTH;

/// sched-multi-assert - batched scheduler assertions
#[derive(Parser, Debug)]
#[command(name = "sched-multi-assert")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Trace inputs shared by every command
#[derive(Args, Debug)]
struct TraceInput {
    /// sched_switch trace export (JSON)
    #[arg(short, long, env = "SCHED_TRACE")]
    trace: PathBuf,

    /// Topology JSON; derived from the trace when omitted
    #[arg(long, env = "SCHED_TOPOLOGY")]
    topology: Option<PathBuf>,

    /// Process name (repeatable)
    #[arg(short, long = "execname", required = true)]
    execnames: Vec<String>,
}

impl From<TraceInput> for TraceArgs {
    fn from(input: TraceInput) -> Self {
        TraceArgs {
            trace: input.trace,
            topology: input.topology,
            execnames: input.execnames,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// List threads resolved for the process names
    Pids {
        #[command(flatten)]
        input: TraceInput,
    },

    /// Run a list of requests across every thread
    Check {
        #[command(flatten)]
        input: TraceInput,

        /// JSON file with a list of requests
        #[arg(short, long)]
        requests: PathBuf,

        /// Output path for JSON report (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print per-thread results to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Plot the combined CPU timeline as SVG
    Plot {
        #[command(flatten)]
        input: TraceInput,

        /// Output path for SVG plot
        #[arg(short, long, default_value = "timeline.svg")]
        output: PathBuf,

        /// Plot title
        #[arg(long)]
        title: Option<String>,

        /// Plot width in pixels
        #[arg(long, default_value_t = DEFAULT_PLOT_WIDTH)]
        width: usize,
    },

    /// Display version information
    Version,
}

fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Pids { input } => {
            list_pids(&input.into())?;
        }

        Commands::Check {
            input,
            requests,
            output,
            summary,
        } => {
            let args = CheckArgs {
                trace: input.into(),
                requests,
                output,
                print_summary: summary,
            };

            if !execute_check(args)? {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Plot {
            input,
            output,
            title,
            width,
        } => {
            let mut config = PlotConfig::new().with_width(width);
            if let Some(title_str) = title {
                config = config.with_title(title_str);
            }

            execute_plot(PlotArgs {
                trace: input.into(),
                output,
                config,
            })?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(ExitCode::SUCCESS)
}
