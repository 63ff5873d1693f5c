//! sched_switch trace loader.
//!
//! Parses JSON exports of sched_switch events into a `TraceRun`: the
//! time-ordered switch stream plus the bookkeeping needed to map
//! process names to PIDs.

use super::schema::SchedSwitch;
use crate::utils::config::{EVENT_FIELD_NAMES, MAX_COMM_LEN};
use crate::utils::error::TraceError;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Thread identifier as recorded by the kernel
pub type Pid = u32;

/// A loaded trace run
///
/// **Public** - shared by every assertion helper built on top of it
#[derive(Debug, Clone)]
pub struct TraceRun {
    /// Where the run was loaded from, if it came from disk
    pub source: Option<PathBuf>,

    /// Start of the traced interval (seconds)
    pub start_time: f64,

    /// End of the traced interval (seconds)
    pub end_time: f64,

    /// Switch events sorted by timestamp
    switches: Vec<SchedSwitch>,

    /// Last comm observed for every PID
    comms: BTreeMap<Pid, String>,
}

/// Something that can be turned into a `TraceRun`
///
/// Either an already-loaded run or a path to a trace export.
#[derive(Debug, Clone)]
pub enum RunSource {
    Run(Arc<TraceRun>),
    Path(PathBuf),
}

impl From<Arc<TraceRun>> for RunSource {
    fn from(run: Arc<TraceRun>) -> Self {
        RunSource::Run(run)
    }
}

impl From<TraceRun> for RunSource {
    fn from(run: TraceRun) -> Self {
        RunSource::Run(Arc::new(run))
    }
}

impl From<PathBuf> for RunSource {
    fn from(path: PathBuf) -> Self {
        RunSource::Path(path)
    }
}

impl From<&Path> for RunSource {
    fn from(path: &Path) -> Self {
        RunSource::Path(path.to_path_buf())
    }
}

impl From<&str> for RunSource {
    fn from(path: &str) -> Self {
        RunSource::Path(PathBuf::from(path))
    }
}

/// Resolve a run source into a shared run
///
/// **Public** - used by the aggregator at construction
///
/// # Errors
/// * `TraceError::Io` - the trace file could not be read
/// * `TraceError::Json` - the file is not valid JSON
/// * `TraceError::InvalidFormat` - the JSON does not describe a sched_switch trace
pub fn init_run(source: impl Into<RunSource>) -> Result<Arc<TraceRun>, TraceError> {
    match source.into() {
        RunSource::Run(run) => Ok(run),
        RunSource::Path(path) => load_run(&path).map(Arc::new),
    }
}

/// Load a trace run from a JSON file
///
/// **Public** - main entry point for file-based traces
pub fn load_run(path: impl AsRef<Path>) -> Result<TraceRun, TraceError> {
    let path = path.as_ref();

    info!("Loading trace: {}", path.display());

    let file = File::open(path)?;
    let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;

    let mut run = parse_trace(&raw)?;
    run.source = Some(path.to_path_buf());

    Ok(run)
}

/// Parse raw trace JSON
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `raw_trace` - Either an object holding the switch array or a bare array
///
/// # Returns
/// A trace run with switches sorted by timestamp
///
/// # Errors
/// * `TraceError::Json` - An event does not match the sched_switch schema
/// * `TraceError::InvalidFormat` - Missing events or invalid timestamps
pub fn parse_trace(raw_trace: &serde_json::Value) -> Result<TraceRun, TraceError> {
    let (events, explicit_start, explicit_end) = match raw_trace {
        serde_json::Value::Object(obj) => {
            let events = EVENT_FIELD_NAMES
                .iter()
                .find_map(|name| obj.get(*name).filter(|v| v.is_array()))
                .ok_or_else(|| {
                    TraceError::InvalidFormat(format!(
                        "No event array found (expected one of: {})",
                        EVENT_FIELD_NAMES.join(", ")
                    ))
                })?;
            let start = obj.get("start_time").and_then(|v| v.as_f64());
            let end = obj.get("end_time").and_then(|v| v.as_f64());
            (events.clone(), start, end)
        }

        serde_json::Value::Array(_) => {
            debug!("Trace is a bare event array");
            (raw_trace.clone(), None, None)
        }

        _ => {
            return Err(TraceError::InvalidFormat(
                "Trace must be a JSON object or array".to_string(),
            ))
        }
    };

    let switches: Vec<SchedSwitch> = serde_json::from_value(events)?;
    TraceRun::from_switches(switches, explicit_start, explicit_end)
}

impl TraceRun {
    /// Build a run from switch events
    ///
    /// **Public** - used by the parser and by tests building synthetic runs
    pub fn from_switches(
        mut switches: Vec<SchedSwitch>,
        start_time: Option<f64>,
        end_time: Option<f64>,
    ) -> Result<Self, TraceError> {
        if switches.is_empty() {
            return Err(TraceError::InvalidFormat(
                "Trace contains no sched_switch events".to_string(),
            ));
        }

        if let Some(bad) = switches.iter().find(|s| !s.ts.is_finite() || s.ts < 0.0) {
            return Err(TraceError::InvalidFormat(format!(
                "Invalid timestamp {} on CPU {}",
                bad.ts, bad.cpu
            )));
        }

        switches.sort_by(|a, b| a.ts.total_cmp(&b.ts));

        let first_ts = switches[0].ts;
        let last_ts = switches[switches.len() - 1].ts;
        let start_time = start_time.map_or(first_ts, |t| t.min(first_ts));
        let end_time = end_time.map_or(last_ts, |t| t.max(last_ts));

        let mut comms = BTreeMap::new();
        for switch in &switches {
            comms.insert(switch.prev_pid, switch.prev_comm.clone());
            comms.insert(switch.next_pid, switch.next_comm.clone());
        }

        debug!(
            "Parsed {} sched_switch events spanning {:.6}s..{:.6}s",
            switches.len(),
            start_time,
            end_time
        );

        Ok(Self {
            source: None,
            start_time,
            end_time,
            switches,
            comms,
        })
    }

    /// Switch events in timestamp order
    pub fn switches(&self) -> &[SchedSwitch] {
        &self.switches
    }

    /// Length of the traced interval
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// PIDs whose switched-in comm is `execname`
    ///
    /// **Public** - process name to PID resolution
    ///
    /// Names longer than the kernel's comm limit are compared in their
    /// truncated form, so `kworker-long-name` finds `kworker-long-na`.
    pub fn pids_for_process(&self, execname: &str) -> Vec<Pid> {
        let comm: String = execname.chars().take(MAX_COMM_LEN).collect();

        let pids: BTreeSet<Pid> = self
            .switches
            .iter()
            .filter(|s| s.next_comm == comm)
            .map(|s| s.next_pid)
            .collect();

        pids.into_iter().collect()
    }

    /// Last comm observed for `pid`
    pub fn task_name(&self, pid: Pid) -> Option<&str> {
        self.comms.get(&pid).map(String::as_str)
    }

    /// Every CPU that appears in the trace
    pub fn cpus(&self) -> BTreeSet<u32> {
        self.switches.iter().map(|s| s.cpu).collect()
    }
}
