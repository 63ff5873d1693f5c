//! Build per-CPU residency intervals for a single thread.
//!
//! A residency is a span during which the thread was the running task on
//! one CPU. Every single-thread metric is computed from these spans.

use super::operation::Window;
use crate::parser::{Pid, TraceRun};
use log::debug;
use std::collections::BTreeMap;

/// One span of a thread running on a CPU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residency {
    pub cpu: u32,
    pub start: f64,
    pub end: f64,
}

impl Residency {
    pub fn new(cpu: u32, start: f64, end: f64) -> Self {
        Self { cpu, start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Part of this span inside `window`, if any
    ///
    /// Spans that only touch a window edge do not overlap it.
    pub fn clip(&self, window: &Window) -> Option<Residency> {
        let start = self.start.max(window.start);
        let end = self.end.min(window.end);
        (start < end).then(|| Residency::new(self.cpu, start, end))
    }
}

/// Build residencies for `pid` from the run's switch stream
///
/// **Public** - computed once per assertion helper
///
/// # Algorithm
/// 1. Switching in on a CPU opens a span on that CPU
/// 2. Switching out closes the open span on that CPU
/// 3. A thread whose first appearance is a switch-out was running since the start of the run
/// 4. Spans still open at the end close at the end of the run
pub fn build_residencies(run: &TraceRun, pid: Pid) -> Vec<Residency> {
    let mut open: BTreeMap<u32, f64> = BTreeMap::new();
    let mut spans = Vec::new();
    let mut seen = false;

    for switch in run.switches() {
        if switch.prev_pid == pid {
            if let Some(start) = open.remove(&switch.cpu) {
                spans.push(Residency::new(switch.cpu, start, switch.ts));
            } else if !seen {
                spans.push(Residency::new(switch.cpu, run.start_time, switch.ts));
            }
            seen = true;
        }

        if switch.next_pid == pid {
            open.insert(switch.cpu, switch.ts);
            seen = true;
        }
    }

    for (cpu, start) in open {
        spans.push(Residency::new(cpu, start, run.end_time));
    }

    spans.sort_by(|a, b| a.start.total_cmp(&b.start));

    debug!("PID {}: {} residency spans", pid, spans.len());

    spans
}

/// Spans clipped to `window`
pub fn clip_all(spans: &[Residency], window: &Window) -> Vec<Residency> {
    spans.iter().filter_map(|s| s.clip(window)).collect()
}

/// Total time covered by `spans`
pub fn total_time(spans: &[Residency]) -> f64 {
    spans.iter().map(Residency::duration).sum()
}

/// Mean gap between consecutive edges; `None` for fewer than two edges
pub fn mean_gap(edges: &[f64]) -> Option<f64> {
    if edges.len() < 2 {
        return None;
    }

    let gaps: f64 = edges.windows(2).map(|pair| pair[1] - pair[0]).sum();
    Some(gaps / (edges.len() - 1) as f64)
}
