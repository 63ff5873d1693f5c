//! Batched scheduler assertions across every thread of one or more processes.
//!
//! `SchedMultiAssert` resolves process names to PIDs, builds one
//! `SchedAssert` per PID and fans typed requests out to all of them.
//! It does not compare runs; every helper shares the same trace run.

use super::dispatch::{Outcome, Request, ThreadReport, ThreadResults};
use crate::assert::{Event, MetricValue, OperationKind, SchedAssert};
use crate::parser::{init_run, Pid, RunSource, TraceRun};
use crate::plot::EventPlot;
use crate::topology::Topology;
use crate::utils::config::{CPU_LANE_PREFIX, DEFAULT_PLOT_LEVEL};
use crate::utils::error::{AssertError, TraceError};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One or more process names
///
/// A single name is normalized into a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecNames(Vec<String>);

impl From<&str> for ExecNames {
    fn from(name: &str) -> Self {
        ExecNames(vec![name.to_string()])
    }
}

impl From<String> for ExecNames {
    fn from(name: String) -> Self {
        ExecNames(vec![name])
    }
}

impl From<Vec<String>> for ExecNames {
    fn from(names: Vec<String>) -> Self {
        ExecNames(names)
    }
}

impl From<&[&str]> for ExecNames {
    fn from(names: &[&str]) -> Self {
        ExecNames(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ExecNames {
    fn from(names: [&str; N]) -> Self {
        ExecNames(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Assertions over every thread matching a set of process names
#[derive(Debug)]
pub struct SchedMultiAssert<'a> {
    execnames: Vec<String>,
    run: Arc<TraceRun>,
    pids: BTreeSet<Pid>,
    topology: &'a Topology,
    asserts: BTreeMap<Pid, SchedAssert<'a>>,
    capabilities: BTreeSet<OperationKind>,
}

impl<'a> SchedMultiAssert<'a> {
    /// Build the aggregator
    ///
    /// **Public** - main entry point
    ///
    /// # Arguments
    /// * `run` - A loaded run or a path to a trace export
    /// * `topology` - CPU topology, borrowed for the aggregator's lifetime
    /// * `execnames` - One process name or a list of them
    ///
    /// # Errors
    /// * `TraceError` - the run could not be loaded
    ///
    /// A process name that matches no thread is not an error; batched
    /// calls then simply cover fewer (possibly zero) threads.
    pub fn new(
        run: impl Into<RunSource>,
        topology: &'a Topology,
        execnames: impl Into<ExecNames>,
    ) -> Result<Self, TraceError> {
        let execnames = execnames.into().0;
        let run = init_run(run)?;
        let pids = populate_pids(&run, &execnames);

        if pids.is_empty() {
            warn!("No threads found for {:?}", execnames);
        } else {
            debug!("Resolved {:?} to PIDs {:?}", execnames, pids);
        }

        let asserts = pids
            .iter()
            .map(|pid| (*pid, SchedAssert::new(Arc::clone(&run), topology, *pid)))
            .collect();

        let capabilities = SchedAssert::CAPABILITIES.iter().copied().collect();

        Ok(Self {
            execnames,
            run,
            pids,
            topology,
            asserts,
            capabilities,
        })
    }

    pub fn execnames(&self) -> &[String] {
        &self.execnames
    }

    pub fn run(&self) -> &TraceRun {
        &self.run
    }

    pub fn topology(&self) -> &Topology {
        self.topology
    }

    pub fn pids(&self) -> &BTreeSet<Pid> {
        &self.pids
    }

    /// Per-thread helpers in PID order
    pub fn asserts(&self) -> impl Iterator<Item = (Pid, &SchedAssert<'a>)> {
        self.asserts.iter().map(|(pid, helper)| (*pid, helper))
    }

    /// Operations that can be batched
    pub fn capabilities(&self) -> &BTreeSet<OperationKind> {
        &self.capabilities
    }

    /// Look up a batchable operation by name
    pub fn resolve_operation(&self, name: &str) -> Result<OperationKind, AssertError> {
        let kind: OperationKind = name.parse()?;
        if !self.capabilities.contains(&kind) {
            return Err(AssertError::UnknownOperation(name.to_string()));
        }
        Ok(kind)
    }

    /// Task name of a resolved thread
    pub fn get_task_name(&self, pid: Pid) -> Result<&str, AssertError> {
        self.asserts
            .get(&pid)
            .map(|helper| helper.execname.as_str())
            .ok_or(AssertError::UnknownPid(pid))
    }

    /// Run `request` on every thread, accumulating into `result`
    ///
    /// **Public** - the batched dispatch underneath every request
    ///
    /// Each thread gets an entry (with its task name) if it has none yet,
    /// and the operation's value is stored under the request's param.
    /// Entries already present in `result` are kept, so several requests
    /// can be chained into one map.
    ///
    /// # Returns
    /// `Some(passed)` for an assert request with a rank, where `passed` is
    /// true iff exactly `rank` threads returned a truthy value; `None` otherwise.
    ///
    /// # Errors
    /// * `AssertError::UnknownOperation` - operation outside the capability set
    /// * `AssertError::RankOnQuery` - a rank was given for a `get_*` operation
    /// * `AssertError::ReservedParam` - the param would clobber `task_name`
    /// * Any error of the per-thread operation
    pub fn dispatch_into(
        &self,
        request: &Request,
        result: &mut ThreadResults,
    ) -> Result<Option<bool>, AssertError> {
        let kind = request.operation.kind();

        if !self.capabilities.contains(&kind) {
            return Err(AssertError::UnknownOperation(kind.name().to_string()));
        }

        if request.rank.is_some() && !kind.is_assert() {
            return Err(AssertError::RankOnQuery(kind.name().to_string()));
        }

        let param = request.param_name()?;

        // Evaluate every thread before touching the accumulator
        let values = self
            .asserts
            .iter()
            .map(|(pid, helper)| -> Result<(Pid, MetricValue), AssertError> {
                Ok((*pid, helper.evaluate(&request.operation)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let passed = if kind.is_assert() {
            values.iter().filter(|(_, value)| value.is_truthy()).count()
        } else {
            0
        };

        for (pid, value) in values {
            let task_name = self.get_task_name(pid)?;
            result
                .entry(pid)
                .or_insert_with(|| ThreadReport::new(task_name))
                .values
                .insert(param.clone(), value);
        }

        debug!(
            "{} over {} threads stored as '{}' ({} truthy)",
            kind,
            self.asserts.len(),
            param,
            passed
        );

        Ok(request.rank.map(|rank| passed == rank))
    }

    /// Run `request` on every thread with a fresh accumulator
    pub fn dispatch(&self, request: &Request) -> Result<Outcome, AssertError> {
        let mut results = ThreadResults::new();

        Ok(match self.dispatch_into(request, &mut results)? {
            Some(passed) => Outcome::Quorum(passed),
            None => Outcome::Results(results),
        })
    }

    /// Plot events of every thread with globally unique ids
    ///
    /// Ids are contiguous from 0; each thread's ids start where the
    /// previous thread's ended.
    pub fn generate_events(&self) -> Result<Vec<Event>, AssertError> {
        let mut events = Vec::new();

        for helper in self.asserts.values() {
            let thread_events = helper.generate_events(DEFAULT_PLOT_LEVEL, events.len(), None)?;
            events.extend(thread_events);
        }

        Ok(events)
    }

    /// Combined CPU timeline of every thread
    ///
    /// Nothing is rendered; call `EventPlot::render_svg` to view it.
    pub fn plot(&self) -> Result<EventPlot, AssertError> {
        let events = self.generate_events()?;
        let names = self.asserts.values().map(|h| h.name.clone()).collect();
        let num_lanes = self.topology.level_span(DEFAULT_PLOT_LEVEL)?;

        Ok(EventPlot::new(events, names, CPU_LANE_PREFIX, num_lanes))
    }
}

/// Map process names to the deduplicated set of their PIDs
fn populate_pids(run: &TraceRun, execnames: &[String]) -> BTreeSet<Pid> {
    execnames
        .iter()
        .flat_map(|name| run.pids_for_process(name))
        .collect()
}
