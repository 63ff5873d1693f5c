//! Scheduler assertions for a single thread.
//!
//! `SchedAssert` answers questions about one PID: where it ran, for how
//! long, how often it woke up, and whether it migrated between nodes of a
//! topology level. The aggregator fans these out across many threads.

use super::operation::{Align, Comparison, MetricValue, Operation, OperationKind, Window};
use super::residency::{build_residencies, clip_all, mean_gap, total_time, Residency};
use crate::parser::{Pid, TraceRun};
use crate::topology::Topology;
use crate::utils::error::AssertError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One bar of an event plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Globally unique event id
    pub id: usize,

    pub start: f64,
    pub end: f64,

    /// Lane (node index at the plotted level)
    pub lane: usize,

    /// Display name of the thread
    pub name: String,
}

/// Assertions over a single thread of a trace run
#[derive(Debug, Clone)]
pub struct SchedAssert<'a> {
    run: Arc<TraceRun>,
    topology: &'a Topology,
    pid: Pid,

    /// Task name of the thread
    pub execname: String,

    /// Display name, `execname-pid`
    pub name: String,

    residencies: Vec<Residency>,
}

impl<'a> SchedAssert<'a> {
    /// Every operation this helper can evaluate
    pub const CAPABILITIES: &'static [OperationKind] = &OperationKind::ALL;

    pub fn new(run: Arc<TraceRun>, topology: &'a Topology, pid: Pid) -> Self {
        let execname = run
            .task_name(pid)
            .map_or_else(|| pid.to_string(), str::to_string);
        let name = format!("{}-{}", execname, pid);
        let residencies = build_residencies(&run, pid);

        Self {
            run,
            topology,
            pid,
            execname,
            name,
            residencies,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn residencies(&self) -> &[Residency] {
        &self.residencies
    }

    /// Validated window, or the whole run
    fn span(&self, window: Option<&Window>) -> Result<Window, AssertError> {
        match window {
            Some(window) => {
                window.validate()?;
                Ok(*window)
            }
            None => Ok(Window::new(self.run.start_time, self.run.end_time)),
        }
    }

    fn in_window(&self, window: Option<&Window>) -> Result<Vec<Residency>, AssertError> {
        let span = self.span(window)?;
        Ok(clip_all(&self.residencies, &span))
    }

    /// Time spent on `node` of `level`
    ///
    /// With `percent`, the share of the thread's residency across every
    /// node of the level.
    pub fn get_residency(
        &self,
        level: &str,
        node: &[u32],
        window: Option<&Window>,
        percent: bool,
    ) -> Result<f64, AssertError> {
        let index = self.topology.get_index(level, node)?;
        let spans = self.in_window(window)?;

        let per_node: Vec<f64> = self
            .topology
            .get_level(level)?
            .iter()
            .map(|cpus| {
                spans
                    .iter()
                    .filter(|s| cpus.contains(&s.cpu))
                    .map(Residency::duration)
                    .sum()
            })
            .collect();

        let value = per_node[index];
        if !percent {
            return Ok(value);
        }

        let total: f64 = per_node.iter().sum();
        Ok(if total > 0.0 { value * 100.0 / total } else { 0.0 })
    }

    pub fn assert_residency(
        &self,
        level: &str,
        node: &[u32],
        expected: f64,
        operator: Comparison,
        window: Option<&Window>,
        percent: bool,
    ) -> Result<bool, AssertError> {
        let value = self.get_residency(level, node, window, percent)?;
        Ok(operator.apply(value, expected))
    }

    /// First time the thread was scheduled in
    pub fn get_start_time(&self) -> Option<f64> {
        self.residencies.first().map(|s| s.start)
    }

    pub fn assert_start_time(&self, bound: f64, operator: Comparison) -> bool {
        self.get_start_time()
            .is_some_and(|start| operator.apply(start, bound))
    }

    /// Last time the thread was scheduled out
    pub fn get_end_time(&self) -> Option<f64> {
        self.residencies
            .iter()
            .map(|s| s.end)
            .max_by(f64::total_cmp)
    }

    pub fn assert_end_time(&self, bound: f64, operator: Comparison) -> bool {
        self.get_end_time()
            .is_some_and(|end| operator.apply(end, bound))
    }

    /// Total running time; with `percent`, relative to the window length
    pub fn get_runtime(&self, window: Option<&Window>, percent: bool) -> Result<f64, AssertError> {
        let span = self.span(window)?;
        let runtime = total_time(&clip_all(&self.residencies, &span));

        if !percent {
            return Ok(runtime);
        }

        let length = span.duration();
        Ok(if length > 0.0 { runtime * 100.0 / length } else { 0.0 })
    }

    pub fn assert_runtime(
        &self,
        expected: f64,
        operator: Comparison,
        window: Option<&Window>,
        percent: bool,
    ) -> Result<bool, AssertError> {
        let value = self.get_runtime(window, percent)?;
        Ok(operator.apply(value, expected))
    }

    /// Mean time between consecutive activations
    pub fn get_period(&self, window: Option<&Window>, align: Align) -> Result<Option<f64>, AssertError> {
        let spans = self.in_window(window)?;
        let mut edges: Vec<f64> = spans
            .iter()
            .map(|s| match align {
                Align::Start => s.start,
                Align::End => s.end,
            })
            .collect();
        edges.sort_by(f64::total_cmp);

        Ok(mean_gap(&edges))
    }

    pub fn assert_period(
        &self,
        expected: f64,
        operator: Comparison,
        window: Option<&Window>,
        align: Align,
    ) -> Result<bool, AssertError> {
        let period = self.get_period(window, align)?;
        Ok(period.is_some_and(|p| operator.apply(p, expected)))
    }

    /// Percentage of the window the thread spent running
    pub fn get_duty_cycle(&self, window: Option<&Window>) -> Result<f64, AssertError> {
        self.get_runtime(window, true)
    }

    pub fn assert_duty_cycle(
        &self,
        expected: f64,
        operator: Comparison,
        window: Option<&Window>,
    ) -> Result<bool, AssertError> {
        let value = self.get_duty_cycle(window)?;
        Ok(operator.apply(value, expected))
    }

    /// CPU of the first activation in the window
    pub fn get_first_cpu(&self, window: Option<&Window>) -> Result<Option<u32>, AssertError> {
        Ok(self.in_window(window)?.first().map(|s| s.cpu))
    }

    pub fn assert_first_cpu(&self, cpus: &[u32], window: Option<&Window>) -> Result<bool, AssertError> {
        let first = self.get_first_cpu(window)?;
        Ok(first.is_some_and(|cpu| cpus.contains(&cpu)))
    }

    /// CPU of the last activation in the window
    pub fn get_last_cpu(&self, window: Option<&Window>) -> Result<Option<u32>, AssertError> {
        Ok(self.in_window(window)?.last().map(|s| s.cpu))
    }

    pub fn assert_last_cpu(&self, cpus: &[u32], window: Option<&Window>) -> Result<bool, AssertError> {
        let last = self.get_last_cpu(window)?;
        Ok(last.is_some_and(|cpu| cpus.contains(&cpu)))
    }

    /// Whether the thread moved from `from_node` to `to_node` within the window
    ///
    /// The first activation must be on `from_node` and the last on
    /// `to_node`. Unless `ignore_multiple`, exactly one node change is allowed.
    pub fn assert_switch(
        &self,
        level: &str,
        from_node: &[u32],
        to_node: &[u32],
        window: Option<&Window>,
        ignore_multiple: bool,
    ) -> Result<bool, AssertError> {
        let from = self.topology.get_index(level, from_node)?;
        let to = self.topology.get_index(level, to_node)?;

        let nodes = self
            .in_window(window)?
            .iter()
            .map(|s| self.topology.node_of_cpu(level, s.cpu))
            .collect::<Result<Vec<usize>, _>>()?;

        let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
            return Ok(false);
        };

        if first != from || last != to {
            return Ok(false);
        }

        if ignore_multiple {
            return Ok(true);
        }

        let changes = nodes.windows(2).filter(|pair| pair[0] != pair[1]).count();
        Ok(changes == 1)
    }

    /// Evaluate one typed operation
    ///
    /// **Public** - entry point used by batched dispatch
    pub fn evaluate(&self, operation: &Operation) -> Result<MetricValue, AssertError> {
        let value: MetricValue = match operation {
            Operation::GetResidency { level, node, window, percent } => {
                self.get_residency(level, node, window.as_ref(), *percent)?.into()
            }
            Operation::AssertResidency { level, node, expected, operator, window, percent } => self
                .assert_residency(level, node, *expected, *operator, window.as_ref(), *percent)?
                .into(),
            Operation::GetStartTime => self.get_start_time().into(),
            Operation::AssertStartTime { bound, operator } => {
                self.assert_start_time(*bound, *operator).into()
            }
            Operation::GetEndTime => self.get_end_time().into(),
            Operation::AssertEndTime { bound, operator } => {
                self.assert_end_time(*bound, *operator).into()
            }
            Operation::GetRuntime { window, percent } => {
                self.get_runtime(window.as_ref(), *percent)?.into()
            }
            Operation::AssertRuntime { expected, operator, window, percent } => self
                .assert_runtime(*expected, *operator, window.as_ref(), *percent)?
                .into(),
            Operation::GetPeriod { window, align } => {
                self.get_period(window.as_ref(), *align)?.into()
            }
            Operation::AssertPeriod { expected, operator, window, align } => self
                .assert_period(*expected, *operator, window.as_ref(), *align)?
                .into(),
            Operation::GetDutyCycle { window } => self.get_duty_cycle(window.as_ref())?.into(),
            Operation::AssertDutyCycle { expected, operator, window } => self
                .assert_duty_cycle(*expected, *operator, window.as_ref())?
                .into(),
            Operation::GetFirstCpu { window } => self.get_first_cpu(window.as_ref())?.into(),
            Operation::AssertFirstCpu { cpus, window } => {
                self.assert_first_cpu(cpus, window.as_ref())?.into()
            }
            Operation::GetLastCpu { window } => self.get_last_cpu(window.as_ref())?.into(),
            Operation::AssertLastCpu { cpus, window } => {
                self.assert_last_cpu(cpus, window.as_ref())?.into()
            }
            Operation::AssertSwitch { level, from_node, to_node, window, ignore_multiple } => self
                .assert_switch(level, from_node, to_node, window.as_ref(), *ignore_multiple)?
                .into(),
        };

        debug!("PID {} {}: {:?}", self.pid, operation.kind(), value);

        Ok(value)
    }

    /// One plot event per residency span
    ///
    /// Ids run from `start_id` upwards so several threads can share one plot.
    pub fn generate_events(
        &self,
        level: &str,
        start_id: usize,
        window: Option<&Window>,
    ) -> Result<Vec<Event>, AssertError> {
        self.in_window(window)?
            .iter()
            .enumerate()
            .map(|(offset, span)| -> Result<Event, AssertError> {
                Ok(Event {
                    id: start_id + offset,
                    start: span.start,
                    end: span.end,
                    lane: self.topology.node_of_cpu(level, span.cpu)?,
                    name: self.name.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SchedSwitch;

    fn switch(ts: f64, cpu: u32, prev: (&str, u32), next: (&str, u32)) -> SchedSwitch {
        SchedSwitch {
            ts,
            cpu,
            prev_comm: prev.0.to_string(),
            prev_pid: prev.1,
            prev_state: None,
            next_comm: next.0.to_string(),
            next_pid: next.1,
        }
    }

    /// PID 10 runs on CPU 0 for [1, 2), migrates to CPU 2 for [4, 7)
    fn migrating_run() -> Arc<TraceRun> {
        let run = TraceRun::from_switches(
            vec![
                switch(1.0, 0, ("swapper/0", 0), ("foo", 10)),
                switch(2.0, 0, ("foo", 10), ("swapper/0", 0)),
                switch(4.0, 2, ("swapper/2", 0), ("foo", 10)),
                switch(7.0, 2, ("foo", 10), ("swapper/2", 0)),
            ],
            Some(0.0),
            Some(10.0),
        )
        .unwrap();
        Arc::new(run)
    }

    fn topology() -> Topology {
        Topology::from_clusters(vec![vec![0, 1], vec![2, 3]])
    }

    #[test]
    fn test_names() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);
        assert_eq!(helper.execname, "foo");
        assert_eq!(helper.name, "foo-10");
        assert_eq!(helper.pid(), 10);
    }

    #[test]
    fn test_unknown_pid_has_no_activity() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 99);
        assert_eq!(helper.execname, "99");
        assert!(helper.residencies().is_empty());
        assert_eq!(helper.get_start_time(), None);
        assert!(!helper.assert_start_time(0.0, Comparison::Ge));
    }

    #[test]
    fn test_residency() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);

        assert_eq!(helper.get_residency("cluster", &[0, 1], None, false).unwrap(), 1.0);
        assert_eq!(helper.get_residency("cluster", &[2, 3], None, false).unwrap(), 3.0);
        assert_eq!(helper.get_residency("cluster", &[2, 3], None, true).unwrap(), 75.0);
        assert!(helper
            .assert_residency("cpu", &[2], 2.0, Comparison::Gt, None, false)
            .unwrap());
    }

    #[test]
    fn test_residency_unknown_node() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);
        let result = helper.get_residency("cluster", &[0, 2], None, false);
        assert!(matches!(result, Err(AssertError::Topology(_))));
    }

    #[test]
    fn test_runtime_and_duty_cycle() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);
        let window = Window::new(0.0, 5.0);

        assert_eq!(helper.get_runtime(None, false).unwrap(), 4.0);
        assert_eq!(helper.get_runtime(Some(&window), false).unwrap(), 2.0);
        assert_eq!(helper.get_duty_cycle(Some(&window)).unwrap(), 40.0);
        assert_eq!(helper.get_runtime(None, true).unwrap(), 40.0);
    }

    #[test]
    fn test_period() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);

        assert_eq!(helper.get_period(None, Align::Start).unwrap(), Some(3.0));
        assert_eq!(helper.get_period(None, Align::End).unwrap(), Some(5.0));
        assert_eq!(
            helper.get_period(Some(&Window::new(3.0, 10.0)), Align::Start).unwrap(),
            None
        );
    }

    #[test]
    fn test_first_and_last_cpu() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);

        assert_eq!(helper.get_first_cpu(None).unwrap(), Some(0));
        assert_eq!(helper.get_last_cpu(None).unwrap(), Some(2));
        assert!(helper.assert_first_cpu(&[0, 1], None).unwrap());
        assert!(!helper.assert_last_cpu(&[0, 1], None).unwrap());
    }

    #[test]
    fn test_window_starting_at_span_end() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);
        let after_cpu0 = Window::new(2.0, 10.0);

        assert_eq!(helper.get_first_cpu(Some(&after_cpu0)).unwrap(), Some(2));
        assert_eq!(helper.get_period(Some(&after_cpu0), Align::Start).unwrap(), None);
        assert!(!helper
            .assert_switch("cluster", &[0, 1], &[2, 3], Some(&after_cpu0), false)
            .unwrap());

        let idle = Window::new(2.0, 3.5);
        assert_eq!(helper.get_runtime(Some(&idle), false).unwrap(), 0.0);
        assert_eq!(helper.get_last_cpu(Some(&idle)).unwrap(), None);
        assert!(helper.generate_events("cpu", 0, Some(&idle)).unwrap().is_empty());
    }

    #[test]
    fn test_assert_switch() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);

        assert!(helper
            .assert_switch("cluster", &[0, 1], &[2, 3], None, false)
            .unwrap());
        assert!(!helper
            .assert_switch("cluster", &[2, 3], &[0, 1], None, true)
            .unwrap());
    }

    #[test]
    fn test_window_validation() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);
        let result = helper.get_runtime(Some(&Window::new(5.0, 1.0)), false);
        assert!(matches!(result, Err(AssertError::InvalidWindow { .. })));
    }

    #[test]
    fn test_evaluate_matches_direct_calls() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);

        assert_eq!(
            helper.evaluate(&Operation::GetStartTime).unwrap(),
            MetricValue::Number(1.0)
        );
        assert_eq!(
            helper.evaluate(&Operation::GetLastCpu { window: None }).unwrap(),
            MetricValue::Cpu(2)
        );
        assert_eq!(
            helper
                .evaluate(&Operation::AssertEndTime { bound: 7.0, operator: Comparison::Le })
                .unwrap(),
            MetricValue::Bool(true)
        );
    }

    #[test]
    fn test_generate_events() {
        let topology = topology();
        let helper = SchedAssert::new(migrating_run(), &topology, 10);

        let events = helper.generate_events("cpu", 5, None).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 5);
        assert_eq!(events[1].id, 6);
        assert_eq!(events[1].lane, 2);
        assert_eq!(events[0].name, "foo-10");
    }
}
