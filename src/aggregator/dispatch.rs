//! Request and result types for batched dispatch.
//!
//! A `Request` names one operation plus the batching options: an optional
//! quorum `rank` and the `param` key results are stored under. Results are
//! accumulated per thread in a `ThreadResults` map that callers may thread
//! through several dispatches to build one combined report.

use crate::assert::{MetricValue, Operation};
use crate::parser::Pid;
use crate::utils::config::TASK_NAME_KEY;
use crate::utils::error::AssertError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-thread results, keyed by PID
pub type ThreadResults = BTreeMap<Pid, ThreadReport>;

/// Everything recorded for one thread
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadReport {
    /// Task name of the thread
    pub task_name: String,

    /// One value per dispatched param
    #[serde(flatten)]
    pub values: BTreeMap<String, MetricValue>,
}

impl ThreadReport {
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, param: &str) -> Option<&MetricValue> {
        self.values.get(param)
    }
}

/// One batched call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(flatten)]
    pub operation: Operation,

    /// Exact number of threads that must pass (assert operations only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,

    /// Result key; defaults to the operation name without its `get_`/`assert_` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl Request {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            rank: None,
            param: None,
        }
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Key the per-thread values are stored under
    pub fn param_name(&self) -> Result<String, AssertError> {
        let param = self
            .param
            .clone()
            .unwrap_or_else(|| self.operation.kind().default_param());

        if param == TASK_NAME_KEY {
            return Err(AssertError::ReservedParam(param));
        }

        Ok(param)
    }
}

impl From<Operation> for Request {
    fn from(operation: Operation) -> Self {
        Request::new(operation)
    }
}

/// What a batched call returns
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Full per-thread map
    Results(ThreadResults),

    /// Whether exactly `rank` threads passed
    Quorum(bool),
}

impl Outcome {
    pub fn quorum(&self) -> Option<bool> {
        match self {
            Outcome::Quorum(passed) => Some(*passed),
            Outcome::Results(_) => None,
        }
    }

    pub fn results(&self) -> Option<&ThreadResults> {
        match self {
            Outcome::Results(results) => Some(results),
            Outcome::Quorum(_) => None,
        }
    }
}
