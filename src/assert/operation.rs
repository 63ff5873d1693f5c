//! Typed operation catalogue shared by the single-thread helper and the
//! batched aggregator.
//!
//! Every `get_*`/`assert_*` capability is a variant of `Operation`; its
//! fieldless twin `OperationKind` is what capability tables are built from.

use crate::utils::error::AssertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time window `[start, end]` in trace seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Reject windows that end before they start
    pub fn validate(&self) -> Result<(), AssertError> {
        if self.start > self.end || !self.start.is_finite() || !self.end.is_finite() {
            return Err(AssertError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Comparison applied as `actual OP expected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparison {
    pub fn apply(self, actual: f64, expected: f64) -> bool {
        match self {
            Comparison::Lt => actual < expected,
            Comparison::Le => actual <= expected,
            Comparison::Eq => actual == expected,
            Comparison::Ne => actual != expected,
            Comparison::Ge => actual >= expected,
            Comparison::Gt => actual > expected,
        }
    }
}

/// Which edge of an activation a period is measured from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Start,
    End,
}

fn default_true() -> bool {
    true
}

/// A single-thread operation with its typed arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    GetResidency {
        level: String,
        node: Vec<u32>,
        #[serde(default)]
        window: Option<Window>,
        #[serde(default)]
        percent: bool,
    },
    AssertResidency {
        level: String,
        node: Vec<u32>,
        expected: f64,
        operator: Comparison,
        #[serde(default)]
        window: Option<Window>,
        #[serde(default)]
        percent: bool,
    },
    GetStartTime,
    AssertStartTime {
        bound: f64,
        operator: Comparison,
    },
    GetEndTime,
    AssertEndTime {
        bound: f64,
        operator: Comparison,
    },
    GetRuntime {
        #[serde(default)]
        window: Option<Window>,
        #[serde(default)]
        percent: bool,
    },
    AssertRuntime {
        expected: f64,
        operator: Comparison,
        #[serde(default)]
        window: Option<Window>,
        #[serde(default)]
        percent: bool,
    },
    GetPeriod {
        #[serde(default)]
        window: Option<Window>,
        #[serde(default)]
        align: Align,
    },
    AssertPeriod {
        expected: f64,
        operator: Comparison,
        #[serde(default)]
        window: Option<Window>,
        #[serde(default)]
        align: Align,
    },
    GetDutyCycle {
        #[serde(default)]
        window: Option<Window>,
    },
    AssertDutyCycle {
        expected: f64,
        operator: Comparison,
        #[serde(default)]
        window: Option<Window>,
    },
    GetFirstCpu {
        #[serde(default)]
        window: Option<Window>,
    },
    AssertFirstCpu {
        cpus: Vec<u32>,
        #[serde(default)]
        window: Option<Window>,
    },
    GetLastCpu {
        #[serde(default)]
        window: Option<Window>,
    },
    AssertLastCpu {
        cpus: Vec<u32>,
        #[serde(default)]
        window: Option<Window>,
    },
    AssertSwitch {
        level: String,
        from_node: Vec<u32>,
        to_node: Vec<u32>,
        #[serde(default)]
        window: Option<Window>,
        #[serde(default = "default_true")]
        ignore_multiple: bool,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::GetResidency { .. } => OperationKind::GetResidency,
            Operation::AssertResidency { .. } => OperationKind::AssertResidency,
            Operation::GetStartTime => OperationKind::GetStartTime,
            Operation::AssertStartTime { .. } => OperationKind::AssertStartTime,
            Operation::GetEndTime => OperationKind::GetEndTime,
            Operation::AssertEndTime { .. } => OperationKind::AssertEndTime,
            Operation::GetRuntime { .. } => OperationKind::GetRuntime,
            Operation::AssertRuntime { .. } => OperationKind::AssertRuntime,
            Operation::GetPeriod { .. } => OperationKind::GetPeriod,
            Operation::AssertPeriod { .. } => OperationKind::AssertPeriod,
            Operation::GetDutyCycle { .. } => OperationKind::GetDutyCycle,
            Operation::AssertDutyCycle { .. } => OperationKind::AssertDutyCycle,
            Operation::GetFirstCpu { .. } => OperationKind::GetFirstCpu,
            Operation::AssertFirstCpu { .. } => OperationKind::AssertFirstCpu,
            Operation::GetLastCpu { .. } => OperationKind::GetLastCpu,
            Operation::AssertLastCpu { .. } => OperationKind::AssertLastCpu,
            Operation::AssertSwitch { .. } => OperationKind::AssertSwitch,
        }
    }
}

/// Name-level identity of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    GetResidency,
    AssertResidency,
    GetStartTime,
    AssertStartTime,
    GetEndTime,
    AssertEndTime,
    GetRuntime,
    AssertRuntime,
    GetPeriod,
    AssertPeriod,
    GetDutyCycle,
    AssertDutyCycle,
    GetFirstCpu,
    AssertFirstCpu,
    GetLastCpu,
    AssertLastCpu,
    AssertSwitch,
}

impl OperationKind {
    pub const ALL: [OperationKind; 17] = [
        OperationKind::GetResidency,
        OperationKind::AssertResidency,
        OperationKind::GetStartTime,
        OperationKind::AssertStartTime,
        OperationKind::GetEndTime,
        OperationKind::AssertEndTime,
        OperationKind::GetRuntime,
        OperationKind::AssertRuntime,
        OperationKind::GetPeriod,
        OperationKind::AssertPeriod,
        OperationKind::GetDutyCycle,
        OperationKind::AssertDutyCycle,
        OperationKind::GetFirstCpu,
        OperationKind::AssertFirstCpu,
        OperationKind::GetLastCpu,
        OperationKind::AssertLastCpu,
        OperationKind::AssertSwitch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::GetResidency => "get_residency",
            OperationKind::AssertResidency => "assert_residency",
            OperationKind::GetStartTime => "get_start_time",
            OperationKind::AssertStartTime => "assert_start_time",
            OperationKind::GetEndTime => "get_end_time",
            OperationKind::AssertEndTime => "assert_end_time",
            OperationKind::GetRuntime => "get_runtime",
            OperationKind::AssertRuntime => "assert_runtime",
            OperationKind::GetPeriod => "get_period",
            OperationKind::AssertPeriod => "assert_period",
            OperationKind::GetDutyCycle => "get_duty_cycle",
            OperationKind::AssertDutyCycle => "assert_duty_cycle",
            OperationKind::GetFirstCpu => "get_first_cpu",
            OperationKind::AssertFirstCpu => "assert_first_cpu",
            OperationKind::GetLastCpu => "get_last_cpu",
            OperationKind::AssertLastCpu => "assert_last_cpu",
            OperationKind::AssertSwitch => "assert_switch",
        }
    }

    pub fn is_assert(self) -> bool {
        self.name().starts_with("assert")
    }

    /// Result key used when the caller does not name one
    ///
    /// The leading `assert_`/`get_` is stripped: `get_residency` and
    /// `assert_residency` both store under `residency`.
    pub fn default_param(self) -> String {
        let name = self.name();
        name.strip_prefix("assert_")
            .or_else(|| name.strip_prefix("get_"))
            .unwrap_or(name)
            .to_lowercase()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = AssertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AssertError::UnknownOperation(s.to_string()))
    }
}

/// Value produced by one operation on one thread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Cpu(u32),
    Number(f64),
    Missing,
}

impl MetricValue {
    /// Whether the value counts towards an assert quorum
    pub fn is_truthy(&self) -> bool {
        match self {
            MetricValue::Bool(b) => *b,
            MetricValue::Number(n) => *n != 0.0,
            MetricValue::Cpu(_) => true,
            MetricValue::Missing => false,
        }
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Bool(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(MetricValue::Missing, MetricValue::Number)
    }
}

impl From<Option<u32>> for MetricValue {
    fn from(value: Option<u32>) -> Self {
        value.map_or(MetricValue::Missing, MetricValue::Cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_param_strips_prefix() {
        assert_eq!(OperationKind::GetResidency.default_param(), "residency");
        assert_eq!(OperationKind::AssertResidency.default_param(), "residency");
        assert_eq!(OperationKind::AssertFirstCpu.default_param(), "first_cpu");
        assert_eq!(OperationKind::GetDutyCycle.default_param(), "duty_cycle");
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.name().parse::<OperationKind>().unwrap(), kind);
        }
        assert!(matches!(
            "get_vruntime".parse::<OperationKind>(),
            Err(AssertError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_is_assert() {
        assert!(OperationKind::AssertSwitch.is_assert());
        assert!(!OperationKind::GetStartTime.is_assert());
    }

    #[test]
    fn test_comparison() {
        assert!(Comparison::Lt.apply(1.0, 2.0));
        assert!(Comparison::Ge.apply(2.0, 2.0));
        assert!(!Comparison::Ne.apply(2.0, 2.0));
    }

    #[test]
    fn test_operation_from_json_defaults() {
        let op: Operation = serde_json::from_value(json!({
            "op": "assert_switch",
            "level": "cluster",
            "from_node": [0, 1],
            "to_node": [2, 3],
        }))
        .unwrap();

        assert_eq!(op.kind(), OperationKind::AssertSwitch);
        match op {
            Operation::AssertSwitch { ignore_multiple, window, .. } => {
                assert!(ignore_multiple);
                assert!(window.is_none());
            }
            other => panic!("unexpected operation {other:?}"),
        }

        let op: Operation = serde_json::from_value(json!({ "op": "get_start_time" })).unwrap();
        assert_eq!(op, Operation::GetStartTime);
    }

    #[test]
    fn test_metric_value_serialization() {
        assert_eq!(serde_json::to_value(MetricValue::Missing).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(MetricValue::Bool(true)).unwrap(), json!(true));
        let back: MetricValue = serde_json::from_value(json!(2.5)).unwrap();
        assert_eq!(back, MetricValue::Number(2.5));
    }

    #[test]
    fn test_truthiness() {
        assert!(MetricValue::Cpu(0).is_truthy());
        assert!(!MetricValue::Number(0.0).is_truthy());
        assert!(!MetricValue::Missing.is_truthy());
    }

    #[test]
    fn test_invalid_window() {
        assert!(Window::new(2.0, 1.0).validate().is_err());
        assert!(Window::new(1.0, 1.0).validate().is_ok());
    }
}
