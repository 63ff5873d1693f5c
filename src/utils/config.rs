//! Configuration and constants for the library and CLI.

/// Current report schema version
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Topology level used for plot lanes and generated events
pub const DEFAULT_PLOT_LEVEL: &str = "cpu";

/// Axis label prefix for every plot lane
pub const CPU_LANE_PREFIX: &str = "CPU: ";

/// Key under which each thread's task name is stored in a result map
pub const TASK_NAME_KEY: &str = "task_name";

/// Longest comm the kernel records (TASK_COMM_LEN minus the NUL)
pub const MAX_COMM_LEN: usize = 15;

// Names of the well-known topology levels
pub const CLUSTER_LEVEL: &str = "cluster";
pub const CPU_LEVEL: &str = "cpu";
pub const ALL_LEVEL: &str = "all";

// Field names that may carry the sched_switch array (different exporters use different names)
pub const EVENT_FIELD_NAMES: &[&str] = &["sched_switch", "events", "switches", "trace"];

// Plot layout defaults
pub const DEFAULT_PLOT_WIDTH: usize = 1200;
pub const LANE_HEIGHT: usize = 24;
pub const LABEL_MARGIN: usize = 80;
