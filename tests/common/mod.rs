#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

pub fn switch(ts: f64, cpu: u32, prev: (&str, u32), next: (&str, u32)) -> Value {
    json!({
        "ts": ts,
        "cpu": cpu,
        "prev_comm": prev.0,
        "prev_pid": prev.1,
        "prev_state": "S",
        "next_comm": next.0,
        "next_pid": next.1,
    })
}

/// Two `foo` threads and one `bar` thread on a 4-CPU machine
///
/// * foo:10 runs on CPU 0 for [1, 2) and [3, 4)
/// * foo:20 runs on CPU 2 for [1.5, 2.5) and on CPU 1 for [6, 7)
/// * bar:30 runs on CPU 3 for [2, 9)
pub fn sample_trace() -> Value {
    json!({
        "start_time": 0.0,
        "end_time": 10.0,
        "sched_switch": [
            switch(1.0, 0, ("swapper/0", 0), ("foo", 10)),
            switch(1.5, 2, ("swapper/2", 0), ("foo", 20)),
            switch(2.0, 0, ("foo", 10), ("swapper/0", 0)),
            switch(2.0, 3, ("swapper/3", 0), ("bar", 30)),
            switch(2.5, 2, ("foo", 20), ("swapper/2", 0)),
            switch(3.0, 0, ("swapper/0", 0), ("foo", 10)),
            switch(4.0, 0, ("foo", 10), ("swapper/0", 0)),
            switch(6.0, 1, ("swapper/1", 0), ("foo", 20)),
            switch(7.0, 1, ("foo", 20), ("swapper/1", 0)),
            switch(9.0, 3, ("bar", 30), ("swapper/3", 0)),
        ],
    })
}

/// `sample_trace` plus a `foobar` thread (pid 50) running on CPU 1 for [1, 3)
pub fn trace_with_foobar() -> Value {
    let mut trace = sample_trace();
    let switches = trace["sched_switch"].as_array_mut().unwrap();
    switches.push(switch(1.0, 1, ("swapper/1", 0), ("foobar", 50)));
    switches.push(switch(3.0, 1, ("foobar", 50), ("swapper/1", 0)));
    trace
}

pub fn write_json(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

pub fn sample_topology_json() -> Value {
    json!({ "clusters": [[0, 1], [2, 3]] })
}
