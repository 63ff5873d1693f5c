//! CPU topology with named levels.
//!
//! A level is an ordered list of nodes, each node a group of CPUs.
//! `from_clusters` derives the usual `cluster`, `cpu` and `all` levels.

use crate::parser::TraceRun;
use crate::utils::config::{ALL_LEVEL, CLUSTER_LEVEL, CPU_LEVEL};
use crate::utils::error::TopologyError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// CPU topology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    levels: BTreeMap<String, Vec<Vec<u32>>>,
}

/// On-disk topology description
#[derive(Debug, Deserialize)]
struct TopologyFile {
    clusters: Vec<Vec<u32>>,
    #[serde(default)]
    levels: BTreeMap<String, Vec<Vec<u32>>>,
}

impl Topology {
    /// Build a topology from CPU clusters
    ///
    /// **Public** - main constructor
    pub fn from_clusters(clusters: Vec<Vec<u32>>) -> Self {
        let mut cpus: Vec<u32> = clusters.iter().flatten().copied().collect();
        cpus.sort_unstable();
        cpus.dedup();

        let mut levels = BTreeMap::new();
        levels.insert(CPU_LEVEL.to_string(), cpus.iter().map(|c| vec![*c]).collect());
        levels.insert(ALL_LEVEL.to_string(), vec![cpus]);
        levels.insert(CLUSTER_LEVEL.to_string(), clusters);

        Self { levels }
    }

    /// Single-cluster topology covering every CPU seen in `run`
    pub fn from_run(run: &TraceRun) -> Self {
        let cpus: Vec<u32> = run.cpus().into_iter().collect();
        debug!("Deriving topology from trace: {} CPUs", cpus.len());
        Self::from_clusters(vec![cpus])
    }

    /// Add or replace a level
    pub fn add_to_level(&mut self, level: impl Into<String>, nodes: Vec<Vec<u32>>) {
        self.levels.insert(level.into(), nodes);
    }

    /// Names of every level
    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    /// Nodes of `level`
    pub fn get_level(&self, level: &str) -> Result<&[Vec<u32>], TopologyError> {
        self.levels
            .get(level)
            .map(Vec::as_slice)
            .ok_or_else(|| TopologyError::UnknownLevel(level.to_string()))
    }

    /// Number of nodes at `level`
    pub fn level_span(&self, level: &str) -> Result<usize, TopologyError> {
        self.get_level(level).map(<[Vec<u32>]>::len)
    }

    /// Position of `node` within `level`
    ///
    /// CPU order inside the node does not matter.
    pub fn get_index(&self, level: &str, node: &[u32]) -> Result<usize, TopologyError> {
        let mut wanted = node.to_vec();
        wanted.sort_unstable();

        self.get_level(level)?
            .iter()
            .position(|candidate| {
                let mut sorted = candidate.clone();
                sorted.sort_unstable();
                sorted == wanted
            })
            .ok_or_else(|| TopologyError::UnknownNode {
                level: level.to_string(),
                node: node.to_vec(),
            })
    }

    /// Index of the node at `level` that contains `cpu`
    pub fn node_of_cpu(&self, level: &str, cpu: u32) -> Result<usize, TopologyError> {
        self.get_level(level)?
            .iter()
            .position(|node| node.contains(&cpu))
            .ok_or_else(|| TopologyError::CpuNotInLevel {
                level: level.to_string(),
                cpu,
            })
    }
}

/// Load a topology description from JSON
///
/// **Public** - used by the CLI
///
/// # Format
/// `{ "clusters": [[0, 1], [2, 3]], "levels": { "pair": [[0, 2], [1, 3]] } }`
/// where `levels` is optional and adds custom levels on top of the derived ones.
pub fn load_topology(path: impl AsRef<Path>) -> Result<Topology, TopologyError> {
    let path = path.as_ref();
    debug!("Reading topology from: {}", path.display());

    let file = File::open(path)?;
    let raw: TopologyFile = serde_json::from_reader(BufReader::new(file))?;

    let mut topology = Topology::from_clusters(raw.clusters);
    for (level, nodes) in raw.levels {
        topology.add_to_level(level, nodes);
    }

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn big_little() -> Topology {
        Topology::from_clusters(vec![vec![0, 3, 4, 5], vec![1, 2]])
    }

    #[test]
    fn test_derived_levels() {
        let topology = big_little();
        assert_eq!(topology.level_span("cluster").unwrap(), 2);
        assert_eq!(topology.level_span("cpu").unwrap(), 6);
        assert_eq!(topology.level_span("all").unwrap(), 1);
        assert_eq!(topology.get_level("cpu").unwrap()[2], vec![2]);
        assert_eq!(topology.levels().collect::<Vec<_>>(), vec!["all", "cluster", "cpu"]);
    }

    #[test]
    fn test_unknown_level() {
        let result = big_little().level_span("package");
        assert!(matches!(result, Err(TopologyError::UnknownLevel(_))));
    }

    #[test]
    fn test_get_index_ignores_cpu_order() {
        let topology = big_little();
        assert_eq!(topology.get_index("cluster", &[2, 1]).unwrap(), 1);
        assert_eq!(topology.get_index("cluster", &[5, 4, 3, 0]).unwrap(), 0);
        assert!(topology.get_index("cluster", &[0, 1]).is_err());
    }

    #[test]
    fn test_node_of_cpu() {
        let topology = big_little();
        assert_eq!(topology.node_of_cpu("cluster", 4).unwrap(), 0);
        assert_eq!(topology.node_of_cpu("cpu", 4).unwrap(), 4);
        assert!(matches!(
            topology.node_of_cpu("cpu", 9),
            Err(TopologyError::CpuNotInLevel { cpu: 9, .. })
        ));
    }

    #[test]
    fn test_load_topology_with_custom_level() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "clusters": [[0, 1], [2, 3]], "levels": {{ "pair": [[0, 2], [1, 3]] }} }}"#
        )
        .unwrap();

        let topology = load_topology(file.path()).unwrap();

        assert_eq!(topology.level_span("cluster").unwrap(), 2);
        assert_eq!(topology.get_index("pair", &[3, 1]).unwrap(), 1);
    }
}
