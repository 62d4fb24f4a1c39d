//! Metrics snapshot data model.
//!
//! Every numeric field `x` that gets rolled up has two slots: the raw sample
//! `x` set by the capture layer, and `aggr_x` filled by the aggregator. A
//! rolled-up snapshot carries only the `aggr_` slots.

pub mod container;
pub mod counters;
pub mod network;
pub mod orchestrator;
pub mod process;
pub mod protocols;

use serde::{Deserialize, Serialize};

use container::{Container, HostInfo, MountedFs};
use counters::FileStat;
use network::{Ipv4Connection, Ipv4NetworkInterface};
use orchestrator::{AgentEvent, FalcoBaseline, K8sState};
use process::{CommandDetails, Program};
use protocols::{Proto, StatsdInfo};

/// Root record for one capture interval or one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub timestamp_ns: u64,
    pub machine_id: String,
    pub customer_id: String,
    pub sampling_ratio: u32,
    pub host_custom_name: String,
    pub host_tags: String,
    pub version: String,
    pub instance_id: String,
    pub config_percentiles: Vec<u32>,
    pub hostinfo: Option<HostInfo>,
    pub ipv4_connections: Vec<Ipv4Connection>,
    /// Connections observed from one side only.
    pub ipv4_incomplete_connections: Vec<Ipv4Connection>,
    pub ipv4_network_interfaces: Vec<Ipv4NetworkInterface>,
    pub programs: Vec<Program>,
    pub containers: Vec<Container>,
    pub protos: Option<Proto>,
    pub top_files: Vec<FileStat>,
    pub top_devices: Vec<FileStat>,
    pub mounts: Vec<MountedFs>,
    pub events: Vec<AgentEvent>,
    pub commands: Vec<CommandDetails>,
    pub statsd: Option<StatsdInfo>,
    pub k8s: Option<K8sState>,
    pub falcobl: Option<FalcoBaseline>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_json_decodes_with_defaults() {
        let json = r#"{
            "machine_id": "m-1",
            "programs": [{"pid": 42, "procinfo": {"details": {"comm": "nginx"}}}],
            "hostinfo": {"cpu_loads": [120, 80]}
        }"#;

        let metrics: Metrics = serde_json::from_str(json).expect("snapshot should decode");

        assert_eq!(metrics.machine_id, "m-1");
        assert_eq!(metrics.sampling_ratio, 0);
        assert_eq!(metrics.programs.len(), 1);
        assert_eq!(metrics.programs[0].pid, 42);
        assert!(metrics.programs[0].pids.is_empty());
        assert_eq!(
            metrics.hostinfo.as_ref().map(|h| h.cpu_loads.clone()),
            Some(vec![120, 80])
        );
        assert!(metrics.falcobl.is_none());
    }
}
