use serde::{Deserialize, Serialize};

use super::counters::{
    Aggregation64, FileStat, KeyValue, ResourceCategories, SyscallErrors, TimeCategories,
    TransactionCategories,
};
use super::network::NetworkByPort;
use super::protocols::{AppInfo, Proto, StatsdInfo};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub id: String,
    pub container_type: u32,
    pub name: String,
    pub image: String,
    pub image_id: String,
    pub image_repo: String,
    pub image_tag: String,
    pub image_digest: String,
    pub labels: Vec<KeyValue>,
    pub mounts: Vec<MountedFs>,
    pub netrole: u32,
    /// Reporting groups this container is pinned to; protects it from limiting.
    pub reporting_group_ids: Vec<u32>,
    pub resource_counters: Option<ResourceCategories>,
    pub tcounters: Option<TimeCategories>,
    pub transaction_counters: Option<TransactionCategories>,
    pub protos: Option<Proto>,
    pub syscall_errors: Option<SyscallErrors>,
    pub top_files: Vec<FileStat>,
    pub top_devices: Vec<FileStat>,
    pub network_by_serverports: Vec<NetworkByPort>,
    pub statsd: Option<StatsdInfo>,
    pub app: Option<AppInfo>,
}

/// A mounted filesystem and its usage gauges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountedFs {
    pub device: String,
    pub mount_dir: String,
    pub fs_type: String,
    pub size_bytes: Option<u64>,
    pub aggr_size_bytes: Option<Aggregation64>,
    pub used_bytes: Option<u64>,
    pub aggr_used_bytes: Option<Aggregation64>,
    pub available_bytes: Option<u64>,
    pub aggr_available_bytes: Option<Aggregation64>,
    pub total_inodes: Option<u64>,
    pub aggr_total_inodes: Option<Aggregation64>,
    pub used_inodes: Option<u64>,
    pub aggr_used_inodes: Option<Aggregation64>,
}

/// Host-wide gauges and breakdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    pub hostname: String,
    pub num_cpus: u32,
    pub physical_memory_size_bytes: u64,
    /// Per-CPU load, positional.
    pub cpu_loads: Vec<u64>,
    pub aggr_cpu_loads: Vec<Aggregation64>,
    /// Per-CPU steal, positional.
    pub cpu_steal: Vec<u64>,
    pub aggr_cpu_steal: Vec<Aggregation64>,
    pub memory_bytes_available_kb: Option<u64>,
    pub aggr_memory_bytes_available_kb: Option<Aggregation64>,
    /// Load average scaled by 100.
    pub system_load: Option<u64>,
    pub aggr_system_load: Option<Aggregation64>,
    pub uptime: u64,
    pub resource_counters: Option<ResourceCategories>,
    pub tcounters: Option<TimeCategories>,
    pub transaction_counters: Option<TransactionCategories>,
    pub syscall_errors: Option<SyscallErrors>,
    pub network_by_serverports: Vec<NetworkByPort>,
}
