use serde::{Deserialize, Serialize};

use super::counters::{Aggregation64, KeyValue};

/// Kubernetes objects visible from this host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sState {
    pub nodes: Vec<K8sNode>,
    pub namespaces: Vec<K8sNamespace>,
    pub pods: Vec<K8sPod>,
    pub services: Vec<K8sService>,
    pub persistentvolumeclaims: Vec<K8sPersistentVolumeClaim>,
}

/// Metadata carried by every Kubernetes object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sCommon {
    pub uid: String,
    pub name: String,
    pub namespace: String,
    pub labels: Vec<KeyValue>,
}

/// A cluster node. Nodes are matched by any shared host IP since their uid
/// changes when they re-register.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sNode {
    pub common: Option<K8sCommon>,
    pub host_ips: Vec<String>,
    pub capacity_cpu_cores: Option<u64>,
    pub aggr_capacity_cpu_cores: Option<Aggregation64>,
    pub capacity_memory_bytes: Option<u64>,
    pub aggr_capacity_memory_bytes: Option<Aggregation64>,
    pub allocatable_pods: Option<u64>,
    pub aggr_allocatable_pods: Option<Aggregation64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sNamespace {
    pub common: Option<K8sCommon>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sPod {
    pub common: Option<K8sCommon>,
    pub node_name: String,
    pub host_ip: String,
    pub internal_ip: String,
    pub container_ids: Vec<String>,
    pub restart_count: Option<u64>,
    pub aggr_restart_count: Option<Aggregation64>,
    /// Requested CPU in millicores.
    pub requests_cpu_millicores: Option<u64>,
    pub aggr_requests_cpu_millicores: Option<Aggregation64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sService {
    pub common: Option<K8sCommon>,
    pub cluster_ip: String,
    pub ports: Vec<K8sServicePort>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sServicePort {
    pub port: u32,
    pub target_port: u32,
    pub protocol: String,
    pub node_port: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sPersistentVolumeClaim {
    pub common: Option<K8sCommon>,
    pub phase: String,
    pub storage_class_name: String,
    pub access_mode: String,
    pub volume_name: String,
    pub storage_bytes: Option<u64>,
    pub aggr_storage_bytes: Option<Aggregation64>,
    pub requests_storage_bytes: Option<u64>,
    pub aggr_requests_storage_bytes: Option<Aggregation64>,
}

/// Agent-generated event (container start, OOM, orchestrator notice).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentEvent {
    pub timestamp_sec: u64,
    pub scope: String,
    pub title: String,
    pub description: String,
    pub severity: u32,
    pub tags: Vec<KeyValue>,
}

/// Behavioural baseline produced by the runtime-security engine.
///
/// The baseline is a complete document: a newer one replaces the older one
/// wholesale instead of being merged into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalcoBaseline {
    pub progs: Vec<FalcoProg>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalcoProg {
    pub comm: String,
    pub exe: String,
    pub args: Vec<String>,
    pub user_id: u32,
    pub container_id: String,
    pub syscalls: Vec<String>,
}
