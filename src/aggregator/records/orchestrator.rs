use crate::aggregator::field::{fold_counter, replace_value, union};
use crate::aggregator::key::{merge_repeated, merge_singleton};
use crate::aggregator::{Aggregate, MergeStats};
use crate::schema::orchestrator::{
    AgentEvent, K8sCommon, K8sNamespace, K8sNode, K8sPersistentVolumeClaim, K8sPod, K8sService,
    K8sServicePort, K8sState,
};

impl Aggregate for K8sState {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_repeated(&mut self.nodes, input.nodes, stats);
        merge_repeated(&mut self.namespaces, input.namespaces, stats);
        merge_repeated(&mut self.pods, input.pods, stats);
        merge_repeated(&mut self.services, input.services, stats);
        merge_repeated(
            &mut self.persistentvolumeclaims,
            input.persistentvolumeclaims,
            stats,
        );
    }
}

impl Aggregate for K8sCommon {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.uid, input.uid);
        replace_value(&mut self.name, input.name);
        replace_value(&mut self.namespace, input.namespace);
        merge_repeated(&mut self.labels, input.labels, stats);
    }
}

impl Aggregate for K8sNode {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.common, input.common, stats);
        union(&mut self.host_ips, input.host_ips);
        fold_counter(&mut self.aggr_capacity_cpu_cores, input.capacity_cpu_cores);
        fold_counter(
            &mut self.aggr_capacity_memory_bytes,
            input.capacity_memory_bytes,
        );
        fold_counter(&mut self.aggr_allocatable_pods, input.allocatable_pods);
    }
}

impl Aggregate for K8sNamespace {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.common, input.common, stats);
    }
}

impl Aggregate for K8sPod {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.common, input.common, stats);
        replace_value(&mut self.node_name, input.node_name);
        replace_value(&mut self.host_ip, input.host_ip);
        replace_value(&mut self.internal_ip, input.internal_ip);
        union(&mut self.container_ids, input.container_ids);
        fold_counter(&mut self.aggr_restart_count, input.restart_count);
        fold_counter(
            &mut self.aggr_requests_cpu_millicores,
            input.requests_cpu_millicores,
        );
    }
}

impl Aggregate for K8sService {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.common, input.common, stats);
        replace_value(&mut self.cluster_ip, input.cluster_ip);
        merge_repeated(&mut self.ports, input.ports, stats);
    }
}

impl Aggregate for K8sServicePort {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.port, input.port);
        replace_value(&mut self.target_port, input.target_port);
        replace_value(&mut self.protocol, input.protocol);
        replace_value(&mut self.node_port, input.node_port);
    }
}

impl Aggregate for K8sPersistentVolumeClaim {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.common, input.common, stats);
        replace_value(&mut self.phase, input.phase);
        replace_value(&mut self.storage_class_name, input.storage_class_name);
        replace_value(&mut self.access_mode, input.access_mode);
        replace_value(&mut self.volume_name, input.volume_name);
        fold_counter(&mut self.aggr_storage_bytes, input.storage_bytes);
        fold_counter(
            &mut self.aggr_requests_storage_bytes,
            input.requests_storage_bytes,
        );
    }
}

impl Aggregate for AgentEvent {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.timestamp_sec, input.timestamp_sec);
        replace_value(&mut self.scope, input.scope);
        replace_value(&mut self.title, input.title);
        replace_value(&mut self.description, input.description);
        replace_value(&mut self.severity, input.severity);
        merge_repeated(&mut self.tags, input.tags, stats);
    }
}
