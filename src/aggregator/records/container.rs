use crate::aggregator::field::{bit_or, fold_counter, fold_list, replace_value, union};
use crate::aggregator::key::{merge_repeated, merge_singleton};
use crate::aggregator::{Aggregate, MergeStats};
use crate::schema::container::{Container, HostInfo, MountedFs};

impl Aggregate for Container {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.id, input.id);
        replace_value(&mut self.container_type, input.container_type);
        replace_value(&mut self.name, input.name);
        replace_value(&mut self.image, input.image);
        replace_value(&mut self.image_id, input.image_id);
        replace_value(&mut self.image_repo, input.image_repo);
        replace_value(&mut self.image_tag, input.image_tag);
        replace_value(&mut self.image_digest, input.image_digest);
        merge_repeated(&mut self.labels, input.labels, stats);
        merge_repeated(&mut self.mounts, input.mounts, stats);
        bit_or(&mut self.netrole, input.netrole);
        union(&mut self.reporting_group_ids, input.reporting_group_ids);
        merge_singleton(&mut self.resource_counters, input.resource_counters, stats);
        merge_singleton(&mut self.tcounters, input.tcounters, stats);
        merge_singleton(
            &mut self.transaction_counters,
            input.transaction_counters,
            stats,
        );
        merge_singleton(&mut self.protos, input.protos, stats);
        merge_singleton(&mut self.syscall_errors, input.syscall_errors, stats);
        merge_repeated(&mut self.top_files, input.top_files, stats);
        merge_repeated(&mut self.top_devices, input.top_devices, stats);
        merge_repeated(
            &mut self.network_by_serverports,
            input.network_by_serverports,
            stats,
        );
        merge_singleton(&mut self.statsd, input.statsd, stats);
        merge_singleton(&mut self.app, input.app, stats);
    }
}

impl Aggregate for MountedFs {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.device, input.device);
        replace_value(&mut self.mount_dir, input.mount_dir);
        replace_value(&mut self.fs_type, input.fs_type);
        fold_counter(&mut self.aggr_size_bytes, input.size_bytes);
        fold_counter(&mut self.aggr_used_bytes, input.used_bytes);
        fold_counter(&mut self.aggr_available_bytes, input.available_bytes);
        fold_counter(&mut self.aggr_total_inodes, input.total_inodes);
        fold_counter(&mut self.aggr_used_inodes, input.used_inodes);
    }
}

impl Aggregate for HostInfo {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.hostname, input.hostname);
        replace_value(&mut self.num_cpus, input.num_cpus);
        replace_value(
            &mut self.physical_memory_size_bytes,
            input.physical_memory_size_bytes,
        );
        fold_list(&mut self.aggr_cpu_loads, input.cpu_loads);
        fold_list(&mut self.aggr_cpu_steal, input.cpu_steal);
        fold_counter(
            &mut self.aggr_memory_bytes_available_kb,
            input.memory_bytes_available_kb,
        );
        fold_counter(&mut self.aggr_system_load, input.system_load);
        replace_value(&mut self.uptime, input.uptime);
        merge_singleton(&mut self.resource_counters, input.resource_counters, stats);
        merge_singleton(&mut self.tcounters, input.tcounters, stats);
        merge_singleton(
            &mut self.transaction_counters,
            input.transaction_counters,
            stats,
        );
        merge_singleton(&mut self.syscall_errors, input.syscall_errors, stats);
        merge_repeated(
            &mut self.network_by_serverports,
            input.network_by_serverports,
            stats,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::counters::KeyValue;

    #[test]
    fn test_container_labels_and_groups() {
        let mut out = Container::default();
        let mut stats = MergeStats::default();

        out.aggregate(
            Container {
                id: "3f1c2a8b9d0e".to_string(),
                image: "nginx:1.25".to_string(),
                labels: vec![KeyValue::new("app", "web"), KeyValue::new("tier", "front")],
                reporting_group_ids: vec![4],
                ..Default::default()
            },
            &mut stats,
        );
        out.aggregate(
            Container {
                id: "3f1c2a8b9d0e".to_string(),
                labels: vec![KeyValue::new("app", "web-v2")],
                reporting_group_ids: vec![4, 9],
                ..Default::default()
            },
            &mut stats,
        );

        assert_eq!(out.image, "nginx:1.25");
        assert_eq!(out.labels.len(), 2);
        assert_eq!(out.labels[0].value, "web-v2");
        assert_eq!(out.reporting_group_ids, vec![4, 9]);
    }

    #[test]
    fn test_mounts_keyed_by_device_and_dir() {
        let mount = |dir: &str, used: u64| MountedFs {
            device: "/dev/sda1".to_string(),
            mount_dir: dir.to_string(),
            used_bytes: Some(used),
            ..Default::default()
        };
        let mut out = Container::default();
        let mut stats = MergeStats::default();

        out.aggregate(
            Container {
                mounts: vec![mount("/", 10), mount("/var", 20)],
                ..Default::default()
            },
            &mut stats,
        );
        out.aggregate(
            Container {
                mounts: vec![mount("/", 30)],
                ..Default::default()
            },
            &mut stats,
        );

        assert_eq!(out.mounts.len(), 2);
        let root = out.mounts[0].aggr_used_bytes.expect("used bytes");
        assert_eq!((root.min, root.max, root.weight), (10, 30, 2));
    }

    #[test]
    fn test_host_cpu_loads_elementwise() {
        let mut out = HostInfo::default();
        let mut stats = MergeStats::default();

        out.aggregate(
            HostInfo {
                hostname: "db-01".to_string(),
                num_cpus: 2,
                cpu_loads: vec![1_000, 2_000],
                ..Default::default()
            },
            &mut stats,
        );
        out.aggregate(
            HostInfo {
                num_cpus: 4,
                cpu_loads: vec![3_000, 4_000, 500, 700],
                ..Default::default()
            },
            &mut stats,
        );

        assert_eq!(out.hostname, "db-01");
        assert_eq!(out.num_cpus, 4);
        assert_eq!(out.aggr_cpu_loads.len(), 4);
        assert_eq!(out.aggr_cpu_loads[0].sum, 4_000);
        assert_eq!(out.aggr_cpu_loads[3].weight, 1);
        assert!(out.cpu_loads.is_empty());
    }
}
