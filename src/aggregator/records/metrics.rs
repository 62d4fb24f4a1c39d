use crate::aggregator::field::{replace_list_if_nonempty, replace_opt, replace_value};
use crate::aggregator::key::{merge_repeated, merge_singleton};
use crate::aggregator::{Aggregate, MergeStats};
use crate::schema::Metrics;

impl Aggregate for Metrics {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.timestamp_ns, input.timestamp_ns);
        replace_value(&mut self.machine_id, input.machine_id);
        replace_value(&mut self.customer_id, input.customer_id);
        replace_value(&mut self.sampling_ratio, input.sampling_ratio);
        replace_value(&mut self.host_custom_name, input.host_custom_name);
        replace_value(&mut self.host_tags, input.host_tags);
        replace_value(&mut self.version, input.version);
        replace_value(&mut self.instance_id, input.instance_id);
        replace_list_if_nonempty(&mut self.config_percentiles, input.config_percentiles);

        merge_singleton(&mut self.hostinfo, input.hostinfo, stats);
        merge_repeated(&mut self.ipv4_connections, input.ipv4_connections, stats);
        merge_repeated(
            &mut self.ipv4_incomplete_connections,
            input.ipv4_incomplete_connections,
            stats,
        );
        merge_repeated(
            &mut self.ipv4_network_interfaces,
            input.ipv4_network_interfaces,
            stats,
        );
        merge_repeated(&mut self.programs, input.programs, stats);
        merge_repeated(&mut self.containers, input.containers, stats);
        merge_singleton(&mut self.protos, input.protos, stats);
        merge_repeated(&mut self.top_files, input.top_files, stats);
        merge_repeated(&mut self.top_devices, input.top_devices, stats);
        merge_repeated(&mut self.mounts, input.mounts, stats);
        merge_repeated(&mut self.events, input.events, stats);
        merge_repeated(&mut self.commands, input.commands, stats);
        merge_singleton(&mut self.statsd, input.statsd, stats);
        merge_singleton(&mut self.k8s, input.k8s, stats);

        // The baseline is a complete document; the newest one wins.
        replace_opt(&mut self.falcobl, input.falcobl);
    }
}
