use crate::aggregator::field::{fold_counter, replace_value};
use crate::aggregator::key::merge_singleton;
use crate::aggregator::{Aggregate, MergeStats};
use crate::schema::network::{
    ConnectionCategories, Ipv4Connection, Ipv4NetworkInterface, NetworkByPort,
};

impl Aggregate for ConnectionCategories {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.server, input.server, stats);
        merge_singleton(&mut self.client, input.client, stats);
        merge_singleton(
            &mut self.transaction_counters,
            input.transaction_counters,
            stats,
        );
        fold_counter(
            &mut self.aggr_n_aggregated_connections,
            input.n_aggregated_connections,
        );
    }
}

impl Aggregate for Ipv4Connection {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.tuple, input.tuple);
        replace_value(&mut self.spid, input.spid);
        replace_value(&mut self.dpid, input.dpid);
        replace_value(&mut self.state, input.state);
        replace_value(&mut self.error_code, input.error_code);
        merge_singleton(&mut self.counters, input.counters, stats);
    }
}

impl Aggregate for NetworkByPort {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.port, input.port);
        merge_singleton(&mut self.counters, input.counters, stats);
    }
}

impl Aggregate for Ipv4NetworkInterface {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.name, input.name);
        replace_value(&mut self.addr, input.addr);
        replace_value(&mut self.netmask, input.netmask);
        replace_value(&mut self.bcast, input.bcast);
    }
}
