use crate::aggregator::field::{
    fold_counter, fold_score, replace_list_if_nonempty, replace_value,
};
use crate::aggregator::key::merge_singleton;
use crate::aggregator::{Aggregate, MergeStats};
use crate::schema::counters::{
    CounterBytes, CounterTime, CounterTimeBidirectional, CounterTimeBytes, FileStat, KeyValue,
    ResourceCategories, SyscallErrors, TimeCategories, TransactionCategories,
};

impl Aggregate for CounterTime {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        fold_counter(&mut self.aggr_count, input.count);
        fold_counter(&mut self.aggr_time_ns, input.time_ns);
        fold_counter(&mut self.aggr_time_percentage, input.time_percentage);
    }
}

impl Aggregate for CounterTimeBytes {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        fold_counter(&mut self.aggr_count_in, input.count_in);
        fold_counter(&mut self.aggr_count_out, input.count_out);
        fold_counter(&mut self.aggr_time_ns_in, input.time_ns_in);
        fold_counter(&mut self.aggr_time_ns_out, input.time_ns_out);
        fold_counter(&mut self.aggr_bytes_in, input.bytes_in);
        fold_counter(&mut self.aggr_bytes_out, input.bytes_out);
    }
}

impl Aggregate for CounterTimeBidirectional {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        fold_counter(&mut self.aggr_count_in, input.count_in);
        fold_counter(&mut self.aggr_count_out, input.count_out);
        fold_counter(&mut self.aggr_time_ns_in, input.time_ns_in);
        fold_counter(&mut self.aggr_time_ns_out, input.time_ns_out);
    }
}

impl Aggregate for CounterBytes {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        fold_counter(&mut self.aggr_count_in, input.count_in);
        fold_counter(&mut self.aggr_count_out, input.count_out);
        fold_counter(&mut self.aggr_bytes_in, input.bytes_in);
        fold_counter(&mut self.aggr_bytes_out, input.bytes_out);
    }
}

impl Aggregate for TimeCategories {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.other, input.other, stats);
        merge_singleton(&mut self.file, input.file, stats);
        merge_singleton(&mut self.net, input.net, stats);
        merge_singleton(&mut self.ipc, input.ipc, stats);
        merge_singleton(&mut self.process, input.process, stats);
        merge_singleton(&mut self.wait, input.wait, stats);
        merge_singleton(&mut self.processing, input.processing, stats);
    }
}

impl Aggregate for TransactionCategories {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.incoming, input.incoming, stats);
        merge_singleton(&mut self.outgoing, input.outgoing, stats);
    }
}

impl Aggregate for ResourceCategories {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        fold_score(&mut self.aggr_capacity_score, input.capacity_score);
        fold_score(
            &mut self.aggr_stolen_capacity_score,
            input.stolen_capacity_score,
        );
        fold_counter(
            &mut self.aggr_connection_queue_usage_pct,
            input.connection_queue_usage_pct,
        );
        fold_counter(&mut self.aggr_fd_usage_pct, input.fd_usage_pct);
        fold_counter(&mut self.aggr_cpu_pct, input.cpu_pct);
        fold_counter(
            &mut self.aggr_resident_memory_usage_kb,
            input.resident_memory_usage_kb,
        );
        fold_counter(
            &mut self.aggr_virtual_memory_usage_kb,
            input.virtual_memory_usage_kb,
        );
        fold_counter(
            &mut self.aggr_swap_memory_usage_kb,
            input.swap_memory_usage_kb,
        );
        fold_counter(&mut self.aggr_major_pagefaults, input.major_pagefaults);
        fold_counter(&mut self.aggr_minor_pagefaults, input.minor_pagefaults);
        fold_counter(&mut self.aggr_fd_count, input.fd_count);
        fold_counter(&mut self.aggr_cpu_shares, input.cpu_shares);
        fold_counter(&mut self.aggr_memory_limit_kb, input.memory_limit_kb);
        fold_counter(&mut self.aggr_threads_count, input.threads_count);
        fold_counter(&mut self.aggr_syscall_count, input.syscall_count);
    }
}

impl Aggregate for SyscallErrors {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        fold_counter(&mut self.aggr_count, input.count);
        fold_counter(&mut self.aggr_count_file, input.count_file);
        fold_counter(&mut self.aggr_count_file_open, input.count_file_open);
        fold_counter(&mut self.aggr_count_net, input.count_net);
        replace_list_if_nonempty(&mut self.top_error_codes, input.top_error_codes);
    }
}

impl Aggregate for FileStat {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.name, input.name);
        fold_counter(&mut self.aggr_bytes, input.bytes);
        fold_counter(&mut self.aggr_time_ns, input.time_ns);
        fold_counter(&mut self.aggr_open_count, input.open_count);
        fold_counter(&mut self.aggr_errors, input.errors);
    }
}

impl Aggregate for KeyValue {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.key, input.key);
        replace_value(&mut self.value, input.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::field::INVALID_SCORE;
    use crate::schema::counters::Aggregation64;

    fn resources(cpu_pct: u64, score: u32) -> ResourceCategories {
        ResourceCategories {
            cpu_pct: Some(cpu_pct),
            capacity_score: Some(score),
            ..Default::default()
        }
    }

    #[test]
    fn test_resource_counters_skip_invalid_score() {
        let mut out = ResourceCategories::default();
        let mut stats = MergeStats::default();

        out.aggregate(resources(1_200, 8_000), &mut stats);
        out.aggregate(resources(800, INVALID_SCORE), &mut stats);

        assert_eq!(out.aggr_capacity_score, Some(Aggregation64::from_value(8_000)));
        let cpu = out.aggr_cpu_pct.expect("cpu aggregated");
        assert_eq!(cpu.sum, 2_000);
        assert_eq!(cpu.weight, 2);
    }

    #[test]
    fn test_time_categories_merge_recursively() {
        let sample = TimeCategories {
            wait: Some(CounterTime {
                count: Some(3),
                time_ns: Some(1_500),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut out = TimeCategories::default();
        let mut stats = MergeStats::default();

        out.aggregate(sample.clone(), &mut stats);
        out.aggregate(sample, &mut stats);
        out.aggregate(TimeCategories::default(), &mut stats);

        let wait = out.wait.expect("wait category");
        assert_eq!(wait.aggr_count.map(|a| a.sum), Some(6));
        assert_eq!(wait.aggr_time_ns.map(|a| a.weight), Some(2));
        assert!(out.file.is_none());
    }

    #[test]
    fn test_syscall_errors_replace_top_codes() {
        let mut out = SyscallErrors::default();
        let mut stats = MergeStats::default();

        out.aggregate(
            SyscallErrors {
                count: Some(5),
                top_error_codes: vec![2, 13],
                ..Default::default()
            },
            &mut stats,
        );
        out.aggregate(
            SyscallErrors {
                count: Some(1),
                ..Default::default()
            },
            &mut stats,
        );

        assert_eq!(out.top_error_codes, vec![2, 13]);
        assert_eq!(out.aggr_count.map(|a| a.sum), Some(6));
    }
}
