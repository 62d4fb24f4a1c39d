use serde::{Deserialize, Serialize};

/// Rolled-up view of one unsigned field across every sample folded into it.
///
/// `weight` counts samples, not values, so `sum / weight` is the mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation64 {
    pub sum: u64,
    pub min: u64,
    pub max: u64,
    pub weight: u64,
}

impl Aggregation64 {
    /// Mean of the folded samples, `None` before the first sample.
    pub fn avg(&self) -> Option<u64> {
        if self.weight == 0 {
            return None;
        }
        Some(self.sum / self.weight)
    }
}

/// Floating-point counterpart of [`Aggregation64`] (statsd and app-check values).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationDouble {
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub weight: u64,
}

impl AggregationDouble {
    pub fn avg(&self) -> Option<f64> {
        if self.weight == 0 {
            return None;
        }
        Some(self.sum / self.weight as f64)
    }
}

/// Count and time spent in one syscall category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterTime {
    pub count: Option<u64>,
    pub aggr_count: Option<Aggregation64>,
    pub time_ns: Option<u64>,
    pub aggr_time_ns: Option<Aggregation64>,
    pub time_percentage: Option<u64>,
    pub aggr_time_percentage: Option<Aggregation64>,
}

/// Directional count, time and byte totals for I/O categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterTimeBytes {
    pub count_in: Option<u64>,
    pub aggr_count_in: Option<Aggregation64>,
    pub count_out: Option<u64>,
    pub aggr_count_out: Option<Aggregation64>,
    pub time_ns_in: Option<u64>,
    pub aggr_time_ns_in: Option<Aggregation64>,
    pub time_ns_out: Option<u64>,
    pub aggr_time_ns_out: Option<Aggregation64>,
    pub bytes_in: Option<u64>,
    pub aggr_bytes_in: Option<Aggregation64>,
    pub bytes_out: Option<u64>,
    pub aggr_bytes_out: Option<Aggregation64>,
}

/// Request/response counts and latency in both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterTimeBidirectional {
    pub count_in: Option<u64>,
    pub aggr_count_in: Option<Aggregation64>,
    pub count_out: Option<u64>,
    pub aggr_count_out: Option<Aggregation64>,
    pub time_ns_in: Option<u64>,
    pub aggr_time_ns_in: Option<Aggregation64>,
    pub time_ns_out: Option<u64>,
    pub aggr_time_ns_out: Option<Aggregation64>,
}

/// Per-side connection traffic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterBytes {
    pub count_in: Option<u64>,
    pub aggr_count_in: Option<Aggregation64>,
    pub count_out: Option<u64>,
    pub aggr_count_out: Option<Aggregation64>,
    pub bytes_in: Option<u64>,
    pub aggr_bytes_in: Option<Aggregation64>,
    pub bytes_out: Option<u64>,
    pub aggr_bytes_out: Option<Aggregation64>,
}

impl CounterBytes {
    /// Aggregated bytes moved in either direction.
    pub fn total_bytes(&self) -> u64 {
        let bytes_in = self.aggr_bytes_in.map_or(0, |a| a.sum);
        let bytes_out = self.aggr_bytes_out.map_or(0, |a| a.sum);
        bytes_in.saturating_add(bytes_out)
    }
}

/// Time breakdown by syscall category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeCategories {
    pub other: Option<CounterTime>,
    pub file: Option<CounterTimeBytes>,
    pub net: Option<CounterTimeBytes>,
    pub ipc: Option<CounterTime>,
    pub process: Option<CounterTime>,
    pub wait: Option<CounterTime>,
    pub processing: Option<CounterTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionCategories {
    pub incoming: Option<CounterTimeBidirectional>,
    pub outgoing: Option<CounterTimeBidirectional>,
}

/// Resource usage gauges for a host, container or program.
///
/// `capacity_score` and `stolen_capacity_score` may carry
/// [`crate::aggregator::field::INVALID_SCORE`], which is never folded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCategories {
    pub capacity_score: Option<u32>,
    pub aggr_capacity_score: Option<Aggregation64>,
    pub stolen_capacity_score: Option<u32>,
    pub aggr_stolen_capacity_score: Option<Aggregation64>,
    pub connection_queue_usage_pct: Option<u64>,
    pub aggr_connection_queue_usage_pct: Option<Aggregation64>,
    pub fd_usage_pct: Option<u64>,
    pub aggr_fd_usage_pct: Option<Aggregation64>,
    /// CPU usage in hundredths of a percent.
    pub cpu_pct: Option<u64>,
    pub aggr_cpu_pct: Option<Aggregation64>,
    pub resident_memory_usage_kb: Option<u64>,
    pub aggr_resident_memory_usage_kb: Option<Aggregation64>,
    pub virtual_memory_usage_kb: Option<u64>,
    pub aggr_virtual_memory_usage_kb: Option<Aggregation64>,
    pub swap_memory_usage_kb: Option<u64>,
    pub aggr_swap_memory_usage_kb: Option<Aggregation64>,
    pub major_pagefaults: Option<u64>,
    pub aggr_major_pagefaults: Option<Aggregation64>,
    pub minor_pagefaults: Option<u64>,
    pub aggr_minor_pagefaults: Option<Aggregation64>,
    pub fd_count: Option<u64>,
    pub aggr_fd_count: Option<Aggregation64>,
    pub cpu_shares: Option<u64>,
    pub aggr_cpu_shares: Option<Aggregation64>,
    pub memory_limit_kb: Option<u64>,
    pub aggr_memory_limit_kb: Option<Aggregation64>,
    pub threads_count: Option<u64>,
    pub aggr_threads_count: Option<Aggregation64>,
    pub syscall_count: Option<u64>,
    pub aggr_syscall_count: Option<Aggregation64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyscallErrors {
    pub count: Option<u64>,
    pub aggr_count: Option<Aggregation64>,
    pub count_file: Option<u64>,
    pub aggr_count_file: Option<Aggregation64>,
    pub count_file_open: Option<u64>,
    pub aggr_count_file_open: Option<Aggregation64>,
    pub count_net: Option<u64>,
    pub aggr_count_net: Option<Aggregation64>,
    /// Most frequent errno values of the interval, replaced wholesale.
    pub top_error_codes: Vec<u32>,
}

/// I/O totals for one file or block device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStat {
    pub name: String,
    pub bytes: Option<u64>,
    pub aggr_bytes: Option<Aggregation64>,
    pub time_ns: Option<u64>,
    pub aggr_time_ns: Option<Aggregation64>,
    pub open_count: Option<u64>,
    pub aggr_open_count: Option<Aggregation64>,
    pub errors: Option<u64>,
    pub aggr_errors: Option<Aggregation64>,
}

/// Generic string pair used for labels and tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
