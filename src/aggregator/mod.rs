//! Snapshot aggregation engine.
//!
//! A [`MessageAggregator`] folds raw per-interval [`Metrics`] snapshots into
//! one caller-owned output snapshot, then caps its bounded collections once
//! per reporting period. The engine is synchronous and performs no I/O.

pub mod builder;
pub mod field;
pub mod hash;
pub mod key;
pub mod limiter;
pub mod pid;
mod records;

use std::ops::AddAssign;

use crate::config::LimitsConfig;
use crate::schema::Metrics;

pub use builder::AggregatorBuilder;
pub use key::{merge_repeated, merge_singleton, PrimaryKey};
pub use limiter::{LimitCategory, LimitReport, Limiter};
pub use pid::PidMap;

/// Merge rule of one record type.
///
/// `aggregate` folds `input` into `self`. It never fails: unset input fields
/// leave `self` untouched and missing keys match as their default value.
pub trait Aggregate: Default {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats);
}

/// Counters of merge work, per call or accumulated since the last reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub snapshots_aggregated: u64,
    /// Repeated entries folded into an existing entry with the same key.
    pub records_merged: u64,
    /// Repeated entries appended under a new key.
    pub records_appended: u64,
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, other: Self) {
        self.snapshots_aggregated += other.snapshots_aggregated;
        self.records_merged += other.records_merged;
        self.records_appended += other.records_appended;
    }
}

/// Rolls raw snapshots up into a reporting-period snapshot.
#[derive(Debug, Clone)]
pub struct MessageAggregator {
    limiter: Limiter,
    connections_enabled: bool,
    commands_enabled: bool,
    events_enabled: bool,
    pid_map: PidMap,
    stats: MergeStats,
}

impl MessageAggregator {
    /// Aggregator with every collection enabled.
    pub fn new(limits: LimitsConfig) -> Self {
        AggregatorBuilder::new().limits(limits).build()
    }

    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::new()
    }

    /// Merges one raw snapshot into `output` and returns the work done.
    ///
    /// Disabled collections are dropped from the input first. Program pids
    /// and every pid reference in the input are then replaced by program
    /// identities, so the same program merges across snapshots even when its
    /// pids change.
    pub fn aggregate(&mut self, mut input: Metrics, output: &mut Metrics) -> MergeStats {
        if !self.connections_enabled {
            input.ipv4_connections.clear();
            input.ipv4_incomplete_connections.clear();
        }
        if !self.commands_enabled {
            input.commands.clear();
        }
        if !self.events_enabled {
            input.events.clear();
        }

        self.pid_map.substitute(&mut input);

        let mut delta = MergeStats {
            snapshots_aggregated: 1,
            ..Default::default()
        };
        output.aggregate(input, &mut delta);
        self.stats += delta;
        delta
    }

    /// Caps the bounded collections of a rolled-up snapshot.
    pub fn limit(&self, output: &mut Metrics) -> LimitReport {
        self.limiter.apply(output)
    }

    /// Forgets the pid map and the accumulated counters.
    pub fn reset(&mut self) {
        self.pid_map.clear();
        self.stats = MergeStats::default();
    }

    /// Pid map built by the most recent `aggregate` call.
    pub fn pid_map(&self) -> &PidMap {
        &self.pid_map
    }

    /// Merge counters accumulated since construction or the last reset.
    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    pub fn limits(&self) -> &LimitsConfig {
        self.limiter.limits()
    }
}
