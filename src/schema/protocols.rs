use serde::{Deserialize, Serialize};

use super::counters::{Aggregation64, AggregationDouble, KeyValue};

/// Per-protocol request breakdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Proto {
    pub http: Option<HttpInfo>,
    pub mysql: Option<SqlInfo>,
    pub postgres: Option<SqlInfo>,
    pub mongodb: Option<MongodbInfo>,
}

/// Request counters shared by every protocol table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterProtoEntry {
    pub ncalls: Option<u64>,
    pub aggr_ncalls: Option<Aggregation64>,
    pub time_tot: Option<u64>,
    pub aggr_time_tot: Option<Aggregation64>,
    pub time_max: Option<u64>,
    pub aggr_time_max: Option<Aggregation64>,
    pub bytes_in: Option<u64>,
    pub aggr_bytes_in: Option<Aggregation64>,
    pub bytes_out: Option<u64>,
    pub aggr_bytes_out: Option<Aggregation64>,
    pub nerrors: Option<u64>,
    pub aggr_nerrors: Option<Aggregation64>,
    pub percentiles: Vec<Percentile>,
}

impl CounterProtoEntry {
    /// Aggregated call count, the score used when limiting protocol tables.
    pub fn ncalls_sum(&self) -> u64 {
        self.aggr_ncalls.map_or(0, |a| a.sum)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Percentile {
    pub percentile: u32,
    pub value: Option<u64>,
    pub aggr_value: Option<Aggregation64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpInfo {
    pub server_urls: Vec<UrlDetails>,
    pub client_urls: Vec<UrlDetails>,
    pub server_status_codes: Vec<StatusCodeDetails>,
    pub client_status_codes: Vec<StatusCodeDetails>,
    pub server_totals: Option<CounterProtoEntry>,
    pub client_totals: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlDetails {
    pub url: String,
    pub counters: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCodeDetails {
    pub status_code: u32,
    pub ncalls: Option<u64>,
    pub aggr_ncalls: Option<Aggregation64>,
}

/// MySQL / PostgreSQL breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlInfo {
    pub server_queries: Vec<SqlEntryDetails>,
    pub client_queries: Vec<SqlEntryDetails>,
    pub server_tables: Vec<SqlEntryDetails>,
    pub client_tables: Vec<SqlEntryDetails>,
    pub server_query_types: Vec<SqlQueryTypeDetails>,
    pub client_query_types: Vec<SqlQueryTypeDetails>,
    pub server_totals: Option<CounterProtoEntry>,
    pub client_totals: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlEntryDetails {
    pub name: String,
    pub counters: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlQueryTypeDetails {
    pub query_type: u32,
    pub counters: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongodbInfo {
    pub servers_ops: Vec<MongodbOpTypeDetails>,
    pub clients_ops: Vec<MongodbOpTypeDetails>,
    pub servers_collections: Vec<MongodbCollectionDetails>,
    pub clients_collections: Vec<MongodbCollectionDetails>,
    pub server_totals: Option<CounterProtoEntry>,
    pub client_totals: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongodbOpTypeDetails {
    pub op: u32,
    pub counters: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongodbCollectionDetails {
    pub name: String,
    pub counters: Option<CounterProtoEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsdInfo {
    pub statsd_metrics: Vec<StatsdMetric>,
}

/// A statsd metric, identified by its name and full tag set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsdMetric {
    pub name: String,
    pub tags: Vec<KeyValue>,
    pub metric_type: u32,
    pub value: Option<f64>,
    pub aggr_value: Option<AggregationDouble>,
    pub count: Option<u64>,
    pub aggr_count: Option<Aggregation64>,
}

/// Metrics and service checks gathered by application checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub process_name: String,
    pub metrics: Vec<AppMetric>,
    pub checks: Vec<AppCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetric {
    pub name: String,
    pub tags: Vec<KeyValue>,
    pub metric_type: u32,
    pub value: Option<f64>,
    pub aggr_value: Option<AggregationDouble>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppCheck {
    pub name: String,
    pub tags: Vec<KeyValue>,
    /// Check status; the most recent reported status wins.
    pub value: Option<u32>,
}
