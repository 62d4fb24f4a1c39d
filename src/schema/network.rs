use serde::{Deserialize, Serialize};

use super::counters::{Aggregation64, CounterBytes, CounterTimeBidirectional};

/// Endpoint 5-tuple of an IPv4 connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv4Tuple {
    pub sip: u32,
    pub dip: u32,
    pub sport: u32,
    pub dport: u32,
    pub l4proto: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionCategories {
    pub server: Option<CounterBytes>,
    pub client: Option<CounterBytes>,
    pub transaction_counters: Option<CounterTimeBidirectional>,
    pub n_aggregated_connections: Option<u64>,
    pub aggr_n_aggregated_connections: Option<Aggregation64>,
}

impl ConnectionCategories {
    /// Aggregated bytes on both sides of the connection.
    pub fn total_bytes(&self) -> u64 {
        let server = self.server.as_ref().map_or(0, CounterBytes::total_bytes);
        let client = self.client.as_ref().map_or(0, CounterBytes::total_bytes);
        server.saturating_add(client)
    }
}

/// An IPv4 connection between two processes.
///
/// `spid` and `dpid` are raw process ids in a captured snapshot and are
/// rewritten to program identities before merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv4Connection {
    pub tuple: Ipv4Tuple,
    pub spid: u64,
    pub dpid: u64,
    pub state: u32,
    pub error_code: u32,
    pub counters: Option<ConnectionCategories>,
}

impl Ipv4Connection {
    pub fn total_bytes(&self) -> u64 {
        self.counters
            .as_ref()
            .map_or(0, ConnectionCategories::total_bytes)
    }
}

/// Traffic totals for one listening port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkByPort {
    pub port: u32,
    pub counters: Option<ConnectionCategories>,
}

impl NetworkByPort {
    pub fn total_bytes(&self) -> u64 {
        self.counters
            .as_ref()
            .map_or(0, ConnectionCategories::total_bytes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv4NetworkInterface {
    pub name: String,
    pub addr: u32,
    pub netmask: u32,
    pub bcast: u32,
}
