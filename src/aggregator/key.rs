use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::schema::container::{Container, MountedFs};
use crate::schema::counters::{FileStat, KeyValue};
use crate::schema::network::{Ipv4Connection, Ipv4NetworkInterface, Ipv4Tuple, NetworkByPort};
use crate::schema::orchestrator::{
    AgentEvent, K8sCommon, K8sNamespace, K8sNode, K8sPersistentVolumeClaim, K8sPod, K8sService,
    K8sServicePort,
};
use crate::schema::process::{CommandDetails, Program};
use crate::schema::protocols::{
    AppCheck, AppMetric, MongodbCollectionDetails, MongodbOpTypeDetails, Percentile,
    SqlEntryDetails, SqlQueryTypeDetails, StatsdMetric, StatusCodeDetails, UrlDetails,
};

use super::{Aggregate, MergeStats};

/// Identifies the same logical entry across snapshots.
///
/// `key_equal` and `key_hash` look only at key fields, and equal keys must
/// hash equally. The defaults derive both from [`PrimaryKey::primary_key`].
pub trait PrimaryKey {
    type Key: Eq + Hash;

    fn primary_key(&self) -> Self::Key;

    fn key_equal(&self, other: &Self) -> bool {
        self.primary_key() == other.primary_key()
    }

    fn key_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.primary_key().hash(&mut hasher);
        hasher.finish()
    }
}

/// Merges `input` into `out` entry by entry.
///
/// An input entry whose key matches an output entry is aggregated into it;
/// otherwise it is aggregated into a fresh default entry that is appended
/// and becomes matchable by later input entries of the same call.
pub fn merge_repeated<T>(out: &mut Vec<T>, input: Vec<T>, stats: &mut MergeStats)
where
    T: Aggregate + PrimaryKey,
{
    if input.is_empty() {
        return;
    }

    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::with_capacity(out.len() + input.len());
    for (idx, entry) in out.iter().enumerate() {
        buckets.entry(entry.key_hash()).or_default().push(idx);
    }

    for entry in input {
        let found = buckets.get(&entry.key_hash()).and_then(|bucket| {
            bucket
                .iter()
                .copied()
                .find(|&idx| out[idx].key_equal(&entry))
        });

        match found {
            Some(idx) => {
                out[idx].aggregate(entry, stats);
                stats.records_merged += 1;
            }
            None => {
                let mut fresh = T::default();
                fresh.aggregate(entry, stats);
                buckets.entry(fresh.key_hash()).or_default().push(out.len());
                out.push(fresh);
                stats.records_appended += 1;
            }
        }
    }
}

/// Merges an optional sub-record, creating the output side on first use.
pub fn merge_singleton<T: Aggregate>(
    out: &mut Option<T>,
    input: Option<T>,
    stats: &mut MergeStats,
) {
    if let Some(input) = input {
        out.get_or_insert_with(T::default).aggregate(input, stats);
    }
}

impl PrimaryKey for Program {
    type Key = u64;

    /// The program identity once pids have been substituted.
    fn primary_key(&self) -> u64 {
        self.pid
    }
}

impl PrimaryKey for Ipv4Connection {
    type Key = (Ipv4Tuple, u64, u64);

    fn primary_key(&self) -> Self::Key {
        (self.tuple, self.spid, self.dpid)
    }
}

impl PrimaryKey for Ipv4NetworkInterface {
    type Key = (String, u32, u32, u32);

    fn primary_key(&self) -> Self::Key {
        (self.name.clone(), self.addr, self.netmask, self.bcast)
    }
}

impl PrimaryKey for Container {
    type Key = String;

    fn primary_key(&self) -> String {
        self.id.clone()
    }
}

impl PrimaryKey for KeyValue {
    type Key = String;

    fn primary_key(&self) -> String {
        self.key.clone()
    }
}

impl PrimaryKey for MountedFs {
    type Key = (String, String);

    fn primary_key(&self) -> Self::Key {
        (self.device.clone(), self.mount_dir.clone())
    }
}

impl PrimaryKey for FileStat {
    type Key = String;

    fn primary_key(&self) -> String {
        self.name.clone()
    }
}

impl PrimaryKey for NetworkByPort {
    type Key = u32;

    fn primary_key(&self) -> u32 {
        self.port
    }
}

impl PrimaryKey for UrlDetails {
    type Key = String;

    fn primary_key(&self) -> String {
        self.url.clone()
    }
}

impl PrimaryKey for StatusCodeDetails {
    type Key = u32;

    fn primary_key(&self) -> u32 {
        self.status_code
    }
}

impl PrimaryKey for SqlEntryDetails {
    type Key = String;

    fn primary_key(&self) -> String {
        self.name.clone()
    }
}

impl PrimaryKey for SqlQueryTypeDetails {
    type Key = u32;

    fn primary_key(&self) -> u32 {
        self.query_type
    }
}

impl PrimaryKey for MongodbOpTypeDetails {
    type Key = u32;

    fn primary_key(&self) -> u32 {
        self.op
    }
}

impl PrimaryKey for MongodbCollectionDetails {
    type Key = String;

    fn primary_key(&self) -> String {
        self.name.clone()
    }
}

impl PrimaryKey for Percentile {
    type Key = u32;

    fn primary_key(&self) -> u32 {
        self.percentile
    }
}

impl PrimaryKey for StatsdMetric {
    type Key = (String, Vec<KeyValue>);

    fn primary_key(&self) -> Self::Key {
        (self.name.clone(), self.tags.clone())
    }
}

impl PrimaryKey for AppMetric {
    type Key = (String, Vec<KeyValue>);

    fn primary_key(&self) -> Self::Key {
        (self.name.clone(), self.tags.clone())
    }
}

impl PrimaryKey for AppCheck {
    type Key = (String, Vec<KeyValue>);

    fn primary_key(&self) -> Self::Key {
        (self.name.clone(), self.tags.clone())
    }
}

impl PrimaryKey for AgentEvent {
    type Key = (u64, String, String);

    fn primary_key(&self) -> Self::Key {
        (self.timestamp_sec, self.scope.clone(), self.title.clone())
    }
}

impl PrimaryKey for CommandDetails {
    type Key = (u64, u64, String);

    fn primary_key(&self) -> Self::Key {
        (self.timestamp, self.pid, self.cmdline.clone())
    }
}

/// Uid of an object's metadata; missing metadata keys as the empty uid.
fn common_uid(common: &Option<K8sCommon>) -> String {
    common.as_ref().map(|c| c.uid.clone()).unwrap_or_default()
}

impl PrimaryKey for K8sNamespace {
    type Key = String;

    fn primary_key(&self) -> String {
        common_uid(&self.common)
    }
}

impl PrimaryKey for K8sPod {
    type Key = String;

    fn primary_key(&self) -> String {
        common_uid(&self.common)
    }
}

impl PrimaryKey for K8sService {
    type Key = String;

    fn primary_key(&self) -> String {
        common_uid(&self.common)
    }
}

impl PrimaryKey for K8sPersistentVolumeClaim {
    type Key = String;

    fn primary_key(&self) -> String {
        common_uid(&self.common)
    }
}

impl PrimaryKey for K8sServicePort {
    type Key = (u32, String);

    fn primary_key(&self) -> Self::Key {
        (self.port, self.protocol.clone())
    }
}

impl PrimaryKey for K8sNode {
    type Key = Vec<String>;

    fn primary_key(&self) -> Vec<String> {
        self.host_ips.clone()
    }

    /// Two nodes are the same when they share any host IP. Nodes without
    /// any host IP all share the empty key.
    fn key_equal(&self, other: &Self) -> bool {
        (self.host_ips.is_empty() && other.host_ips.is_empty())
            || self
                .host_ips
                .iter()
                .any(|ip| other.host_ips.iter().any(|o| o == ip))
    }

    /// Any-element matching cannot be hashed per element, so every node
    /// lands in one bucket.
    fn key_hash(&self) -> u64 {
        0
    }
}
