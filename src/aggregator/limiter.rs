use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::config::LimitsConfig;
use crate::schema::container::Container;
use crate::schema::counters::FileStat;
use crate::schema::network::{Ipv4Connection, NetworkByPort};
use crate::schema::orchestrator::AgentEvent;
use crate::schema::process::{CommandDetails, Program};
use crate::schema::protocols::{
    AppCheck, AppInfo, AppMetric, MongodbCollectionDetails, Proto, SqlEntryDetails, StatsdInfo,
    StatsdMetric, StatusCodeDetails, UrlDetails,
};
use crate::schema::Metrics;

/// A bounded collection family, one cap each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LimitCategory {
    TopFilesPerHost,
    TopDevicesPerHost,
    TopFilesPerContainer,
    TopDevicesPerContainer,
    TopFilesPerProgram,
    TopDevicesPerProgram,
    SqlQueries,
    MongodbCollections,
    HttpUrls,
    HttpStatusCodes,
    ServerPortsPerHost,
    ServerPortsPerContainer,
    Connections,
    Containers,
    Programs,
    Events,
    Commands,
    StatsdMetrics,
    AppMetrics,
}

impl LimitCategory {
    pub const ALL: [LimitCategory; 19] = [
        Self::TopFilesPerHost,
        Self::TopDevicesPerHost,
        Self::TopFilesPerContainer,
        Self::TopDevicesPerContainer,
        Self::TopFilesPerProgram,
        Self::TopDevicesPerProgram,
        Self::SqlQueries,
        Self::MongodbCollections,
        Self::HttpUrls,
        Self::HttpStatusCodes,
        Self::ServerPortsPerHost,
        Self::ServerPortsPerContainer,
        Self::Connections,
        Self::Containers,
        Self::Programs,
        Self::Events,
        Self::Commands,
        Self::StatsdMetrics,
        Self::AppMetrics,
    ];

    /// Name used in config keys, logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopFilesPerHost => "top_files_per_host",
            Self::TopDevicesPerHost => "top_devices_per_host",
            Self::TopFilesPerContainer => "top_files_per_container",
            Self::TopDevicesPerContainer => "top_devices_per_container",
            Self::TopFilesPerProgram => "top_files_per_program",
            Self::TopDevicesPerProgram => "top_devices_per_program",
            Self::SqlQueries => "sql_queries",
            Self::MongodbCollections => "mongodb_collections",
            Self::HttpUrls => "http_urls",
            Self::HttpStatusCodes => "http_status_codes",
            Self::ServerPortsPerHost => "server_ports_per_host",
            Self::ServerPortsPerContainer => "server_ports_per_container",
            Self::Connections => "connections",
            Self::Containers => "containers",
            Self::Programs => "programs",
            Self::Events => "events",
            Self::Commands => "commands",
            Self::StatsdMetrics => "statsd_metrics",
            Self::AppMetrics => "app_metrics",
        }
    }

    /// Configured cap for this category.
    pub fn cap(self, limits: &LimitsConfig) -> usize {
        match self {
            Self::TopFilesPerHost => limits.top_files_per_host,
            Self::TopDevicesPerHost => limits.top_devices_per_host,
            Self::TopFilesPerContainer => limits.top_files_per_container,
            Self::TopDevicesPerContainer => limits.top_devices_per_container,
            Self::TopFilesPerProgram => limits.top_files_per_program,
            Self::TopDevicesPerProgram => limits.top_devices_per_program,
            Self::SqlQueries => limits.sql_queries,
            Self::MongodbCollections => limits.mongodb_collections,
            Self::HttpUrls => limits.http_urls,
            Self::HttpStatusCodes => limits.http_status_codes,
            Self::ServerPortsPerHost => limits.server_ports_per_host,
            Self::ServerPortsPerContainer => limits.server_ports_per_container,
            Self::Connections => limits.connections,
            Self::Containers => limits.containers,
            Self::Programs => limits.programs,
            Self::Events => limits.events,
            Self::Commands => limits.commands,
            Self::StatsdMetrics => limits.statsd_metrics,
            Self::AppMetrics => limits.app_metrics,
        }
    }
}

/// Entries dropped by one limiting pass, per category.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LimitReport {
    dropped: HashMap<LimitCategory, usize>,
}

impl LimitReport {
    fn record(&mut self, category: LimitCategory, dropped: usize) {
        if dropped > 0 {
            *self.dropped.entry(category).or_insert(0) += dropped;
        }
    }

    pub fn dropped(&self, category: LimitCategory) -> usize {
        self.dropped.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty()
    }

    /// Categories that dropped entries, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (LimitCategory, usize)> + '_ {
        LimitCategory::ALL
            .into_iter()
            .filter_map(|c| self.dropped.get(&c).map(|&n| (c, n)))
    }
}

/// Caps `entries` at `cap` and returns how many were dropped.
///
/// Priority entries go first in their original order. If there are at
/// least `cap` of them, the first `cap` are kept and nothing else. Otherwise
/// the remaining slots go to the highest-scoring other entries, sorted by
/// descending score with ties in original order.
pub fn limit_entries<T, S, P, F>(
    entries: &mut Vec<T>,
    cap: usize,
    is_priority: P,
    score: F,
) -> usize
where
    S: PartialOrd,
    P: Fn(&T) -> bool,
    F: Fn(&T) -> S,
{
    let before = entries.len();
    if before <= cap {
        return 0;
    }

    let (mut kept, mut rest): (Vec<T>, Vec<T>) = entries.drain(..).partition(|e| is_priority(e));

    if kept.len() >= cap {
        kept.truncate(cap);
    } else {
        rest.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
        rest.truncate(cap - kept.len());
        kept.append(&mut rest);
    }

    *entries = kept;
    before - entries.len()
}

fn no_priority<T>(_: &T) -> bool {
    false
}

fn file_bytes(stat: &FileStat) -> u64 {
    stat.aggr_bytes.map_or(0, |a| a.sum)
}

fn program_cpu(program: &Program) -> u64 {
    program
        .resource_counters()
        .and_then(|r| r.aggr_cpu_pct)
        .map_or(0, |a| a.sum)
}

fn container_cpu(container: &Container) -> u64 {
    container
        .resource_counters
        .as_ref()
        .and_then(|r| r.aggr_cpu_pct)
        .map_or(0, |a| a.sum)
}

fn is_login_shell(command: &CommandDetails) -> bool {
    command.login_shell_distance == Some(0)
}

/// Applies the configured caps to a rolled-up snapshot.
#[derive(Debug, Clone)]
pub struct Limiter {
    limits: LimitsConfig,
}

impl Limiter {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Runs one limiting pass over `metrics`.
    ///
    /// Top-level lists are capped before their members, so nested
    /// collections are only visited for surviving entries.
    pub fn apply(&self, metrics: &mut Metrics) -> LimitReport {
        let mut pass = Pass {
            limits: &self.limits,
            report: LimitReport::default(),
        };

        pass.limit(
            LimitCategory::Containers,
            &mut metrics.containers,
            |c: &Container| !c.reporting_group_ids.is_empty(),
            container_cpu,
        );
        pass.limit(
            LimitCategory::Programs,
            &mut metrics.programs,
            |p: &Program| !p.program_reporting_group_ids.is_empty(),
            program_cpu,
        );
        pass.limit(
            LimitCategory::Connections,
            &mut metrics.ipv4_connections,
            no_priority,
            Ipv4Connection::total_bytes,
        );
        pass.limit(
            LimitCategory::Connections,
            &mut metrics.ipv4_incomplete_connections,
            no_priority,
            Ipv4Connection::total_bytes,
        );
        pass.limit(
            LimitCategory::Events,
            &mut metrics.events,
            no_priority,
            |e: &AgentEvent| e.timestamp_sec,
        );
        pass.limit(
            LimitCategory::Commands,
            &mut metrics.commands,
            is_login_shell,
            |c: &CommandDetails| c.timestamp,
        );
        pass.limit(
            LimitCategory::TopFilesPerHost,
            &mut metrics.top_files,
            no_priority,
            file_bytes,
        );
        pass.limit(
            LimitCategory::TopDevicesPerHost,
            &mut metrics.top_devices,
            no_priority,
            file_bytes,
        );

        if let Some(hostinfo) = metrics.hostinfo.as_mut() {
            pass.server_ports(
                LimitCategory::ServerPortsPerHost,
                &mut hostinfo.network_by_serverports,
            );
        }
        if let Some(protos) = metrics.protos.as_mut() {
            pass.proto(protos);
        }
        if let Some(statsd) = metrics.statsd.as_mut() {
            pass.statsd(statsd);
        }

        for program in &mut metrics.programs {
            let Some(info) = program.procinfo.as_mut() else {
                continue;
            };
            pass.limit(
                LimitCategory::TopFilesPerProgram,
                &mut info.top_files,
                no_priority,
                file_bytes,
            );
            pass.limit(
                LimitCategory::TopDevicesPerProgram,
                &mut info.top_devices,
                no_priority,
                file_bytes,
            );
            if let Some(protos) = info.protos.as_mut() {
                pass.proto(protos);
            }
            if let Some(app) = info.app.as_mut() {
                pass.app(app);
            }
        }

        for container in &mut metrics.containers {
            pass.limit(
                LimitCategory::TopFilesPerContainer,
                &mut container.top_files,
                no_priority,
                file_bytes,
            );
            pass.limit(
                LimitCategory::TopDevicesPerContainer,
                &mut container.top_devices,
                no_priority,
                file_bytes,
            );
            pass.server_ports(
                LimitCategory::ServerPortsPerContainer,
                &mut container.network_by_serverports,
            );
            if let Some(protos) = container.protos.as_mut() {
                pass.proto(protos);
            }
            if let Some(statsd) = container.statsd.as_mut() {
                pass.statsd(statsd);
            }
            if let Some(app) = container.app.as_mut() {
                pass.app(app);
            }
        }

        for (category, dropped) in pass.report.iter() {
            debug!(
                category = category.as_str(),
                dropped,
                cap = category.cap(&self.limits),
                "limited collection"
            );
        }

        pass.report
    }
}

/// State of one `Limiter::apply` call.
struct Pass<'a> {
    limits: &'a LimitsConfig,
    report: LimitReport,
}

impl Pass<'_> {
    fn limit<T, S, P, F>(
        &mut self,
        category: LimitCategory,
        entries: &mut Vec<T>,
        is_priority: P,
        score: F,
    ) where
        S: PartialOrd,
        P: Fn(&T) -> bool,
        F: Fn(&T) -> S,
    {
        let dropped = limit_entries(entries, category.cap(self.limits), is_priority, score);
        self.report.record(category, dropped);
    }

    fn server_ports(&mut self, category: LimitCategory, ports: &mut Vec<NetworkByPort>) {
        self.limit(category, ports, no_priority, NetworkByPort::total_bytes);
    }

    fn proto(&mut self, proto: &mut Proto) {
        let url_calls = |u: &UrlDetails| u.counters.as_ref().map_or(0, |c| c.ncalls_sum());
        let status_calls = |s: &StatusCodeDetails| s.aggr_ncalls.map_or(0, |a| a.sum);
        let sql_calls = |s: &SqlEntryDetails| s.counters.as_ref().map_or(0, |c| c.ncalls_sum());
        let mongo_calls =
            |m: &MongodbCollectionDetails| m.counters.as_ref().map_or(0, |c| c.ncalls_sum());

        if let Some(http) = proto.http.as_mut() {
            self.limit(LimitCategory::HttpUrls, &mut http.server_urls, no_priority, url_calls);
            self.limit(LimitCategory::HttpUrls, &mut http.client_urls, no_priority, url_calls);
            self.limit(
                LimitCategory::HttpStatusCodes,
                &mut http.server_status_codes,
                no_priority,
                status_calls,
            );
            self.limit(
                LimitCategory::HttpStatusCodes,
                &mut http.client_status_codes,
                no_priority,
                status_calls,
            );
        }

        for sql in [proto.mysql.as_mut(), proto.postgres.as_mut()]
            .into_iter()
            .flatten()
        {
            for table in [
                &mut sql.server_queries,
                &mut sql.client_queries,
                &mut sql.server_tables,
                &mut sql.client_tables,
            ] {
                self.limit(LimitCategory::SqlQueries, table, no_priority, sql_calls);
            }
        }

        if let Some(mongodb) = proto.mongodb.as_mut() {
            self.limit(
                LimitCategory::MongodbCollections,
                &mut mongodb.servers_collections,
                no_priority,
                mongo_calls,
            );
            self.limit(
                LimitCategory::MongodbCollections,
                &mut mongodb.clients_collections,
                no_priority,
                mongo_calls,
            );
        }
    }

    fn statsd(&mut self, statsd: &mut StatsdInfo) {
        self.limit(
            LimitCategory::StatsdMetrics,
            &mut statsd.statsd_metrics,
            no_priority,
            |m: &StatsdMetric| m.aggr_value.map_or(0.0, |a| a.sum),
        );
    }

    fn app(&mut self, app: &mut AppInfo) {
        self.limit(
            LimitCategory::AppMetrics,
            &mut app.metrics,
            no_priority,
            |m: &AppMetric| m.aggr_value.map_or(0.0, |a| a.sum),
        );
        // Non-OK statuses are larger, so failing checks survive.
        self.limit(
            LimitCategory::AppMetrics,
            &mut app.checks,
            no_priority,
            |c: &AppCheck| c.value.unwrap_or(0),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::counters::{Aggregation64, ResourceCategories};
    use crate::schema::protocols::{CounterProtoEntry, HttpInfo};

    fn agg(sum: u64) -> Option<Aggregation64> {
        Some(Aggregation64 {
            sum,
            min: sum,
            max: sum,
            weight: 1,
        })
    }

    fn container(id: &str, cpu: u64, groups: &[u32]) -> Container {
        Container {
            id: id.to_string(),
            reporting_group_ids: groups.to_vec(),
            resource_counters: Some(ResourceCategories {
                aggr_cpu_pct: agg(cpu),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn file(name: &str, bytes: u64) -> FileStat {
        FileStat {
            name: name.to_string(),
            aggr_bytes: agg(bytes),
            ..Default::default()
        }
    }

    fn limits_with(f: impl FnOnce(&mut LimitsConfig)) -> LimitsConfig {
        let mut limits = LimitsConfig::default();
        f(&mut limits);
        limits
    }

    #[test]
    fn test_under_cap_is_noop() {
        let mut entries = vec![3, 1, 2];
        let dropped = limit_entries(&mut entries, 3, no_priority, |v: &i32| *v);
        assert_eq!(dropped, 0);
        assert_eq!(entries, vec![3, 1, 2], "order is untouched below the cap");
    }

    #[test]
    fn test_score_ordering() {
        let mut entries = vec![1, 2, 3];
        let dropped = limit_entries(&mut entries, 2, no_priority, |v: &i32| *v);
        assert_eq!(dropped, 1);
        assert_eq!(entries, vec![3, 2]);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let mut entries = vec![("a", 5), ("b", 9), ("c", 5), ("d", 5)];
        limit_entries(&mut entries, 3, no_priority, |e: &(&str, i32)| e.1);
        assert_eq!(entries, vec![("b", 9), ("a", 5), ("c", 5)]);
    }

    #[test]
    fn test_priority_first_then_scores() {
        let mut entries = vec![(1, false), (50, true), (9, false), (7, false), (2, true)];
        let dropped = limit_entries(&mut entries, 3, |e: &(i32, bool)| e.1, |e| e.0);
        assert_eq!(dropped, 2);
        assert_eq!(entries, vec![(50, true), (2, true), (9, false)]);
    }

    #[test]
    fn test_excess_priority_truncates_in_original_order() {
        let mut entries = vec![(1, true), (100, false), (2, true), (3, true)];
        limit_entries(&mut entries, 2, |e: &(i32, bool)| e.1, |e| e.0);
        assert_eq!(entries, vec![(1, true), (2, true)]);
    }

    #[test]
    fn test_containers_priority_retention() {
        let mut metrics = Metrics {
            containers: vec![
                container("c1", 900, &[]),
                container("c2", 10, &[3]),
                container("c3", 800, &[]),
                container("c4", 700, &[]),
                container("c5", 20, &[5]),
                container("c6", 600, &[]),
            ],
            ..Default::default()
        };
        let limiter = Limiter::new(limits_with(|l| l.containers = 1));

        let report = limiter.apply(&mut metrics);

        assert_eq!(metrics.containers.len(), 1);
        assert!(!metrics.containers[0].reporting_group_ids.is_empty());
        assert_eq!(metrics.containers[0].id, "c2");
        assert_eq!(report.dropped(LimitCategory::Containers), 5);
    }

    #[test]
    fn test_top_files_keep_largest() {
        let mut metrics = Metrics {
            top_files: vec![file("/a", 1), file("/b", 2), file("/c", 3)],
            ..Default::default()
        };
        let limiter = Limiter::new(limits_with(|l| l.top_files_per_host = 2));

        limiter.apply(&mut metrics);

        let names: Vec<&str> = metrics.top_files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["/c", "/b"]);
    }

    #[test]
    fn test_login_shell_commands_kept() {
        let command = |ts, distance| CommandDetails {
            timestamp: ts,
            login_shell_distance: distance,
            ..Default::default()
        };
        let mut metrics = Metrics {
            commands: vec![
                command(10, Some(0)),
                command(30, Some(2)),
                command(20, None),
                command(40, Some(1)),
            ],
            ..Default::default()
        };
        let limiter = Limiter::new(limits_with(|l| l.commands = 2));

        limiter.apply(&mut metrics);

        let stamps: Vec<u64> = metrics.commands.iter().map(|c| c.timestamp).collect();
        assert_eq!(stamps, vec![10, 40]);
    }

    #[test]
    fn test_nested_proto_tables_limited() {
        let url = |name: &str, calls: u64| UrlDetails {
            url: name.to_string(),
            counters: Some(CounterProtoEntry {
                aggr_ncalls: agg(calls),
                ..Default::default()
            }),
        };
        let mut c = container("web", 1, &[]);
        c.protos = Some(Proto {
            http: Some(HttpInfo {
                server_urls: vec![url("/a", 5), url("/b", 50), url("/c", 20)],
                ..Default::default()
            }),
            ..Default::default()
        });
        let mut metrics = Metrics {
            containers: vec![c],
            ..Default::default()
        };
        let limiter = Limiter::new(limits_with(|l| l.http_urls = 1));

        let report = limiter.apply(&mut metrics);

        let urls = &metrics.containers[0]
            .protos
            .as_ref()
            .and_then(|p| p.http.as_ref())
            .expect("http info")
            .server_urls;
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].url, "/b");
        assert_eq!(report.dropped(LimitCategory::HttpUrls), 2);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_app_checks_limited() {
        let check = |name: &str, value| AppCheck {
            name: name.to_string(),
            value: Some(value),
            ..Default::default()
        };
        let mut c = container("db", 1, &[]);
        c.app = Some(AppInfo {
            checks: vec![check("ping", 0), check("disk", 2), check("replica", 1)],
            ..Default::default()
        });
        let mut metrics = Metrics {
            containers: vec![c],
            ..Default::default()
        };
        let limiter = Limiter::new(limits_with(|l| l.app_metrics = 2));

        let report = limiter.apply(&mut metrics);

        let names: Vec<&str> = metrics.containers[0]
            .app
            .as_ref()
            .expect("app info")
            .checks
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["disk", "replica"]);
        assert_eq!(report.dropped(LimitCategory::AppMetrics), 1);
    }

    #[test]
    fn test_report_iter_order() {
        let mut report = LimitReport::default();
        report.record(LimitCategory::Events, 2);
        report.record(LimitCategory::Containers, 1);
        report.record(LimitCategory::Programs, 0);

        let seen: Vec<_> = report.iter().collect();
        assert_eq!(
            seen,
            vec![(LimitCategory::Containers, 1), (LimitCategory::Events, 2)]
        );
        assert!(!report.is_empty());
    }

    #[test]
    fn test_category_names_unique() {
        let mut names: Vec<&str> = LimitCategory::ALL.iter().map(|c| c.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LimitCategory::ALL.len());
    }
}
