use crate::aggregator::field::{
    fold_counter, fold_double, replace_list_if_nonempty, replace_opt, replace_value,
};
use crate::aggregator::key::{merge_repeated, merge_singleton};
use crate::aggregator::{Aggregate, MergeStats};
use crate::schema::protocols::{
    AppCheck, AppInfo, AppMetric, CounterProtoEntry, HttpInfo, MongodbCollectionDetails,
    MongodbInfo, MongodbOpTypeDetails, Percentile, Proto, SqlEntryDetails, SqlInfo,
    SqlQueryTypeDetails, StatsdInfo, StatsdMetric, StatusCodeDetails, UrlDetails,
};

impl Aggregate for Proto {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_singleton(&mut self.http, input.http, stats);
        merge_singleton(&mut self.mysql, input.mysql, stats);
        merge_singleton(&mut self.postgres, input.postgres, stats);
        merge_singleton(&mut self.mongodb, input.mongodb, stats);
    }
}

impl Aggregate for CounterProtoEntry {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        fold_counter(&mut self.aggr_ncalls, input.ncalls);
        fold_counter(&mut self.aggr_time_tot, input.time_tot);
        fold_counter(&mut self.aggr_time_max, input.time_max);
        fold_counter(&mut self.aggr_bytes_in, input.bytes_in);
        fold_counter(&mut self.aggr_bytes_out, input.bytes_out);
        fold_counter(&mut self.aggr_nerrors, input.nerrors);
        merge_repeated(&mut self.percentiles, input.percentiles, stats);
    }
}

impl Aggregate for Percentile {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.percentile, input.percentile);
        fold_counter(&mut self.aggr_value, input.value);
    }
}

impl Aggregate for HttpInfo {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_repeated(&mut self.server_urls, input.server_urls, stats);
        merge_repeated(&mut self.client_urls, input.client_urls, stats);
        merge_repeated(
            &mut self.server_status_codes,
            input.server_status_codes,
            stats,
        );
        merge_repeated(
            &mut self.client_status_codes,
            input.client_status_codes,
            stats,
        );
        merge_singleton(&mut self.server_totals, input.server_totals, stats);
        merge_singleton(&mut self.client_totals, input.client_totals, stats);
    }
}

impl Aggregate for UrlDetails {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.url, input.url);
        merge_singleton(&mut self.counters, input.counters, stats);
    }
}

impl Aggregate for StatusCodeDetails {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.status_code, input.status_code);
        fold_counter(&mut self.aggr_ncalls, input.ncalls);
    }
}

impl Aggregate for SqlInfo {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_repeated(&mut self.server_queries, input.server_queries, stats);
        merge_repeated(&mut self.client_queries, input.client_queries, stats);
        merge_repeated(&mut self.server_tables, input.server_tables, stats);
        merge_repeated(&mut self.client_tables, input.client_tables, stats);
        merge_repeated(
            &mut self.server_query_types,
            input.server_query_types,
            stats,
        );
        merge_repeated(
            &mut self.client_query_types,
            input.client_query_types,
            stats,
        );
        merge_singleton(&mut self.server_totals, input.server_totals, stats);
        merge_singleton(&mut self.client_totals, input.client_totals, stats);
    }
}

impl Aggregate for SqlEntryDetails {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.name, input.name);
        merge_singleton(&mut self.counters, input.counters, stats);
    }
}

impl Aggregate for SqlQueryTypeDetails {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.query_type, input.query_type);
        merge_singleton(&mut self.counters, input.counters, stats);
    }
}

impl Aggregate for MongodbInfo {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_repeated(&mut self.servers_ops, input.servers_ops, stats);
        merge_repeated(&mut self.clients_ops, input.clients_ops, stats);
        merge_repeated(
            &mut self.servers_collections,
            input.servers_collections,
            stats,
        );
        merge_repeated(
            &mut self.clients_collections,
            input.clients_collections,
            stats,
        );
        merge_singleton(&mut self.server_totals, input.server_totals, stats);
        merge_singleton(&mut self.client_totals, input.client_totals, stats);
    }
}

impl Aggregate for MongodbOpTypeDetails {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.op, input.op);
        merge_singleton(&mut self.counters, input.counters, stats);
    }
}

impl Aggregate for MongodbCollectionDetails {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.name, input.name);
        merge_singleton(&mut self.counters, input.counters, stats);
    }
}

impl Aggregate for StatsdInfo {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        merge_repeated(&mut self.statsd_metrics, input.statsd_metrics, stats);
    }
}

impl Aggregate for StatsdMetric {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.name, input.name);
        replace_list_if_nonempty(&mut self.tags, input.tags);
        replace_value(&mut self.metric_type, input.metric_type);
        fold_double(&mut self.aggr_value, input.value);
        fold_counter(&mut self.aggr_count, input.count);
    }
}

impl Aggregate for AppInfo {
    fn aggregate(&mut self, input: Self, stats: &mut MergeStats) {
        replace_value(&mut self.process_name, input.process_name);
        merge_repeated(&mut self.metrics, input.metrics, stats);
        merge_repeated(&mut self.checks, input.checks, stats);
    }
}

impl Aggregate for AppMetric {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.name, input.name);
        replace_list_if_nonempty(&mut self.tags, input.tags);
        replace_value(&mut self.metric_type, input.metric_type);
        fold_double(&mut self.aggr_value, input.value);
    }
}

impl Aggregate for AppCheck {
    fn aggregate(&mut self, input: Self, _stats: &mut MergeStats) {
        replace_value(&mut self.name, input.name);
        replace_list_if_nonempty(&mut self.tags, input.tags);
        replace_opt(&mut self.value, input.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::counters::KeyValue;

    fn url(url: &str, ncalls: u64, p95: u64) -> UrlDetails {
        UrlDetails {
            url: url.to_string(),
            counters: Some(CounterProtoEntry {
                ncalls: Some(ncalls),
                percentiles: vec![Percentile {
                    percentile: 95,
                    value: Some(p95),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_http_urls_merge_by_url() {
        let mut out = Proto::default();
        let mut stats = MergeStats::default();

        for sample in [
            vec![url("/api/users", 10, 40), url("/health", 1, 2)],
            vec![url("/api/users", 5, 60)],
        ] {
            out.aggregate(
                Proto {
                    http: Some(HttpInfo {
                        server_urls: sample,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                &mut stats,
            );
        }

        let http = out.http.expect("http info");
        assert_eq!(http.server_urls.len(), 2);
        let users = http.server_urls[0]
            .counters
            .as_ref()
            .expect("url counters");
        assert_eq!(users.ncalls_sum(), 15);
        assert_eq!(users.percentiles.len(), 1);
        let p95 = users.percentiles[0].aggr_value.expect("p95");
        assert_eq!((p95.min, p95.max), (40, 60));
    }

    #[test]
    fn test_statsd_metrics_keyed_by_name_and_tags() {
        let metric = |env: &str, value: f64| StatsdMetric {
            name: "queue.depth".to_string(),
            tags: vec![KeyValue::new("env", env)],
            value: Some(value),
            ..Default::default()
        };

        let mut out = StatsdInfo::default();
        let mut stats = MergeStats::default();
        out.aggregate(
            StatsdInfo {
                statsd_metrics: vec![metric("prod", 3.0), metric("staging", 1.0)],
            },
            &mut stats,
        );
        out.aggregate(
            StatsdInfo {
                statsd_metrics: vec![metric("prod", 5.0)],
            },
            &mut stats,
        );

        assert_eq!(out.statsd_metrics.len(), 2);
        let prod = out.statsd_metrics[0].aggr_value.expect("prod value");
        assert_eq!(prod.sum, 8.0);
        assert_eq!(prod.weight, 2);
    }

    #[test]
    fn test_app_check_takes_latest_status() {
        let mut out = AppInfo::default();
        let mut stats = MergeStats::default();
        let check = |value| AppCheck {
            name: "redis.can_connect".to_string(),
            value,
            ..Default::default()
        };

        out.aggregate(
            AppInfo {
                process_name: "redis-server".to_string(),
                checks: vec![check(Some(0))],
                ..Default::default()
            },
            &mut stats,
        );
        out.aggregate(
            AppInfo {
                checks: vec![check(Some(2)), check(None)],
                ..Default::default()
            },
            &mut stats,
        );

        assert_eq!(out.process_name, "redis-server");
        assert_eq!(out.checks.len(), 1);
        assert_eq!(out.checks[0].value, Some(2));
    }
}
