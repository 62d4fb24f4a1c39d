use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::aggregator::LimitCategory;

/// Top-level configuration for the metrics-rollup agent.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Logging verbosity (debug, info, warn, error). Default: "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Aggregation engine configuration.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Reporting period configuration.
    #[serde(default)]
    pub flush: FlushConfig,

    /// Raw snapshot source configuration.
    #[serde(default)]
    pub input: InputConfig,

    /// Rolled-up snapshot output configuration.
    #[serde(default)]
    pub output: OutputConfig,

    /// Prometheus health metrics server configuration.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Aggregation engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Per-category cardinality caps.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Merge IPv4 connection tables. Default: true.
    #[serde(default = "default_true")]
    pub connections_enabled: bool,

    /// Merge executed commands. Default: true.
    #[serde(default = "default_true")]
    pub commands_enabled: bool,

    /// Merge agent events. Default: true.
    #[serde(default = "default_true")]
    pub events_enabled: bool,
}

/// Maximum entries kept per bounded collection after each flush.
///
/// Protocol caps apply separately to every table they bound (server and
/// client side, every program and container).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub top_files_per_host: usize,
    pub top_devices_per_host: usize,
    pub top_files_per_container: usize,
    pub top_devices_per_container: usize,
    pub top_files_per_program: usize,
    pub top_devices_per_program: usize,
    pub sql_queries: usize,
    pub mongodb_collections: usize,
    pub http_urls: usize,
    pub http_status_codes: usize,
    pub server_ports_per_host: usize,
    pub server_ports_per_container: usize,
    pub connections: usize,
    pub containers: usize,
    pub programs: usize,
    pub events: usize,
    pub commands: usize,
    pub statsd_metrics: usize,
    pub app_metrics: usize,
}

/// Reporting period configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FlushConfig {
    /// Reporting period length. Default: 10s.
    #[serde(default = "default_flush_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Raw snapshots buffered between the source and the aggregator.
    /// Default: 64.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Raw snapshot source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// JSON-lines file of raw snapshots, "-" for stdin. Default: "-".
    #[serde(default = "default_stdio_path")]
    pub path: String,
}

/// Rolled-up snapshot output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output encoding. Default: json_lines.
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file, "-" for stdout. Default: "-".
    #[serde(default = "default_stdio_path")]
    pub path: String,

    /// Pretty-print each snapshot instead of one line per snapshot.
    #[serde(default)]
    pub pretty: bool,
}

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    JsonLines,
    /// Drop every snapshot (dry runs and benchmarks).
    Discard,
}

/// Prometheus health metrics server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Serve /metrics and /healthz. Default: true.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Listen address. Default: ":9090".
    #[serde(default = "default_health_addr")]
    pub addr: String,
}

// --- Default value functions ---

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_channel_capacity() -> usize {
    64
}

fn default_stdio_path() -> String {
    "-".to_string()
}

fn default_health_addr() -> String {
    ":9090".to_string()
}

// --- Default trait impls ---

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            aggregator: AggregatorConfig::default(),
            flush: FlushConfig::default(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            limits: LimitsConfig::default(),
            connections_enabled: true,
            commands_enabled: true,
            events_enabled: true,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            top_files_per_host: 10,
            top_devices_per_host: 10,
            top_files_per_container: 5,
            top_devices_per_container: 5,
            top_files_per_program: 5,
            top_devices_per_program: 5,
            sql_queries: 50,
            mongodb_collections: 50,
            http_urls: 50,
            http_status_codes: 20,
            server_ports_per_host: 50,
            server_ports_per_container: 20,
            connections: 500,
            containers: 200,
            programs: 300,
            events: 100,
            commands: 500,
            statsd_metrics: 1000,
            app_metrics: 500,
        }
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval: default_flush_interval(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_stdio_path(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: default_stdio_path(),
            pretty: false,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: default_health_addr(),
        }
    }
}

// --- Validation and loading ---

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate the configuration for required fields and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.flush.interval.is_zero() {
            bail!("flush.interval must be positive");
        }

        if self.flush.channel_capacity == 0 {
            bail!("flush.channel_capacity must be positive");
        }

        if self.input.path.is_empty() {
            bail!("input.path is required");
        }

        if self.output.format == OutputFormat::JsonLines && self.output.path.is_empty() {
            bail!("output.path is required for json_lines output");
        }

        if self.health.enabled && self.health.addr.is_empty() {
            bail!("health.addr is required when health is enabled");
        }

        for category in LimitCategory::ALL {
            if category.cap(&self.aggregator.limits) == 0 {
                bail!(
                    "aggregator.limits.{} must be positive",
                    category.as_str()
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.flush.interval, Duration::from_secs(10));
        assert_eq!(cfg.flush.channel_capacity, 64);
        assert_eq!(cfg.input.path, "-");
        assert_eq!(cfg.output.format, OutputFormat::JsonLines);
        assert_eq!(cfg.health.addr, ":9090");
        assert!(cfg.aggregator.connections_enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let cfg: Config = serde_yaml::from_str(
            r#"
log_level: debug
aggregator:
  events_enabled: false
  limits:
    containers: 25
    http_urls: 8
flush:
  interval: 30s
input:
  path: /var/run/snapshots.jsonl
output:
  format: discard
health:
  enabled: false
"#,
        )
        .expect("config should parse");

        assert_eq!(cfg.log_level, "debug");
        assert!(!cfg.aggregator.events_enabled);
        assert!(cfg.aggregator.commands_enabled);
        assert_eq!(cfg.aggregator.limits.containers, 25);
        assert_eq!(cfg.aggregator.limits.http_urls, 8);
        assert_eq!(
            cfg.aggregator.limits.programs,
            LimitsConfig::default().programs
        );
        assert_eq!(cfg.flush.interval, Duration::from_secs(30));
        assert_eq!(cfg.output.format, OutputFormat::Discard);
        assert!(!cfg.health.enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut cfg = Config::default();
        cfg.flush.interval = Duration::ZERO;
        let err = cfg.validate().expect_err("zero interval must be rejected");
        assert!(err.to_string().contains("flush.interval"));
    }

    #[test]
    fn test_validate_zero_channel_capacity() {
        let mut cfg = Config::default();
        cfg.flush.channel_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut cfg = Config::default();
        cfg.aggregator.limits.mongodb_collections = 0;
        let err = cfg.validate().expect_err("zero cap must be rejected");
        assert!(err.to_string().contains("mongodb_collections"));
    }

    #[test]
    fn test_validate_empty_paths() {
        let mut cfg = Config::default();
        cfg.input.path.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.output.path.clear();
        assert!(cfg.validate().is_err());

        cfg.output.format = OutputFormat::Discard;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        std::io::Write::write_all(&mut file, b"flush:\n  interval: 2s\n").expect("write config");

        let cfg = Config::load(file.path()).expect("config should load");
        assert_eq!(cfg.flush.interval, Duration::from_secs(2));
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        std::io::Write::write_all(&mut file, b"flush:\n  channel_capacity: 0\n")
            .expect("write config");

        assert!(Config::load(file.path()).is_err());
    }
}
