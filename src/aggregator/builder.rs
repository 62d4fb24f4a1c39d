use crate::config::{AggregatorConfig, LimitsConfig};

use super::{Limiter, MergeStats, MessageAggregator, PidMap};

/// Assembles a [`MessageAggregator`] from limits and feature toggles.
#[derive(Debug, Clone)]
pub struct AggregatorBuilder {
    limits: LimitsConfig,
    connections_enabled: bool,
    commands_enabled: bool,
    events_enabled: bool,
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self {
            limits: LimitsConfig::default(),
            connections_enabled: true,
            commands_enabled: true,
            events_enabled: true,
        }
    }
}

impl AggregatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from the `aggregator` config section.
    pub fn from_config(cfg: &AggregatorConfig) -> Self {
        Self {
            limits: cfg.limits.clone(),
            connections_enabled: cfg.connections_enabled,
            commands_enabled: cfg.commands_enabled,
            events_enabled: cfg.events_enabled,
        }
    }

    pub fn limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn connections_enabled(mut self, enabled: bool) -> Self {
        self.connections_enabled = enabled;
        self
    }

    pub fn commands_enabled(mut self, enabled: bool) -> Self {
        self.commands_enabled = enabled;
        self
    }

    pub fn events_enabled(mut self, enabled: bool) -> Self {
        self.events_enabled = enabled;
        self
    }

    pub fn build(self) -> MessageAggregator {
        MessageAggregator {
            limiter: Limiter::new(self.limits),
            connections_enabled: self.connections_enabled,
            commands_enabled: self.commands_enabled,
            events_enabled: self.events_enabled,
            pid_map: PidMap::new(),
            stats: MergeStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let cfg: AggregatorConfig = serde_yaml::from_str(
            r#"
limits:
  containers: 3
commands_enabled: false
"#,
        )
        .expect("aggregator config should parse");

        let aggregator = AggregatorBuilder::from_config(&cfg).build();

        assert_eq!(aggregator.limits().containers, 3);
        assert_eq!(
            aggregator.limits().programs,
            LimitsConfig::default().programs
        );
        assert!(aggregator.connections_enabled);
        assert!(!aggregator.commands_enabled);
        assert!(aggregator.events_enabled);
    }

    #[test]
    fn test_defaults_enable_everything() {
        let aggregator = AggregatorBuilder::new().build();
        assert!(aggregator.connections_enabled);
        assert!(aggregator.commands_enabled);
        assert!(aggregator.events_enabled);
        assert!(aggregator.pid_map().is_empty());
    }
}
