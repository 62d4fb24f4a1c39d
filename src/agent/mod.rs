use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aggregator::AggregatorBuilder;
use crate::config::Config;
use crate::export::health::HealthMetrics;
use crate::sink::exporter::Exporter;
use crate::sink::{RollupSink, Sink};
use crate::source::SnapshotSource;

/// Agent wires the snapshot source, the rollup sink and the health server.
pub struct Agent {
    cfg: Config,
    health: Arc<HealthMetrics>,
    sink: Option<RollupSink>,
    source_task: Option<tokio::task::JoinHandle<()>>,
    /// Cancelled once the source reaches EOF or fails.
    input_done: CancellationToken,
    source_cancel: CancellationToken,
    sink_cancel: CancellationToken,
}

impl Agent {
    /// Creates a new Agent, initializing health metrics.
    pub fn new(cfg: Config) -> Result<Self> {
        let health =
            Arc::new(HealthMetrics::new(&cfg.health.addr).context("creating health metrics")?);

        Ok(Self {
            cfg,
            health,
            sink: None,
            source_task: None,
            input_done: CancellationToken::new(),
            source_cancel: CancellationToken::new(),
            sink_cancel: CancellationToken::new(),
        })
    }

    /// Shared health metrics.
    pub fn health(&self) -> &Arc<HealthMetrics> {
        &self.health
    }

    /// Token cancelled when the input has been fully read.
    pub fn input_done(&self) -> CancellationToken {
        self.input_done.clone()
    }

    /// Start all components and begin reading snapshots.
    pub async fn start(&mut self) -> Result<()> {
        // 1. Health server first so probes respond during start-up.
        if self.cfg.health.enabled {
            self.health
                .start()
                .await
                .context("starting health metrics server")?;
        }

        // 2. Rollup sink.
        let aggregator = AggregatorBuilder::from_config(&self.cfg.aggregator).build();
        let exporter = Exporter::from_config(&self.cfg.output);
        let exporter_name = exporter.name().to_string();

        let mut sink = RollupSink::new(
            self.cfg.flush.interval,
            self.cfg.flush.channel_capacity,
            aggregator,
            exporter,
            Arc::clone(&self.health),
        );
        sink.start(self.sink_cancel.clone())
            .await
            .context("starting rollup sink")?;

        info!(
            exporter = %exporter_name,
            output = %self.cfg.output.path,
            "rollup sink configured",
        );

        // 3. Snapshot source.
        let source = SnapshotSource::new(&self.cfg.input.path, Arc::clone(&self.health));
        let tx = sink.sender();
        let cancel = self.source_cancel.clone();
        let input_done = self.input_done.clone();

        self.source_task = Some(tokio::spawn(async move {
            if let Err(e) = source.run(tx, cancel).await {
                error!(error = %e, "snapshot source failed");
            }
            input_done.cancel();
        }));

        self.sink = Some(sink);

        info!(input = %self.cfg.input.path, "agent fully started");

        Ok(())
    }

    /// Gracefully stop all components.
    ///
    /// The source stops first so that everything it already read reaches
    /// the sink's final flush.
    pub async fn stop(&mut self) -> Result<()> {
        self.source_cancel.cancel();
        if let Some(task) = self.source_task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "snapshot source task join failed");
            }
        }

        self.sink_cancel.cancel();
        if let Some(sink) = &mut self.sink {
            if let Err(e) = sink.stop().await {
                error!(error = %e, "error stopping rollup sink");
            }
        }

        self.health.stop().await?;

        Ok(())
    }
}
