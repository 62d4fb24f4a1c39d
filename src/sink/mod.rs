pub mod exporter;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::aggregator::{LimitReport, MergeStats, MessageAggregator};
use crate::export::health::HealthMetrics;
use crate::schema::Metrics;

use exporter::Exporter;

/// Sink consumes raw snapshots and exports rolled-up ones.
pub trait Sink: Send {
    /// Returns the sink's name for logging.
    fn name(&self) -> &str;

    /// Initialize the sink.
    fn start(
        &mut self,
        ctx: CancellationToken,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Shut down the sink.
    fn stop(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Queue a single raw snapshot without waiting.
    fn handle_snapshot(&self, snapshot: Metrics);
}

/// One reporting period's worth of rolled-up data.
#[derive(Debug)]
pub struct Flushed {
    pub metrics: Metrics,
    pub report: LimitReport,
    /// Raw snapshots merged into `metrics`.
    pub snapshots: u64,
}

/// The engine plus the output snapshot it is currently filling.
#[derive(Debug)]
pub struct Rollup {
    aggregator: MessageAggregator,
    output: Metrics,
}

impl Rollup {
    pub fn new(aggregator: MessageAggregator) -> Self {
        Self {
            aggregator,
            output: Metrics::default(),
        }
    }

    /// Merges one raw snapshot into the current reporting period.
    pub fn absorb(&mut self, snapshot: Metrics) -> MergeStats {
        self.aggregator.aggregate(snapshot, &mut self.output)
    }

    /// Raw snapshots merged since the last flush.
    pub fn pending(&self) -> u64 {
        self.aggregator.stats().snapshots_aggregated
    }

    pub fn output(&self) -> &Metrics {
        &self.output
    }

    pub fn aggregator(&self) -> &MessageAggregator {
        &self.aggregator
    }

    /// Closes the reporting period.
    ///
    /// Applies the limits, hands the output over and starts a fresh one with
    /// a reset engine. Returns `None` when nothing was merged.
    pub fn flush(&mut self) -> Option<Flushed> {
        let snapshots = self.pending();
        if snapshots == 0 {
            return None;
        }

        let report = self.aggregator.limit(&mut self.output);
        let metrics = std::mem::take(&mut self.output);
        self.aggregator.reset();

        Some(Flushed {
            metrics,
            report,
            snapshots,
        })
    }
}

/// Rolls raw snapshots up and exports one limited snapshot per period.
pub struct RollupSink {
    interval: Duration,
    rollup: Option<Rollup>,
    exporter: Option<Exporter>,
    health: Arc<HealthMetrics>,

    /// Snapshot channel sender, cloned by producers.
    snapshot_tx: mpsc::Sender<Metrics>,
    /// Snapshot channel receiver, taken by `start`.
    snapshot_rx: Option<mpsc::Receiver<Metrics>>,

    /// Handle for the sink run task.
    run_task: Option<tokio::task::JoinHandle<()>>,
}

impl RollupSink {
    /// Creates a sink flushing every `interval`.
    pub fn new(
        interval: Duration,
        channel_capacity: usize,
        aggregator: MessageAggregator,
        exporter: Exporter,
        health: Arc<HealthMetrics>,
    ) -> Self {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(channel_capacity.max(1));

        Self {
            interval,
            rollup: Some(Rollup::new(aggregator)),
            exporter: Some(exporter),
            health,
            snapshot_tx,
            snapshot_rx: Some(snapshot_rx),
            run_task: None,
        }
    }

    /// Returns a sender that waits for channel space instead of dropping.
    pub fn sender(&self) -> mpsc::Sender<Metrics> {
        self.snapshot_tx.clone()
    }
}

impl Sink for RollupSink {
    fn name(&self) -> &str {
        "rollup"
    }

    async fn start(&mut self, ctx: CancellationToken) -> Result<()> {
        let mut snapshot_rx = self
            .snapshot_rx
            .take()
            .context("rollup sink started more than once")?;
        let mut rollup = self
            .rollup
            .take()
            .context("rollup sink started more than once")?;
        let mut exporter = self
            .exporter
            .take()
            .context("rollup sink started more than once")?;

        exporter
            .start()
            .await
            .with_context(|| format!("starting {} exporter", exporter.name()))?;
        info!(exporter = exporter.name(), "exporter started");

        let health = Arc::clone(&self.health);
        let interval = self.interval;

        let run_task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    received = snapshot_rx.recv() => {
                        let Some(snapshot) = received else { break };
                        absorb(&mut rollup, snapshot, &health);
                        health.snapshot_channel_length.set(snapshot_rx.len() as f64);
                    }
                    _ = ticker.tick() => {
                        flush(&mut rollup, &mut exporter, &health, "period").await;
                    }
                }
            }

            // Take whatever producers queued before shutdown.
            snapshot_rx.close();
            while let Ok(snapshot) = snapshot_rx.try_recv() {
                absorb(&mut rollup, snapshot, &health);
            }
            health.snapshot_channel_length.set(0.0);

            flush(&mut rollup, &mut exporter, &health, "final").await;

            if let Err(e) = exporter.stop().await {
                error!(exporter = exporter.name(), error = %e, "exporter stop failed");
            }

            info!("rollup sink stopped");
        });
        self.run_task = Some(run_task);

        info!(interval = ?self.interval, "rollup sink started");

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        // Final flush happens in the run task once its token is cancelled.
        if let Some(run_task) = self.run_task.take() {
            run_task.await.context("joining rollup sink task")?;
        }
        Ok(())
    }

    fn handle_snapshot(&self, snapshot: Metrics) {
        if self.snapshot_tx.try_send(snapshot).is_err() {
            warn!("rollup sink snapshot channel full, dropping snapshot");
        }
    }
}

fn absorb(rollup: &mut Rollup, snapshot: Metrics, health: &HealthMetrics) {
    let delta = rollup.absorb(snapshot);
    health.observe_merge(&delta, rollup.aggregator().pid_map().len());
    debug!(
        merged = delta.records_merged,
        appended = delta.records_appended,
        pending = rollup.pending(),
        "snapshot aggregated"
    );
}

async fn flush(rollup: &mut Rollup, exporter: &mut Exporter, health: &HealthMetrics, kind: &str) {
    let timer = health.flush_duration.start_timer();

    let Some(flushed) = rollup.flush() else {
        timer.stop_and_discard();
        debug!(kind, "nothing to flush");
        return;
    };

    health.observe_limits(&flushed.report);

    match exporter.export(&flushed.metrics).await {
        Ok(()) => {
            health.flushes.inc();
            info!(
                kind,
                snapshots = flushed.snapshots,
                programs = flushed.metrics.programs.len(),
                containers = flushed.metrics.containers.len(),
                connections = flushed.metrics.ipv4_connections.len(),
                dropped = flushed.report.total(),
                "flushed rolled-up snapshot"
            );
        }
        Err(e) => {
            health.export_errors.inc();
            error!(exporter = exporter.name(), kind, error = %e, "export failed");
        }
    }

    timer.observe_duration();
}
