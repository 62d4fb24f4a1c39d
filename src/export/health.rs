use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::aggregator::{LimitReport, MergeStats};

const NAMESPACE: &str = "metrics_rollup";

/// Prometheus metrics describing the rollup pipeline itself.
///
/// All metrics use the "metrics_rollup" namespace.
pub struct HealthMetrics {
    registry: Registry,
    addr: String,
    shutdown: parking_lot::Mutex<Option<CancellationToken>>,

    /// Raw snapshots read from the source.
    pub snapshots_received: Counter,
    /// Raw snapshots the source could not decode, by reason.
    pub snapshots_rejected: CounterVec,
    /// Raw snapshots merged into an output snapshot.
    pub snapshots_aggregated: Counter,
    /// Repeated entries folded into an existing key.
    pub records_merged: Counter,
    /// Repeated entries appended under a new key.
    pub records_appended: Counter,
    /// Entries removed by the limiter, by category.
    pub limiter_dropped: CounterVec,
    /// Reporting periods flushed.
    pub flushes: Counter,
    /// Failed exports of a rolled-up snapshot.
    pub export_errors: Counter,
    /// Pids mapped to program identities by the last merge.
    pub pid_map_size: Gauge,
    /// Raw snapshots waiting between source and aggregator.
    pub snapshot_channel_length: Gauge,
    /// Limit plus export time per flush (1ms-5s buckets).
    pub flush_duration: Histogram,
}

impl HealthMetrics {
    /// Creates a new health metrics instance with all metrics registered.
    pub fn new(addr: &str) -> Result<Self> {
        let registry = Registry::new();

        let snapshots_received = Counter::with_opts(
            Opts::new(
                "snapshots_received_total",
                "Total raw snapshots read from the source.",
            )
            .namespace(NAMESPACE),
        )?;
        let snapshots_rejected = CounterVec::new(
            Opts::new(
                "snapshots_rejected_total",
                "Total raw snapshots that failed to decode, by reason.",
            )
            .namespace(NAMESPACE),
            &["reason"],
        )?;
        let snapshots_aggregated = Counter::with_opts(
            Opts::new(
                "snapshots_aggregated_total",
                "Total raw snapshots merged into an output snapshot.",
            )
            .namespace(NAMESPACE),
        )?;
        let records_merged = Counter::with_opts(
            Opts::new(
                "records_merged_total",
                "Total repeated entries merged into an existing key.",
            )
            .namespace(NAMESPACE),
        )?;
        let records_appended = Counter::with_opts(
            Opts::new(
                "records_appended_total",
                "Total repeated entries appended under a new key.",
            )
            .namespace(NAMESPACE),
        )?;
        let limiter_dropped = CounterVec::new(
            Opts::new(
                "limiter_dropped_total",
                "Total entries removed by cardinality limits, by category.",
            )
            .namespace(NAMESPACE),
            &["category"],
        )?;
        let flushes = Counter::with_opts(
            Opts::new("flushes_total", "Total reporting periods flushed.").namespace(NAMESPACE),
        )?;
        let export_errors = Counter::with_opts(
            Opts::new(
                "export_errors_total",
                "Total failed exports of rolled-up snapshots.",
            )
            .namespace(NAMESPACE),
        )?;
        let pid_map_size = Gauge::with_opts(
            Opts::new(
                "pid_map_size",
                "Pids mapped to program identities by the last merge.",
            )
            .namespace(NAMESPACE),
        )?;
        let snapshot_channel_length = Gauge::with_opts(
            Opts::new(
                "snapshot_channel_length",
                "Raw snapshots queued between source and aggregator.",
            )
            .namespace(NAMESPACE),
        )?;
        let flush_duration = Histogram::with_opts(
            HistogramOpts::new(
                "flush_duration_seconds",
                "Time spent limiting and exporting one reporting period.",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(snapshots_received.clone()))?;
        registry.register(Box::new(snapshots_rejected.clone()))?;
        registry.register(Box::new(snapshots_aggregated.clone()))?;
        registry.register(Box::new(records_merged.clone()))?;
        registry.register(Box::new(records_appended.clone()))?;
        registry.register(Box::new(limiter_dropped.clone()))?;
        registry.register(Box::new(flushes.clone()))?;
        registry.register(Box::new(export_errors.clone()))?;
        registry.register(Box::new(pid_map_size.clone()))?;
        registry.register(Box::new(snapshot_channel_length.clone()))?;
        registry.register(Box::new(flush_duration.clone()))?;

        Ok(Self {
            registry,
            addr: addr.to_string(),
            shutdown: parking_lot::Mutex::new(None),
            snapshots_received,
            snapshots_rejected,
            snapshots_aggregated,
            records_merged,
            records_appended,
            limiter_dropped,
            flushes,
            export_errors,
            pid_map_size,
            snapshot_channel_length,
            flush_duration,
        })
    }

    /// Records the work done by one `aggregate` call.
    pub fn observe_merge(&self, delta: &MergeStats, pid_map_size: usize) {
        self.snapshots_aggregated
            .inc_by(delta.snapshots_aggregated as f64);
        self.records_merged.inc_by(delta.records_merged as f64);
        self.records_appended.inc_by(delta.records_appended as f64);
        self.pid_map_size.set(pid_map_size as f64);
    }

    /// Records the entries dropped by one limiting pass.
    pub fn observe_limits(&self, report: &LimitReport) {
        for (category, dropped) in report.iter() {
            self.limiter_dropped
                .with_label_values(&[category.as_str()])
                .inc_by(dropped as f64);
        }
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        encode(&self.registry)
    }

    /// Starts the HTTP server serving /metrics and /healthz.
    pub async fn start(&self) -> Result<()> {
        let addr = if self.addr.is_empty() {
            ":9090"
        } else {
            &self.addr
        };

        // ":port" binds every interface.
        let bind_addr = if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.to_string()
        };

        let app_state = Arc::new(AppState {
            registry: self.registry.clone(),
        });

        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/healthz", get(healthz_handler))
            .with_state(app_state);

        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("listening on {bind_addr}"))?;

        let local_addr = listener.local_addr().context("getting local address")?;

        let cancel = CancellationToken::new();
        *self.shutdown.lock() = Some(cancel.clone());

        tokio::spawn(async move {
            tracing::info!(addr = %local_addr, "health metrics server started");

            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await;

            if let Err(e) = result {
                tracing::error!(error = %e, "health metrics server error");
            }
        });

        Ok(())
    }

    /// Gracefully shuts down the health metrics server.
    pub async fn stop(&self) -> Result<()> {
        if let Some(cancel) = self.shutdown.lock().take() {
            cancel.cancel();
        }

        Ok(())
    }
}

/// Shared state for axum handlers.
struct AppState {
    registry: Registry,
}

fn encode(registry: &Registry) -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .context("encoding metrics")?;
    String::from_utf8(buffer).context("converting metrics to string")
}

/// GET /metrics - Prometheus text format.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match encode(&state.registry) {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            tracing::error!(error = %e, "rendering metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encoding error".to_string(),
            )
        }
    }
}

/// GET /healthz - Simple health check.
async fn healthz_handler() -> &'static str {
    "ok"
}
