//! JSON-lines snapshot input.

use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::export::health::HealthMetrics;
use crate::schema::Metrics;

/// Errors decoding one raw snapshot line.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("line {line}: empty snapshot")]
    Empty { line: u64 },

    #[error("line {line}: malformed snapshot: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    /// Short label for the rejection counter.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "empty",
            Self::Malformed { .. } => "malformed",
        }
    }
}

/// Decodes one JSON-lines snapshot. `line` is 1-based and only used in errors.
pub fn decode_line(line: u64, text: &str) -> Result<Metrics, SnapshotError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SnapshotError::Empty { line });
    }

    serde_json::from_str(text).map_err(|source| SnapshotError::Malformed { line, source })
}

/// Counts from one pass over the input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    pub received: u64,
    pub rejected: u64,
}

/// Reads raw snapshots from a file or stdin and forwards them to the sink.
pub struct SnapshotSource {
    path: String,
    health: Arc<HealthMetrics>,
}

impl SnapshotSource {
    /// `path` of "-" reads stdin.
    pub fn new(path: &str, health: Arc<HealthMetrics>) -> Self {
        Self {
            path: path.to_string(),
            health,
        }
    }

    /// Reads the configured input until EOF or cancellation.
    pub async fn run(
        &self,
        tx: mpsc::Sender<Metrics>,
        ctx: CancellationToken,
    ) -> Result<SourceStats> {
        if self.path == "-" {
            let reader = BufReader::new(tokio::io::stdin());
            return self.read_from(reader, tx, ctx).await;
        }

        let file = tokio::fs::File::open(&self.path)
            .await
            .with_context(|| format!("opening input file {}", self.path))?;

        self.read_from(BufReader::new(file), tx, ctx).await
    }

    /// Forwards every decodable line of `reader`; bad lines are counted and
    /// skipped.
    pub async fn read_from<R>(
        &self,
        reader: R,
        tx: mpsc::Sender<Metrics>,
        ctx: CancellationToken,
    ) -> Result<SourceStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut stats = SourceStats::default();
        let mut line_no = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                next = lines.next_line() => next
                    .with_context(|| format!("reading {} at line {}", self.path, line_no + 1))?,
            };
            let Some(text) = next else { break };
            line_no += 1;

            let snapshot = match decode_line(line_no, &text) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    stats.rejected += 1;
                    self.health
                        .snapshots_rejected
                        .with_label_values(&[e.reason()])
                        .inc();
                    warn!(input = %self.path, error = %e, "skipping snapshot");
                    continue;
                }
            };

            stats.received += 1;
            self.health.snapshots_received.inc();

            tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                sent = tx.send(snapshot) => {
                    if sent.is_err() {
                        debug!("snapshot channel closed");
                        break;
                    }
                }
            }
        }

        info!(
            input = %self.path,
            received = stats.received,
            rejected = stats.rejected,
            "snapshot input finished"
        );

        Ok(stats)
    }
}
