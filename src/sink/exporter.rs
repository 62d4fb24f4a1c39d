use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::{OutputConfig, OutputFormat};
use crate::schema::Metrics;

/// Exporter dispatches rolled-up snapshots to their destination.
///
/// Enum dispatch keeps `export` a plain async fn.
pub enum Exporter {
    JsonLines(JsonLinesExporter),
    Discard,
}

impl Exporter {
    /// Builds the exporter selected by the `output` config section.
    pub fn from_config(cfg: &OutputConfig) -> Self {
        match cfg.format {
            OutputFormat::JsonLines => {
                Self::JsonLines(JsonLinesExporter::new(&cfg.path, cfg.pretty))
            }
            OutputFormat::Discard => Self::Discard,
        }
    }

    /// Returns the exporter name for logging.
    pub fn name(&self) -> &str {
        match self {
            Self::JsonLines(_) => "json_lines",
            Self::Discard => "discard",
        }
    }

    /// Opens the destination.
    pub async fn start(&mut self) -> Result<()> {
        match self {
            Self::JsonLines(e) => e.start().await,
            Self::Discard => Ok(()),
        }
    }

    /// Writes one rolled-up snapshot.
    pub async fn export(&mut self, metrics: &Metrics) -> Result<()> {
        match self {
            Self::JsonLines(e) => e.export(metrics).await,
            Self::Discard => Ok(()),
        }
    }

    /// Flushes and closes the destination.
    pub async fn stop(&mut self) -> Result<()> {
        match self {
            Self::JsonLines(e) => e.stop().await,
            Self::Discard => Ok(()),
        }
    }
}

/// Writes each snapshot as JSON to a file or stdout.
///
/// Compact mode emits one snapshot per line; pretty mode emits indented
/// documents separated by a newline.
pub struct JsonLinesExporter {
    path: String,
    pretty: bool,
    writer: Option<Box<dyn AsyncWrite + Unpin + Send + Sync>>,
}

impl JsonLinesExporter {
    pub fn new(path: &str, pretty: bool) -> Self {
        Self {
            path: path.to_string(),
            pretty,
            writer: None,
        }
    }

    async fn start(&mut self) -> Result<()> {
        let writer: Box<dyn AsyncWrite + Unpin + Send + Sync> = if self.path == "-" {
            Box::new(tokio::io::stdout())
        } else {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .with_context(|| format!("opening output file {}", self.path))?;
            Box::new(file)
        };

        self.writer = Some(writer);

        Ok(())
    }

    async fn export(&mut self, metrics: &Metrics) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("json_lines exporter used before start")?;

        let mut line = if self.pretty {
            serde_json::to_vec_pretty(metrics)
        } else {
            serde_json::to_vec(metrics)
        }
        .context("encoding rolled-up snapshot")?;
        line.push(b'\n');

        writer
            .write_all(&line)
            .await
            .with_context(|| format!("writing to {}", self.path))?;
        writer
            .flush()
            .await
            .with_context(|| format!("flushing {}", self.path))?;

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .shutdown()
                .await
                .with_context(|| format!("closing {}", self.path))?;
        }

        Ok(())
    }
}
