//! Destinations for collected batches.
//!
//! A sink sees one filtered snapshot per collection interval. Failures are
//! reported to the scheduler, which logs them and moves on to the next tick.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use drainpipe_core::Datapoint;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink closed")]
    Closed,
    #[error("encode failed: {0}")]
    Encode(String),
}

#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, batch: Vec<Datapoint>) -> Result<(), SinkError>;
}

/// Writes each batch to the log: a summary at `info`, datapoints at `debug`.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl Sink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, batch: Vec<Datapoint>) -> Result<(), SinkError> {
        tracing::info!(datapoints = batch.len(), "flushed batch");
        if tracing::enabled!(tracing::Level::DEBUG) {
            for dp in &batch {
                let json = serde_json::to_string(dp).map_err(|e| SinkError::Encode(e.to_string()))?;
                tracing::debug!(datapoint = %json);
            }
        }
        Ok(())
    }
}

/// Hands batches to an external writer over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Vec<Datapoint>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Vec<Datapoint>>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end, with room for `capacity` pending batches.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Vec<Datapoint>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn send(&self, batch: Vec<Datapoint>) -> Result<(), SinkError> {
        self.tx.send(batch).await.map_err(|_| SinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainpipe_core::series::MetricKind;
    use drainpipe_core::Dimensions;

    fn batch() -> Vec<Datapoint> {
        vec![Datapoint {
            name: "heroku.load_avg_1m".into(),
            dimensions: Dimensions::new(),
            kind: MetricKind::Gauge,
            value: 0.5,
        }]
    }

    #[tokio::test]
    async fn channel_sink_delivers_batches_in_order() {
        let (sink, mut rx) = ChannelSink::channel(4);
        sink.send(batch()).await.unwrap();
        sink.send(Vec::new()).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), batch());
        assert!(rx.recv().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        assert!(matches!(sink.send(batch()).await, Err(SinkError::Closed)));
    }

    #[tokio::test]
    async fn log_sink_accepts_any_batch() {
        LogSink.send(batch()).await.unwrap();
    }
}
