//! Per-pipeline broadcast hub for live datapoint streaming.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::api::PipelineId;

/// Buffered datapoints per subscriber before lagging ones drop messages.
const STREAM_BUFFER: usize = 64;

/// Fan-out point between the writer pool and stream subscribers.
///
/// Channels are created lazily per pipeline; publishing to a pipeline
/// nobody listens to is a no-op.
#[derive(Clone, Default)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<PipelineId, broadcast::Sender<String>>>>,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the datapoints applied to one pipeline.
    pub fn subscribe(&self, id: &PipelineId) -> broadcast::Receiver<String> {
        let mut channels = self.channels.write();
        channels
            .entry(id.clone())
            .or_insert_with(|| broadcast::channel(STREAM_BUFFER).0)
            .subscribe()
    }

    /// Publish an applied datapoint value to the pipeline's subscribers.
    ///
    /// # Returns
    /// The number of subscribers that received the value.
    pub fn publish(&self, id: &PipelineId, value: &str) -> usize {
        let channels = self.channels.read();
        match channels.get(id) {
            Some(tx) => tx.send(value.to_string()).unwrap_or(0),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_only_matching_subscribers() {
        let hub = StreamHub::new();
        let orders = PipelineId::new("orders");
        let clicks = PipelineId::new("clicks");

        let mut rx = hub.subscribe(&orders);
        assert_eq!(hub.publish(&orders, "v1"), 1);
        assert_eq!(hub.publish(&clicks, "ignored"), 0);
        assert_eq!(rx.recv().await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let hub = StreamHub::new();
        assert_eq!(hub.publish(&PipelineId::new("orders"), "v1"), 0);
    }
}
