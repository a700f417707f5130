//! Datapoint writer pool.
//!
//! Pushes are accepted onto a bounded channel and applied by a pool of
//! worker tasks, decoupling HTTP intake from storage latency. Applied
//! datapoints are published to the [`StreamHub`] for live subscribers.

use log::error;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::api::PipelineId;
use crate::db::{services as db_services, FullRepository};
use crate::services::stream::StreamHub;

/// Default number of writer workers, matching the original server.
pub const DEFAULT_WRITERS: usize = 100;

/// Capacity of the ingest channel; pushes beyond it apply backpressure.
const CHANNEL_CAPACITY: usize = 1024;

/// One queued datapoint.
#[derive(Debug, Clone)]
pub struct Datapoint {
    pub pipeline_id: PipelineId,
    pub value: String,
}

/// The ingest channel has shut down; the datapoint was not accepted.
#[derive(Debug, thiserror::Error)]
#[error("ingest channel closed")]
pub struct IngestClosed;

/// Sending half of the ingest channel, cloned into every handler.
#[derive(Clone)]
pub struct DatapointWriter {
    tx: mpsc::Sender<Datapoint>,
}

/// Handles of the spawned workers.
pub struct WriterPool {
    workers: Vec<JoinHandle<()>>,
}

impl DatapointWriter {
    /// Spawn `writers` workers draining the ingest channel into `repo`.
    pub fn spawn(
        repo: Arc<dyn FullRepository>,
        hub: StreamHub,
        writers: usize,
    ) -> (Self, WriterPool) {
        let (tx, rx) = mpsc::channel::<Datapoint>(CHANNEL_CAPACITY);
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..writers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                let repo = Arc::clone(&repo);
                let hub = hub.clone();
                tokio::spawn(async move {
                    loop {
                        // Hold the lock only while waiting for the next
                        // datapoint, not while applying it.
                        let datapoint = { rx.lock().await.recv().await };
                        let Some(datapoint) = datapoint else { break };

                        match db_services::push_datapoint(
                            repo.as_ref(),
                            &datapoint.pipeline_id,
                            &datapoint.value,
                        )
                        .await
                        {
                            Ok(_) => {
                                hub.publish(&datapoint.pipeline_id, &datapoint.value);
                            }
                            Err(e) => {
                                error!(
                                    "failed writing datapoint to pipeline {}: {}",
                                    datapoint.pipeline_id, e
                                );
                            }
                        }
                    }
                })
            })
            .collect();

        (Self { tx }, WriterPool { workers })
    }

    /// Queue a datapoint for application.
    pub async fn enqueue(&self, datapoint: Datapoint) -> Result<(), IngestClosed> {
        self.tx.send(datapoint).await.map_err(|_| IngestClosed)
    }
}

impl WriterPool {
    /// Wait for the workers to drain the channel and exit.
    ///
    /// Returns once every [`DatapointWriter`] clone has been dropped and
    /// the queue is empty.
    pub async fn join(self) {
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}
