//! Queue worker feeding delivery batches to the pipeline controller.
//!
//! # Architecture
//!
//! ```text
//! QueueWorker
//!     │
//!     ├─► BatchSource::next_batch (pull up to batch_size, wait poll_wait)
//!     ├─► PipelineController::handle_batch
//!     │       └─► error: log, leave un-acked deliveries for redelivery
//!     └─► on shutdown: drain detached cache writes
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pipeline::{MessageBatch, PipelineController};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::kernel::nats::BatchSource;

/// Configuration for the queue worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum number of deliveries per batch
    pub batch_size: usize,
    /// How long a pull waits for the first delivery
    pub poll_wait: Duration,
    /// Pause after a failed pull
    pub error_backoff: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_wait: Duration::from_secs(5),
            error_backoff: Duration::from_secs(1),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl WorkerConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

pub struct QueueWorker<S: BatchSource> {
    source: Arc<S>,
    controller: Arc<PipelineController>,
    config: WorkerConfig,
}

impl<S: BatchSource> QueueWorker<S> {
    pub fn new(source: Arc<S>, controller: Arc<PipelineController>, config: WorkerConfig) -> Self {
        Self {
            source,
            controller,
            config,
        }
    }

    /// Pull and process one batch. Returns how many deliveries it held.
    pub async fn poll_once(&self) -> Result<usize> {
        let messages = self.pull().await?;
        let count = messages.len();
        self.process(messages).await;
        Ok(count)
    }

    async fn pull(&self) -> Result<Vec<S::Delivery>> {
        self.source
            .next_batch(self.config.batch_size, self.config.poll_wait)
            .await
    }

    async fn process(&self, messages: Vec<S::Delivery>) {
        if messages.is_empty() {
            return;
        }

        debug!(count = messages.len(), "pulled batch");
        let batch = MessageBatch::new(self.source.queue_name(), messages);
        match self.controller.handle_batch(batch).await {
            Ok(report) => debug!(report = ?report, "batch done"),
            Err(e) => error!(error = %format!("{:#}", e), "batch failed, remaining deliveries left for redelivery"),
        }
    }

    /// Poll until `shutdown` fires, then wait for detached cache writes.
    ///
    /// Shutdown interrupts a pull but never a batch in progress, so leased
    /// browser sessions are always released.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            queue = %self.source.queue_name(),
            "queue worker starting"
        );

        loop {
            let pulled = tokio::select! {
                _ = shutdown.cancelled() => break,
                pulled = self.pull() => pulled,
            };

            match pulled {
                Ok(messages) => self.process(messages).await,
                Err(e) => {
                    error!(error = %e, "failed to pull batch");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
            }
        }

        info!("waiting for background cache writes");
        self.controller.flush_background_writes().await;
        info!(worker_id = %self.config.worker_id, "queue worker stopped");
        Ok(())
    }
}
