//! NATS JetStream queue for pipeline work items.
//!
//! Work items are published to one subject captured by one stream. A durable
//! pull consumer hands them out in batches with explicit acknowledgement, so
//! anything not acked is redelivered after the ack wait.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_nats::jetstream::{self, consumer::pull, stream, AckKind};
use async_trait::async_trait;
use futures::StreamExt;
use pipeline::{Delivery, StageQueue, WorkItem};
use tracing::{debug, warn};

/// How long an un-acked delivery stays invisible before redelivery.
const ACK_WAIT: Duration = Duration::from_secs(300);

/// Source of delivery batches for the queue worker.
#[async_trait]
pub trait BatchSource: Send + Sync {
    type Delivery: Delivery + 'static;

    /// Name batches from this source are tagged with.
    fn queue_name(&self) -> &str;

    /// Up to `max_messages` deliveries, waiting at most `wait` for the first.
    async fn next_batch(&self, max_messages: usize, wait: Duration) -> Result<Vec<Self::Delivery>>;
}

pub struct JetStreamQueue {
    context: jetstream::Context,
    subject: String,
    consumer: jetstream::consumer::Consumer<pull::Config>,
}

impl JetStreamQueue {
    /// Ensure the stream and durable consumer exist and bind to them.
    ///
    /// `queue` is both the subject and the durable consumer name.
    pub async fn connect(client: async_nats::Client, stream_name: &str, queue: &str) -> Result<Self> {
        let context = jetstream::new(client);

        let stream = context
            .get_or_create_stream(stream::Config {
                name: stream_name.to_string(),
                subjects: vec![queue.to_string()],
                ..Default::default()
            })
            .await
            .with_context(|| format!("failed to create stream {}", stream_name))?;

        let consumer = stream
            .get_or_create_consumer(
                queue,
                pull::Config {
                    durable_name: Some(queue.to_string()),
                    ack_wait: ACK_WAIT,
                    ..Default::default()
                },
            )
            .await
            .with_context(|| format!("failed to create consumer {}", queue))?;

        debug!(stream = %stream_name, subject = %queue, "jetstream queue bound");
        Ok(Self {
            context,
            subject: queue.to_string(),
            consumer,
        })
    }
}

#[async_trait]
impl StageQueue for JetStreamQueue {
    async fn send(&self, item: &WorkItem) -> Result<()> {
        let payload = item.to_vec().context("failed to encode work item")?;
        self.context
            .publish(self.subject.clone(), payload.into())
            .await
            .context("failed to publish work item")?
            .await
            .context("work item publish was not acknowledged")?;
        Ok(())
    }
}

#[async_trait]
impl BatchSource for JetStreamQueue {
    type Delivery = JetStreamDelivery;

    fn queue_name(&self) -> &str {
        &self.subject
    }

    async fn next_batch(&self, max_messages: usize, wait: Duration) -> Result<Vec<JetStreamDelivery>> {
        let mut batch = self
            .consumer
            .fetch()
            .max_messages(max_messages)
            .expires(wait)
            .messages()
            .await
            .context("failed to fetch batch")?;

        let mut deliveries = Vec::with_capacity(max_messages);
        while let Some(message) = batch.next().await {
            match message {
                Ok(message) => deliveries.push(JetStreamDelivery { message }),
                Err(e) => warn!(error = %e, "skipping broken delivery"),
            }
        }
        Ok(deliveries)
    }
}

/// A JetStream message awaiting its ack decision.
pub struct JetStreamDelivery {
    message: jetstream::Message,
}

#[async_trait]
impl Delivery for JetStreamDelivery {
    fn body(&self) -> &[u8] {
        &self.message.message.payload
    }

    async fn ack(&self) -> Result<()> {
        self.message
            .ack()
            .await
            .map_err(|e| anyhow!("failed to ack message: {}", e))
    }

    async fn retry(&self, delay: Duration) -> Result<()> {
        self.message
            .ack_with(AckKind::Nak(Some(delay)))
            .await
            .map_err(|e| anyhow!("failed to nak message: {}", e))
    }
}
