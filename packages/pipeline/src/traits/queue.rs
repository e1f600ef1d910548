//! Queue traits: the producer side used by stages and the delivery handle
//! the consumer infrastructure hands to the controller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::WorkItem;

/// Producer side of the stage queue.
#[async_trait]
pub trait StageQueue: Send + Sync {
    /// Enqueue a work item for the next stage.
    async fn send(&self, item: &WorkItem) -> Result<()>;
}

/// A single delivered message.
///
/// Delivery is at-least-once: a message that is neither acked nor retried is
/// redelivered by the infrastructure.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Raw message body (JSON-encoded [`WorkItem`]).
    fn body(&self) -> &[u8];

    /// Acknowledge successful handling.
    async fn ack(&self) -> Result<()>;

    /// Ask for redelivery after `delay`.
    async fn retry(&self, delay: Duration) -> Result<()>;
}

#[async_trait]
impl<T: Delivery + ?Sized> Delivery for Arc<T> {
    fn body(&self) -> &[u8] {
        (**self).body()
    }

    async fn ack(&self) -> Result<()> {
        (**self).ack().await
    }

    async fn retry(&self, delay: Duration) -> Result<()> {
        (**self).retry(delay).await
    }
}
