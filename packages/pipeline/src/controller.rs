//! Pipeline controller: consumes queue batches and routes work items to
//! stages.
//!
//! # Architecture
//!
//! ```text
//! MessageBatch (designated queue only)
//!     │
//!     └─► for each delivery, in order
//!             ├─► decode WorkItem          (undecodable → ack, drop)
//!             ├─► cache gate on url        (hit → ack, skip)
//!             ├─► match action
//!             │       ├─ Fetch     ─► FetchStage
//!             │       ├─ Summarize ─► SummarizeStage
//!             │       ├─ Translate ─► TranslateStage
//!             │       └─ Unknown   ─► ack, no-op
//!             └─► apply StageOutcome
//!                     ├─ Emitted   ─► queue.send(next), ack
//!                     ├─ Completed ─► ack
//!                     ├─ Abandoned ─► ack
//!                     └─ Retry     ─► delivery.retry(delay)
//! ```
//!
//! A stage error stops the batch and is returned. Deliveries not yet acked are
//! redelivered by the queue infrastructure, so every stage must tolerate being
//! run again for the same URL.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::session_pool::SessionPool;
use crate::stages::{FetchStage, StageOutcome, SummarizeStage, TranslateStage};
use crate::traits::ai::{TextGenerator, Translator};
use crate::traits::browser::BrowserFleet;
use crate::traits::queue::{Delivery, StageQueue};
use crate::traits::store::KvStore;
use crate::types::{Action, WorkItem};

/// A batch of deliveries from one named queue.
pub struct MessageBatch<D> {
    pub queue: String,
    pub messages: Vec<D>,
}

impl<D> MessageBatch<D> {
    pub fn new(queue: impl Into<String>, messages: Vec<D>) -> Self {
        Self {
            queue: queue.into(),
            messages,
        }
    }
}

/// Per-batch counters, mostly for logging.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Items handed to a stage
    pub processed: usize,
    /// Items skipped by the cache gate
    pub skipped: usize,
    /// Undecodable bodies and unknown actions
    pub ignored: usize,
    pub emitted: usize,
    pub abandoned: usize,
    pub retried: usize,
}

/// External services the controller and its stages need.
#[derive(Clone)]
pub struct PipelineDeps {
    /// Summary cache keyed by source URL
    pub cache: Arc<dyn KvStore>,
    pub queue: Arc<dyn StageQueue>,
    pub fleet: Arc<dyn BrowserFleet>,
    pub text_generator: Arc<dyn TextGenerator>,
    pub translator: Arc<dyn Translator>,
}

pub struct PipelineController {
    config: PipelineConfig,
    cache: Arc<dyn KvStore>,
    queue: Arc<dyn StageQueue>,
    fetch: FetchStage,
    summarize: SummarizeStage,
    translate: TranslateStage,
}

impl PipelineController {
    pub fn new(config: PipelineConfig, deps: PipelineDeps) -> Self {
        let pool = SessionPool::new(deps.fleet, config.browser_keep_alive);
        let fetch = FetchStage::new(pool, config.session_retry_delay);
        let summarize = SummarizeStage::new(deps.text_generator, config.summary_instruction.clone());
        let translate = TranslateStage::new(
            deps.translator,
            deps.cache.clone(),
            config.source_lang.clone(),
            config.target_lang.clone(),
            config.translate_concurrency,
        );

        Self {
            config,
            cache: deps.cache,
            queue: deps.queue,
            fetch,
            summarize,
            translate,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a batch in delivery order.
    ///
    /// Batches from any queue other than the configured one are ignored.
    pub async fn handle_batch<D: Delivery>(&self, batch: MessageBatch<D>) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        if batch.queue != self.config.queue_name {
            debug!(queue = %batch.queue, expected = %self.config.queue_name, "ignoring batch from foreign queue");
            return Ok(report);
        }

        for message in &batch.messages {
            self.handle_message(message, &mut report).await?;
        }

        debug!(report = ?report, "batch handled");
        Ok(report)
    }

    async fn handle_message<D: Delivery>(&self, message: &D, report: &mut BatchReport) -> Result<()> {
        let item = match WorkItem::from_slice(message.body()) {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "dropping undecodable message");
                report.ignored += 1;
                return message.ack().await;
            }
        };

        if self.is_cached(&item.url).await? {
            info!(url = %item.url, action = %item.action, "cache hit, skip");
            report.skipped += 1;
            return message.ack().await;
        }

        let Some(outcome) = self
            .dispatch(&item)
            .await
            .with_context(|| format!("{} stage failed for {}", item.action, item.url))?
        else {
            debug!(url = %item.url, "ignoring item with unknown action");
            report.ignored += 1;
            return message.ack().await;
        };
        report.processed += 1;

        match outcome {
            StageOutcome::Emitted(next) => {
                self.queue
                    .send(&next)
                    .await
                    .with_context(|| format!("failed to enqueue {} for {}", next.action, next.url))?;
                report.emitted += 1;
                message.ack().await
            }
            StageOutcome::Completed => message.ack().await,
            StageOutcome::Abandoned(reason) => {
                info!(url = %item.url, action = %item.action, reason = %reason, "traversal abandoned");
                report.abandoned += 1;
                message.ack().await
            }
            StageOutcome::Retry { delay } => {
                report.retried += 1;
                message.retry(delay).await
            }
        }
    }

    /// Run the stage an item's action names. `None` for unknown actions.
    ///
    /// Does not consult the cache; [`handle_batch`](Self::handle_batch) gates
    /// before dispatching.
    pub async fn dispatch(&self, item: &WorkItem) -> Result<Option<StageOutcome>> {
        let outcome = match item.action {
            Action::Fetch => self.fetch.run(item).await?,
            Action::Summarize => self.summarize.run(item).await?,
            Action::Translate => self.translate.run(item).await?,
            Action::Unknown => return Ok(None),
        };
        Ok(Some(outcome))
    }

    async fn is_cached(&self, url: &str) -> Result<bool> {
        let entry = self
            .cache
            .get(url)
            .await
            .with_context(|| format!("cache lookup failed for {}", url))?;
        Ok(entry.is_some())
    }

    /// Wait for detached cache writes started so far.
    pub async fn flush_background_writes(&self) {
        let writes = self.translate.background_writes();
        writes.close();
        writes.wait().await;
        writes.reopen();
    }
}
