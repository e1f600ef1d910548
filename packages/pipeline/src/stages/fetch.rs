use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{AbandonReason, StageOutcome};
use crate::session_pool::{Lease, SessionPool};
use crate::types::WorkItem;

/// Loads a URL in a pooled browser and emits its visible text for
/// summarization.
pub struct FetchStage {
    pool: SessionPool,
    retry_delay: Duration,
}

impl FetchStage {
    pub fn new(pool: SessionPool, retry_delay: Duration) -> Self {
        Self { pool, retry_delay }
    }

    pub async fn run(&self, item: &WorkItem) -> Result<StageOutcome> {
        info!(url = %item.url, "fetch start");

        let lease = match self.pool.acquire().await {
            Ok(lease) => lease,
            Err(e) if e.is_retryable() => {
                warn!(url = %item.url, error = %e, delay_secs = self.retry_delay.as_secs(), "session claim lost, retrying later");
                return Ok(StageOutcome::Retry {
                    delay: self.retry_delay,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let extracted = extract_text(&lease, &item.url).await;

        // The session goes back to the pool even when navigation failed.
        let session_id = lease.session_id().to_string();
        if let Err(e) = lease.release().await {
            warn!(session_id = %session_id, error = %e, "failed to release browser session");
        }

        let text = extracted?;
        if text.is_empty() {
            info!(url = %item.url, "fetch fail: {}", AbandonReason::EmptyExtraction);
            return Ok(StageOutcome::Abandoned(AbandonReason::EmptyExtraction));
        }

        info!(url = %item.url, text_len = text.len(), "fetch done");
        Ok(StageOutcome::Emitted(WorkItem::summarize(&item.url, text)))
    }
}

async fn extract_text(lease: &Lease, url: &str) -> Result<String> {
    let page = lease.new_page().await.context("failed to open page")?;

    let text = async {
        page.goto(url)
            .await
            .with_context(|| format!("navigation to {} failed", url))?;
        page.extract_text().await.context("text extraction failed")
    }
    .await;

    if let Err(e) = page.close().await {
        warn!(url = %url, error = %e, "failed to close page");
    }
    text
}
