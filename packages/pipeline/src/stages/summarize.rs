use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::{AbandonReason, StageOutcome};
use crate::traits::ai::TextGenerator;
use crate::types::{ChatMessage, WorkItem};

pub struct SummarizeStage {
    ai: Arc<dyn TextGenerator>,
    instruction: String,
}

impl SummarizeStage {
    pub fn new(ai: Arc<dyn TextGenerator>, instruction: impl Into<String>) -> Self {
        Self {
            ai,
            instruction: instruction.into(),
        }
    }

    pub async fn run(&self, item: &WorkItem) -> Result<StageOutcome> {
        info!(url = %item.url, "summarize start");
        if item.text.is_empty() {
            return Ok(StageOutcome::Abandoned(AbandonReason::EmptyInput));
        }

        let messages = [
            ChatMessage::system(&self.instruction),
            ChatMessage::user(&item.text),
        ];
        let response = self
            .ai
            .generate(&messages)
            .await
            .context("summarization request failed")?;

        match response {
            Some(summary) if !summary.is_empty() => {
                info!(url = %item.url, summary_len = summary.len(), "summarize done");
                Ok(StageOutcome::Emitted(WorkItem::translate(&item.url, summary)))
            }
            _ => {
                info!(url = %item.url, "summarize fail: {}", AbandonReason::EmptyResponse);
                Ok(StageOutcome::Abandoned(AbandonReason::EmptyResponse))
            }
        }
    }
}
