use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::{AbandonReason, StageOutcome};
use crate::traits::ai::Translator;
use crate::traits::store::KvStore;
use crate::types::WorkItem;

/// Terminal stage: translates a summary sentence by sentence and caches the
/// result under the source URL.
pub struct TranslateStage {
    ai: Arc<dyn Translator>,
    cache: Arc<dyn KvStore>,
    source_lang: String,
    target_lang: String,
    concurrency: usize,
    writes: TaskTracker,
}

impl TranslateStage {
    pub fn new(
        ai: Arc<dyn Translator>,
        cache: Arc<dyn KvStore>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            ai,
            cache,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            concurrency: concurrency.max(1),
            writes: TaskTracker::new(),
        }
    }

    /// Tracker for detached cache writes.
    pub fn background_writes(&self) -> &TaskTracker {
        &self.writes
    }

    pub async fn run(&self, item: &WorkItem) -> Result<StageOutcome> {
        info!(url = %item.url, "translate start");
        if item.text.is_empty() {
            return Ok(StageOutcome::Abandoned(AbandonReason::EmptyInput));
        }

        let translated = self.translate_document(&item.text).await?;
        if translated.is_empty() {
            info!(url = %item.url, "translate fail: {}", AbandonReason::EmptyResponse);
            return Ok(StageOutcome::Abandoned(AbandonReason::EmptyResponse));
        }

        self.spawn_cache_write(item.url.clone(), translated);
        info!(url = %item.url, "translate done");
        Ok(StageOutcome::Completed)
    }

    /// Translate every line of `text`, keeping the original line order no
    /// matter which call finishes first.
    pub async fn translate_document(&self, text: &str) -> Result<String> {
        // Owned lines: the fan-out future has to stay `Send`.
        let sentences: Vec<String> = text.split('\n').map(str::to_owned).collect();
        let count = sentences.len();
        let mut translated = vec![String::new(); count];

        let this = self;
        let mut results = stream::iter(sentences.into_iter().enumerate())
            .map(move |(index, sentence)| this.translate_sentence(index, sentence))
            .buffer_unordered(self.concurrency);

        while let Some(result) = results.next().await {
            let (index, sentence) = result?;
            translated[index] = sentence;
        }

        debug!(sentences = count, "translation fan-out joined");
        Ok(reassemble(&translated))
    }

    async fn translate_sentence(&self, index: usize, sentence: String) -> Result<(usize, String)> {
        if sentence.is_empty() {
            return Ok((index, "\n".to_string()));
        }

        let translation = self
            .ai
            .translate(&sentence, &self.source_lang, &self.target_lang)
            .await
            .with_context(|| format!("translation of sentence {} failed", index))?;

        Ok((index, translation.unwrap_or(sentence)))
    }

    /// Fire-and-forget write. The stage reports completion before the write
    /// lands and never observes its failure.
    fn spawn_cache_write(&self, url: String, value: String) {
        let cache = self.cache.clone();
        self.writes.spawn(async move {
            match cache.put(&url, &value).await {
                Ok(()) => debug!(url = %url, "cached translated summary"),
                Err(e) => warn!(url = %url, error = %e, "cache write failed"),
            }
        });
    }
}

/// Join translated sentences, each preceded by a newline.
fn reassemble(sentences: &[String]) -> String {
    sentences.iter().fold(String::new(), |mut out, sentence| {
        out.push('\n');
        out.push_str(sentence);
        out
    })
}
