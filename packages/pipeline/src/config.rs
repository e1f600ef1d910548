use std::time::Duration;

/// Runtime knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Only batches from this queue are processed.
    pub queue_name: String,
    /// Idle keep-alive requested when launching a pooled browser.
    pub browser_keep_alive: Duration,
    /// Delay before a work item is redelivered after a session connect race.
    pub session_retry_delay: Duration,
    /// System instruction for the summarization model.
    pub summary_instruction: String,
    pub source_lang: String,
    pub target_lang: String,
    /// Maximum concurrent per-sentence translation calls.
    pub translate_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_name: "content-pipeline".to_string(),
            browser_keep_alive: Duration::from_millis(600_000),
            session_retry_delay: crate::session_pool::SESSION_RETRY_DELAY,
            summary_instruction: "summarize provided document".to_string(),
            source_lang: "en".to_string(),
            target_lang: "ko".to_string(),
            translate_concurrency: 8,
        }
    }
}

impl PipelineConfig {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            ..Default::default()
        }
    }

    pub fn with_languages(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_lang = source.into();
        self.target_lang = target.into();
        self
    }

    pub fn with_translate_concurrency(mut self, limit: usize) -> Self {
        // A zero cap would stall the translation fan-out forever.
        self.translate_concurrency = limit.max(1);
        self
    }

    pub fn with_browser_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.browser_keep_alive = keep_alive;
        self
    }

    pub fn with_session_retry_delay(mut self, delay: Duration) -> Self {
        self.session_retry_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.session_retry_delay, Duration::from_secs(10));
        assert_eq!(config.browser_keep_alive, Duration::from_secs(600));
        assert_eq!(config.source_lang, "en");
        assert_eq!(config.target_lang, "ko");
    }

    #[test]
    fn test_concurrency_is_never_zero() {
        let config = PipelineConfig::default().with_translate_concurrency(0);
        assert_eq!(config.translate_concurrency, 1);
    }
}
