//! AI service traits. Models are opaque text-in/text-out services.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::ChatMessage;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run a non-streaming chat completion. `None` means the model produced
    /// no response text.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Option<String>>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a single sentence. `None` means the model returned no
    /// translation.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Option<String>>;
}
