//! Workers AI adapters for the pipeline's AI seams.

use std::sync::Arc;

use ai_client::{Message, TextGenerationRequest, TranslationRequest, WorkersAiClient};
use anyhow::Result;
use async_trait::async_trait;
use pipeline::{ChatMessage, TextGenerator, Translator};

// =============================================================================
// Text generation
// =============================================================================

/// Runs summarization prompts on a Workers AI text generation model.
pub struct WorkersAiTextGenerator {
    client: Arc<WorkersAiClient>,
    model: String,
}

impl WorkersAiTextGenerator {
    pub fn new(client: Arc<WorkersAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for WorkersAiTextGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        let messages = messages
            .iter()
            .map(|m| Message {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();
        let response = self
            .client
            .run_text_generation(&self.model, &TextGenerationRequest::new(messages))
            .await?;
        Ok(response)
    }
}

// =============================================================================
// Translation
// =============================================================================

/// Translates single sentences on a Workers AI translation model.
pub struct WorkersAiTranslator {
    client: Arc<WorkersAiClient>,
    model: String,
}

impl WorkersAiTranslator {
    pub fn new(client: Arc<WorkersAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Translator for WorkersAiTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Option<String>> {
        let translated = self
            .client
            .run_translation(
                &self.model,
                &TranslationRequest::new(text, source_lang, target_lang),
            )
            .await?;
        Ok(translated)
    }
}
