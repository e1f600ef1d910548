//! Workers AI request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope
// =============================================================================

/// Response envelope shared by every `ai/run` call.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

/// Error or informational message reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

// =============================================================================
// Text generation
// =============================================================================

/// Chat-style input for text generation models.
#[derive(Debug, Clone, Serialize)]
pub struct TextGenerationRequest {
    pub messages: Vec<Message>,
}

impl TextGenerationRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system" or "user"
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextGenerationOutput {
    #[serde(default)]
    pub response: Option<String>,
}

// =============================================================================
// Translation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslationOutput {
    #[serde(default)]
    pub translated_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_generation_request_body() {
        let body = serde_json::to_value(TextGenerationRequest::new(vec![
            Message::system("summarize provided document"),
            Message::user("text"),
        ]))
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "messages": [
                    {"role": "system", "content": "summarize provided document"},
                    {"role": "user", "content": "text"}
                ]
            })
        );
    }

    #[test]
    fn test_envelope_tolerates_null_result() {
        let envelope: Envelope<TranslationOutput> =
            serde_json::from_str(r#"{"result":null,"success":true,"errors":[],"messages":[]}"#)
                .unwrap();
        assert!(envelope.success);
        assert!(envelope.result.is_none());
    }

    #[test]
    fn test_translation_output_without_text() {
        let envelope: Envelope<TranslationOutput> =
            serde_json::from_str(r#"{"result":{},"success":true}"#).unwrap();
        assert!(envelope.result.unwrap().translated_text.is_none());
    }
}
