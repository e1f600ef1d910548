//! Pure Cloudflare Workers AI REST client
//!
//! A minimal client for the `accounts/{id}/ai/run/{model}` endpoint with no
//! pipeline-specific logic. Covers text generation and translation models.
//!
//! # Example
//!
//! ```rust,ignore
//! use ai_client::{Message, TextGenerationRequest, TranslationRequest, WorkersAiClient};
//!
//! let client = WorkersAiClient::new(account_id, api_token);
//!
//! let summary = client
//!     .run_text_generation(
//!         "@cf/meta/llama-3.2-3b-instruct",
//!         &TextGenerationRequest::new(vec![
//!             Message::system("summarize provided document"),
//!             Message::user(document),
//!         ]),
//!     )
//!     .await?;
//!
//! let korean = client
//!     .run_translation("@cf/meta/m2m100-1.2b", &TranslationRequest::new("Hello", "en", "ko"))
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{Result, WorkersAiError};
pub use types::*;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Pure Workers AI API client.
#[derive(Clone)]
pub struct WorkersAiClient {
    http_client: Client,
    account_id: String,
    api_token: String,
    base_url: String,
}

impl WorkersAiClient {
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            account_id: account_id.into(),
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (for gateways, proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn run_url(&self, model: &str) -> String {
        format!("{}/accounts/{}/ai/run/{}", self.base_url, self.account_id, model)
    }

    /// Run any model and decode its `result` payload.
    ///
    /// Returns `Ok(None)` when the call succeeded but the envelope carried no
    /// result.
    pub async fn run<I, O>(&self, model: &str, input: &I) -> Result<Option<O>>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(self.run_url(model))
            .bearer_auth(&self.api_token)
            .json(input)
            .send()
            .await
            .map_err(|e| {
                warn!(model = %model, error = %e, "Workers AI request failed");
                WorkersAiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(model = %model, status = %status, error = %error_text, "Workers AI API error");
            return Err(WorkersAiError::Api(format!(
                "Workers AI returned {}: {}",
                status, error_text
            )));
        }

        let envelope: Envelope<O> = response
            .json()
            .await
            .map_err(|e| WorkersAiError::Parse(e.to_string()))?;

        if !envelope.success {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(WorkersAiError::Api(format!(
                "Workers AI reported failure: {}",
                messages.join("; ")
            )));
        }

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Workers AI run"
        );

        Ok(envelope.result)
    }

    /// Run a text generation model. `None` when the model produced no response.
    pub async fn run_text_generation(
        &self,
        model: &str,
        request: &TextGenerationRequest,
    ) -> Result<Option<String>> {
        let output: Option<TextGenerationOutput> = self.run(model, request).await?;
        Ok(output.and_then(|o| o.response))
    }

    /// Run a translation model. `None` when the model produced no text.
    pub async fn run_translation(
        &self,
        model: &str,
        request: &TranslationRequest,
    ) -> Result<Option<String>> {
        let output: Option<TranslationOutput> = self.run(model, request).await?;
        Ok(output.and_then(|o| o.translated_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_url_keeps_model_path() {
        let client = WorkersAiClient::new("acct", "token").with_base_url("http://localhost:9000/");
        assert_eq!(
            client.run_url("@cf/meta/m2m100-1.2b"),
            "http://localhost:9000/accounts/acct/ai/run/@cf/meta/m2m100-1.2b"
        );
    }

    #[test]
    fn test_default_base_url() {
        let client = WorkersAiClient::new("acct", "token");
        assert_eq!(client.base_url(), "https://api.cloudflare.com/client/v4");
        assert_eq!(client.account_id(), "acct");
    }
}
