use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: String,
    /// Queue (JetStream subject) carrying pipeline work items
    pub pipeline_queue: String,
    pub pipeline_stream: String,
    pub cloudflare_account_id: String,
    pub cloudflare_api_token: String,
    pub browser_fleet_url: String,
    pub browser_fleet_token: Option<String>,
    pub listing_base_url: String,
    pub listing_selector: String,
    pub summarize_model: String,
    pub translate_model: String,
    pub source_lang: String,
    pub target_lang: String,
    pub translate_concurrency: usize,
    pub worker_batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or("PORT", 8080).context("PORT must be a valid number")?,
            nats_url: env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            pipeline_queue: env::var("PIPELINE_QUEUE")
                .unwrap_or_else(|_| "content-pipeline".to_string()),
            pipeline_stream: env::var("PIPELINE_STREAM")
                .unwrap_or_else(|_| "CONTENT_PIPELINE".to_string()),
            cloudflare_account_id: env::var("CLOUDFLARE_ACCOUNT_ID")
                .context("CLOUDFLARE_ACCOUNT_ID must be set")?,
            cloudflare_api_token: env::var("CLOUDFLARE_API_TOKEN")
                .context("CLOUDFLARE_API_TOKEN must be set")?,
            browser_fleet_url: env::var("BROWSER_FLEET_URL")
                .context("BROWSER_FLEET_URL must be set")?,
            browser_fleet_token: env::var("BROWSER_FLEET_TOKEN").ok(),
            listing_base_url: env::var("LISTING_BASE_URL")
                .unwrap_or_else(|_| "https://blog.cloudflare.com/page/".to_string()),
            listing_selector: env::var("LISTING_SELECTOR")
                .unwrap_or_else(|_| "#main-body > astro-island > article > div > a".to_string()),
            summarize_model: env::var("SUMMARIZE_MODEL")
                .unwrap_or_else(|_| "@cf/meta/llama-3.2-3b-instruct".to_string()),
            translate_model: env::var("TRANSLATE_MODEL")
                .unwrap_or_else(|_| "@cf/meta/m2m100-1.2b".to_string()),
            source_lang: env::var("SOURCE_LANG").unwrap_or_else(|_| "en".to_string()),
            target_lang: env::var("TARGET_LANG").unwrap_or_else(|_| "ko".to_string()),
            translate_concurrency: parse_or("TRANSLATE_CONCURRENCY", 8)
                .context("TRANSLATE_CONCURRENCY must be a positive number")?,
            worker_batch_size: parse_or("WORKER_BATCH_SIZE", 10)
                .context("WORKER_BATCH_SIZE must be a positive number")?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
