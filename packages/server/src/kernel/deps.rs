//! Server dependencies (using traits for testability)
//!
//! The HTTP routes and the queue worker share one container. Every external
//! service sits behind a pipeline trait so tests can swap in the in-memory
//! store and the mocks from `pipeline::testing`.

use std::sync::Arc;

use ai_client::WorkersAiClient;
use pipeline::{
    BrowserFleet, CrawlSeeder, KvStore, ListingConfig, PipelineConfig, PipelineController,
    PipelineDeps, StageQueue, TextGenerator, Translator,
};
use sqlx::PgPool;

use crate::config::Config;
use crate::kernel::ai::{WorkersAiTextGenerator, WorkersAiTranslator};
use crate::kernel::browser_fleet::HttpBrowserFleet;
use crate::kernel::kv_store::{PostgresKvStore, LISTING_NAMESPACE, SUMMARY_NAMESPACE};

/// External services before they are wired into the pipeline.
#[derive(Clone)]
pub struct Backends {
    pub cache: Arc<dyn KvStore>,
    pub listing: Arc<dyn KvStore>,
    pub queue: Arc<dyn StageQueue>,
    pub fleet: Arc<dyn BrowserFleet>,
    pub text_generator: Arc<dyn TextGenerator>,
    pub translator: Arc<dyn Translator>,
}

impl Backends {
    /// Production backends: Postgres namespaces, HTTP browser fleet and
    /// Workers AI. The queue is supplied by the caller.
    pub fn production(config: &Config, pool: PgPool, queue: Arc<dyn StageQueue>) -> Self {
        let ai = Arc::new(WorkersAiClient::new(
            config.cloudflare_account_id.clone(),
            config.cloudflare_api_token.clone(),
        ));

        Self {
            cache: Arc::new(PostgresKvStore::new(pool.clone(), SUMMARY_NAMESPACE)),
            listing: Arc::new(PostgresKvStore::new(pool, LISTING_NAMESPACE)),
            queue,
            fleet: Arc::new(HttpBrowserFleet::new(
                config.browser_fleet_url.clone(),
                config.browser_fleet_token.clone(),
            )),
            text_generator: Arc::new(WorkersAiTextGenerator::new(
                ai.clone(),
                config.summarize_model.clone(),
            )),
            translator: Arc::new(WorkersAiTranslator::new(ai, config.translate_model.clone())),
        }
    }
}

/// Server dependencies accessible to routes and the worker
#[derive(Clone)]
pub struct ServerDeps {
    pub controller: Arc<PipelineController>,
    pub seeder: Arc<CrawlSeeder>,
    pub cache: Arc<dyn KvStore>,
}

impl ServerDeps {
    pub fn new(pipeline: PipelineConfig, listing: ListingConfig, backends: Backends) -> Self {
        let seeder = CrawlSeeder::new(
            backends.fleet.clone(),
            backends.listing,
            backends.queue.clone(),
            listing,
        );
        let controller = PipelineController::new(
            pipeline,
            PipelineDeps {
                cache: backends.cache.clone(),
                queue: backends.queue,
                fleet: backends.fleet,
                text_generator: backends.text_generator,
                translator: backends.translator,
            },
        );

        Self {
            controller: Arc::new(controller),
            seeder: Arc::new(seeder),
            cache: backends.cache,
        }
    }
}

/// Pipeline knobs taken from the server configuration.
pub fn pipeline_config(config: &Config) -> PipelineConfig {
    PipelineConfig::new(config.pipeline_queue.clone())
        .with_languages(config.source_lang.clone(), config.target_lang.clone())
        .with_translate_concurrency(config.translate_concurrency)
}

pub fn listing_config(config: &Config) -> ListingConfig {
    ListingConfig::new(config.listing_base_url.clone(), config.listing_selector.clone())
}
