//! Staged Content Pipeline
//!
//! Crawls source pages, extracts their visible text, summarizes and translates
//! it with AI services, and caches the final text keyed by source URL.
//!
//! # Design Philosophy
//!
//! - Stages hand work to each other through an at-least-once queue
//! - The cache is the idempotency gate: a URL with a cached result is never reworked
//! - Soft failures end a traversal quietly; a lost session race re-queues the
//!   item with a delay
//! - Any other error leaves the batch to the queue's redelivery
//!
//! # Usage
//!
//! ```rust,ignore
//! use pipeline::{MessageBatch, PipelineConfig, PipelineController, PipelineDeps};
//! use pipeline::stores::MemoryKvStore;
//! use pipeline::testing::{MockAI, MockFleet, RecordingQueue};
//!
//! let ai = Arc::new(MockAI::new());
//! let controller = PipelineController::new(
//!     PipelineConfig::default(),
//!     PipelineDeps {
//!         cache: Arc::new(MemoryKvStore::new()),
//!         queue: Arc::new(RecordingQueue::new()),
//!         fleet: Arc::new(MockFleet::new()),
//!         text_generator: ai.clone(),
//!         translator: ai,
//!     },
//! );
//!
//! let report = controller.handle_batch(batch).await?;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Work items, sessions and chat messages
//! - [`traits`] - Boundaries to the queue, key-value stores, browser fleet and AI
//! - [`session_pool`] - Filter-then-claim acquisition of browser sessions
//! - [`stages`] - Fetch, summarize and translate handlers
//! - [`controller`] - Batch consumption, cache gate and action routing
//! - [`seeder`] - Listing crawl and fetch seeding
//! - [`stores`] - In-memory store implementations
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod controller;
pub mod error;
pub mod seeder;
pub mod session_pool;
pub mod stages;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use config::PipelineConfig;
pub use controller::{BatchReport, MessageBatch, PipelineController, PipelineDeps};
pub use error::{SessionError, SessionResult};
pub use seeder::{CrawlSeeder, ListingConfig};
pub use session_pool::{Lease, LeaseOrigin, SessionPool, SESSION_RETRY_DELAY};
pub use stages::{AbandonReason, FetchStage, StageOutcome, SummarizeStage, TranslateStage};
pub use traits::{
    ai::{TextGenerator, Translator},
    browser::{Browser, BrowserFleet, Page},
    queue::{Delivery, StageQueue},
    store::KvStore,
};
pub use types::{Action, ChatMessage, LaunchOptions, Session, WorkItem};
