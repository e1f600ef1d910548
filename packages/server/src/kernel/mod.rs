//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod browser_fleet;
pub mod deps;
pub mod kv_store;
pub mod nats;
pub mod worker;

pub use ai::{WorkersAiTextGenerator, WorkersAiTranslator};
pub use browser_fleet::{FleetError, HttpBrowserFleet};
pub use deps::{listing_config, pipeline_config, Backends, ServerDeps};
pub use kv_store::{PostgresKvStore, LISTING_NAMESPACE, SUMMARY_NAMESPACE};
pub use nats::{BatchSource, JetStreamDelivery, JetStreamQueue};
pub use worker::{QueueWorker, WorkerConfig};
