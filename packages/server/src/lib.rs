// Staged Content Pipeline - server core
//
// HTTP control surface (listing crawl and fetch seeding) plus the queue worker
// that drives the fetch → summarize → translate pipeline.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
