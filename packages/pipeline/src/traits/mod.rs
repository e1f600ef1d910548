//! Boundaries to the systems the pipeline coordinates.
//!
//! These are INFRASTRUCTURE traits only. Stage logic lives in [`crate::stages`]
//! and talks to the outside world exclusively through them.

pub mod ai;
pub mod browser;
pub mod queue;
pub mod store;
