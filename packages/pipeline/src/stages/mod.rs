//! Stage handlers.
//!
//! Each stage takes one [`WorkItem`](crate::types::WorkItem) whose URL has
//! already passed the cache gate and reports what should happen next as a
//! [`StageOutcome`]. Errors returned from a stage are fatal for the batch and
//! left to the queue infrastructure's redelivery.

mod fetch;
mod summarize;
mod translate;

pub use fetch::FetchStage;
pub use summarize::SummarizeStage;
pub use translate::TranslateStage;

use std::fmt;
use std::time::Duration;

use crate::types::WorkItem;

/// What a stage decided for its work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Hand this item to the next stage
    Emitted(WorkItem),
    /// Terminal stage finished; nothing more to enqueue
    Completed,
    /// Soft failure: drop the traversal without retrying
    Abandoned(AbandonReason),
    /// Redeliver the original item after `delay`
    Retry { delay: Duration },
}

/// Why a traversal was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The item carried no text to work on
    EmptyInput,
    /// The page yielded no visible text
    EmptyExtraction,
    /// The AI service returned nothing
    EmptyResponse,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonReason::EmptyInput => f.write_str("empty input text"),
            AbandonReason::EmptyExtraction => f.write_str("page has no visible text"),
            AbandonReason::EmptyResponse => f.write_str("missing response from AI"),
        }
    }
}
