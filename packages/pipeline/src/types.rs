//! Pipeline data types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stage tag carried by every work item.
///
/// Tags that do not name a stage decode to [`Action::Unknown`] so that a
/// message from a newer producer is ignored instead of failing the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Fetch,
    Summarize,
    Translate,
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Fetch => "fetch",
            Action::Summarize => "summarize",
            Action::Translate => "translate",
            Action::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of pipeline work: stage tag, source URL (also the cache key) and
/// the payload handed from the previous stage.
///
/// Items are never mutated after construction. Each stage transition builds a
/// new item through one of the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub action: Action,
    pub url: String,
    #[serde(default)]
    pub text: String,
}

impl WorkItem {
    pub fn fetch(url: impl Into<String>) -> Self {
        Self {
            action: Action::Fetch,
            url: url.into(),
            text: String::new(),
        }
    }

    pub fn summarize(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            action: Action::Summarize,
            url: url.into(),
            text: text.into(),
        }
    }

    pub fn translate(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            action: Action::Translate,
            url: url.into(),
            text: text.into(),
        }
    }

    /// Decode a queue message body.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Encode as a queue message body.
    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A remote browser session as reported by the fleet listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Another consumer currently holds a connection to this session.
    pub busy: bool,
}

impl Session {
    pub fn idle(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            busy: false,
        }
    }

    pub fn busy(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            busy: true,
        }
    }
}

/// Options for launching a new browser instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    /// How long the instance stays alive without a connected client.
    /// `None` uses the fleet default.
    pub keep_alive: Option<Duration>,
}

impl LaunchOptions {
    pub fn pooled(keep_alive: Duration) -> Self {
        Self {
            keep_alive: Some(keep_alive),
        }
    }

    pub fn ephemeral() -> Self {
        Self { keep_alive: None }
    }
}

/// Chat message sent to a text-generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
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
