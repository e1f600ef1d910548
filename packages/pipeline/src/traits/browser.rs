//! Remote browser automation traits.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{LaunchOptions, Session};

/// A fleet of remote browser instances that can be listed, connected to, or
/// launched.
#[async_trait]
pub trait BrowserFleet: Send + Sync {
    /// Sessions currently known to the fleet.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Claim an existing session by connecting to it.
    async fn connect(&self, session_id: &str) -> Result<Box<dyn Browser>>;

    /// Start a new browser instance.
    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn Browser>>;
}

/// A connected browser.
#[async_trait]
pub trait Browser: Send + Sync {
    fn session_id(&self) -> &str;

    async fn new_page(&self) -> Result<Box<dyn Page>>;

    /// Drop the connection but leave the instance running for reuse.
    async fn disconnect(self: Box<Self>) -> Result<()>;

    /// Shut the instance down.
    async fn terminate(self: Box<Self>) -> Result<()>;
}

/// A browser tab.
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    /// Full visible text of the loaded document.
    async fn extract_text(&self) -> Result<String>;

    /// `href` of every element matching a CSS selector.
    async fn extract_links(&self, selector: &str) -> Result<Vec<String>>;

    async fn close(self: Box<Self>) -> Result<()>;
}
