//! Listing crawl and fetch seeding.
//!
//! The crawl walks numbered listing pages in a throwaway browser and records
//! every article link it finds in the listing store. Seeding turns each
//! recorded link into a `fetch` work item.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use url::Url;

use crate::traits::browser::{Browser, BrowserFleet};
use crate::traits::queue::StageQueue;
use crate::traits::store::KvStore;
use crate::types::{LaunchOptions, WorkItem};

/// Where listing pages live and how article links are found on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    /// Page index is appended verbatim, e.g. `https://blog.example.com/page/` + `3`
    pub base_url: String,
    /// CSS selector matching article anchors
    pub selector: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://blog.cloudflare.com/page/".to_string(),
            selector: "#main-body > astro-island > article > div > a".to_string(),
        }
    }
}

impl ListingConfig {
    pub fn new(base_url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            selector: selector.into(),
        }
    }

    pub fn page_url(&self, index: i64) -> String {
        format!("{}{}", self.base_url, index)
    }
}

pub struct CrawlSeeder {
    fleet: Arc<dyn BrowserFleet>,
    listing: Arc<dyn KvStore>,
    queue: Arc<dyn StageQueue>,
    config: ListingConfig,
}

impl CrawlSeeder {
    pub fn new(
        fleet: Arc<dyn BrowserFleet>,
        listing: Arc<dyn KvStore>,
        queue: Arc<dyn StageQueue>,
        config: ListingConfig,
    ) -> Self {
        Self {
            fleet,
            listing,
            queue,
            config,
        }
    }

    /// Crawl listing pages `start..end` and record every article link.
    ///
    /// Returns `"{page}-{n}"` → article path (no leading `/`). An empty range
    /// still launches and terminates a browser but records nothing.
    pub async fn crawl_listing(&self, start: i64, end: i64) -> Result<BTreeMap<String, String>> {
        info!(start, end, "listing crawl start");
        let browser = self
            .fleet
            .launch(LaunchOptions::ephemeral())
            .await
            .context("failed to launch listing browser")?;

        let result = self.crawl_pages(browser.as_ref(), start, end).await;

        let session_id = browser.session_id().to_string();
        if let Err(e) = browser.terminate().await {
            warn!(session_id = %session_id, error = %e, "failed to terminate listing browser");
        }

        let found = result?;
        info!(start, end, links = found.len(), "listing crawl done");
        Ok(found)
    }

    async fn crawl_pages(
        &self,
        browser: &dyn Browser,
        start: i64,
        end: i64,
    ) -> Result<BTreeMap<String, String>> {
        let mut found = BTreeMap::new();

        for index in start..end {
            let page_url = self.config.page_url(index);
            let page = browser.new_page().await.context("failed to open page")?;

            let links = async {
                page.goto(&page_url)
                    .await
                    .with_context(|| format!("navigation to {} failed", page_url))?;
                page.extract_links(&self.config.selector)
                    .await
                    .with_context(|| format!("link extraction failed on {}", page_url))
            }
            .await;

            if let Err(e) = page.close().await {
                warn!(url = %page_url, error = %e, "failed to close page");
            }

            let links = links?;
            debug!(url = %page_url, links = links.len(), "listing page scanned");

            for (n, href) in links.iter().enumerate() {
                let path = article_path(href)?;
                self.listing
                    .put(href, &path)
                    .await
                    .with_context(|| format!("failed to record listing entry {}", href))?;
                found.insert(format!("{}-{}", index, n), path);
            }
        }

        Ok(found)
    }

    /// Enqueue a fetch for every recorded link. Returns the keys seeded.
    pub async fn seed_fetches(&self) -> Result<Vec<String>> {
        let keys = self
            .listing
            .list_keys()
            .await
            .context("failed to list recorded links")?;

        for key in &keys {
            self.queue
                .send(&WorkItem::fetch(key))
                .await
                .with_context(|| format!("failed to enqueue fetch for {}", key))?;
        }

        info!(count = keys.len(), "fetches seeded");
        Ok(keys)
    }
}

/// URL path of an absolute link without its leading `/`.
fn article_path(href: &str) -> Result<String> {
    let url = Url::parse(href).with_context(|| format!("invalid article link {}", href))?;
    Ok(url.path().trim_start_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryKvStore;
    use crate::testing::{FleetCall, MockFleet, RecordingQueue};

    const BASE: &str = "https://blog.example.com/page/";
    const SELECTOR: &str = "article > a";

    fn seeder(fleet: &Arc<MockFleet>, listing: &Arc<MemoryKvStore>, queue: &Arc<RecordingQueue>) -> CrawlSeeder {
        CrawlSeeder::new(
            fleet.clone(),
            listing.clone(),
            queue.clone(),
            ListingConfig::new(BASE, SELECTOR),
        )
    }

    #[test]
    fn test_article_path_strips_leading_slash() {
        assert_eq!(
            article_path("https://blog.example.com/my-post/").unwrap(),
            "my-post/"
        );
        assert_eq!(article_path("https://blog.example.com/").unwrap(), "");
        assert!(article_path("not a url").is_err());
    }

    #[tokio::test]
    async fn test_crawl_records_links_per_page() {
        let fleet = Arc::new(
            MockFleet::new()
                .with_links(
                    format!("{}1", BASE),
                    vec!["https://blog.example.com/a/", "https://blog.example.com/b/"],
                )
                .with_links(format!("{}2", BASE), vec!["https://blog.example.com/c/"]),
        );
        let listing = Arc::new(MemoryKvStore::new());
        let queue = Arc::new(RecordingQueue::new());

        let found = seeder(&fleet, &listing, &queue).crawl_listing(1, 3).await.unwrap();

        assert_eq!(found.len(), 3);
        assert_eq!(found["1-0"], "a/");
        assert_eq!(found["1-1"], "b/");
        assert_eq!(found["2-0"], "c/");
        assert_eq!(
            listing.get("https://blog.example.com/b/").await.unwrap().as_deref(),
            Some("b/")
        );
        assert!(queue.sent().is_empty());
    }

    #[tokio::test]
    async fn test_crawl_uses_ephemeral_browser_and_terminates_it() {
        let fleet = Arc::new(MockFleet::new());
        let listing = Arc::new(MemoryKvStore::new());
        let queue = Arc::new(RecordingQueue::new());

        seeder(&fleet, &listing, &queue).crawl_listing(1, 3).await.unwrap();

        let calls = fleet.calls();
        assert!(calls.contains(&FleetCall::Launch(LaunchOptions::ephemeral())));
        assert!(calls.contains(&FleetCall::Terminate("launched-0".into())));
        assert!(!calls.contains(&FleetCall::ListSessions));
        let closed = calls.iter().filter(|c| **c == FleetCall::ClosePage).count();
        assert_eq!(closed, 2);
        assert!(calls.contains(&FleetCall::ExtractLinks(SELECTOR.into())));
    }

    #[tokio::test]
    async fn test_empty_range_visits_nothing() {
        let fleet = Arc::new(MockFleet::new());
        let listing = Arc::new(MemoryKvStore::new());
        let queue = Arc::new(RecordingQueue::new());

        let found = seeder(&fleet, &listing, &queue).crawl_listing(5, 5).await.unwrap();

        assert!(found.is_empty());
        assert!(!fleet.calls().iter().any(|c| matches!(c, FleetCall::Goto(_))));
        assert!(fleet.calls().contains(&FleetCall::Terminate("launched-0".into())));
    }

    #[tokio::test]
    async fn test_navigation_failure_still_terminates_browser() {
        let fleet = Arc::new(MockFleet::new().failing_goto());
        let listing = Arc::new(MemoryKvStore::new());
        let queue = Arc::new(RecordingQueue::new());

        let result = seeder(&fleet, &listing, &queue).crawl_listing(1, 2).await;

        assert!(result.is_err());
        let calls = fleet.calls();
        assert!(calls.contains(&FleetCall::ClosePage));
        assert!(calls.contains(&FleetCall::Terminate("launched-0".into())));
    }

    #[tokio::test]
    async fn test_seed_enqueues_fetch_per_recorded_link() {
        let fleet = Arc::new(MockFleet::new());
        let listing = Arc::new(
            MemoryKvStore::new()
                .with_entry("https://blog.example.com/a/", "a/")
                .with_entry("https://blog.example.com/b/", "b/"),
        );
        let queue = Arc::new(RecordingQueue::new());

        let keys = seeder(&fleet, &listing, &queue).seed_fetches().await.unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(
            queue.sent(),
            vec![
                WorkItem::fetch("https://blog.example.com/a/"),
                WorkItem::fetch("https://blog.example.com/b/"),
            ]
        );
    }

    #[tokio::test]
    async fn test_seed_with_empty_listing() {
        let fleet = Arc::new(MockFleet::new());
        let listing = Arc::new(MemoryKvStore::new());
        let queue = Arc::new(RecordingQueue::new());

        let keys = seeder(&fleet, &listing, &queue).seed_fetches().await.unwrap();

        assert!(keys.is_empty());
        assert!(queue.sent().is_empty());
    }
}
