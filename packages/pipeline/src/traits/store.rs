use anyhow::Result;
use async_trait::async_trait;

/// Key-value namespace used for the summary cache and the crawl listing.
///
/// Writes are last-writer-wins; the summary cache relies on this to tolerate a
/// retried terminal write for the same URL.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// All keys in the namespace, in ascending order.
    async fn list_keys(&self) -> Result<Vec<String>>;
}
