use crate::error::FetchError;
use crate::models::Marketplace;
use async_trait::async_trait;

/// Retrieves the first search results page of a marketplace.
/// Implemented over HTTP in production and mocked in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the raw HTML of the results page for `query`
    async fn fetch(&self, marketplace: Marketplace, query: &str) -> Result<String, FetchError>;
}
