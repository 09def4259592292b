use crate::error::{FetchError, StoreError};
use crate::models::{ListingExtras, Marketplace, PriceRecord};
use crate::normalize::normalize;
use crate::scrapers::{self, Endpoints, PageFetcher};
use crate::store::PriceStore;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Everything one search produced
#[derive(Debug)]
pub struct SearchOutcome {
    pub query: String,
    /// The batch just saved, cheapest first
    pub records: Vec<PriceRecord>,
    /// Display-only details keyed by listing url
    pub extras: HashMap<String, ListingExtras>,
    /// Marketplaces that could not be fetched
    pub failures: Vec<FetchError>,
    /// Listings dropped during normalization
    pub rejected: usize,
    pub saved: usize,
}

/// Runs a search across every marketplace and persists what it finds
pub struct PriceTracker {
    fetcher: Box<dyn PageFetcher>,
    store: PriceStore,
    endpoints: Endpoints,
}

impl PriceTracker {
    pub fn new(fetcher: Box<dyn PageFetcher>, store: PriceStore, endpoints: Endpoints) -> Self {
        Self {
            fetcher,
            store,
            endpoints,
        }
    }

    pub fn store(&self) -> &PriceStore {
        &self.store
    }

    /// Fetch, parse and normalize every marketplace in turn, save the
    /// merged listings as one batch and read that batch back.
    ///
    /// A marketplace that fails to fetch only shrinks the result; the
    /// only error returned is a storage failure.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, StoreError> {
        let query = query.trim();
        info!("🔍 Searching for {:?} across {} marketplaces", query, Marketplace::ALL.len());

        let mut listings = Vec::new();
        let mut failures = Vec::new();
        let mut rejected = 0;

        for marketplace in Marketplace::ALL {
            let html = match self.fetcher.fetch(marketplace, query).await {
                Ok(html) => html,
                Err(e) => {
                    error!("❌ Fetch failed for {}", e);
                    failures.push(e);
                    continue;
                }
            };

            let observed_at = Utc::now();
            let base_url = &self.endpoints.get(marketplace).base_url;
            let raw = scrapers::parse(marketplace, &html);
            let found = raw.len();

            for item in raw {
                match normalize(marketplace, base_url, item, observed_at) {
                    Ok(listing) => listings.push(listing),
                    Err(rejection) => {
                        debug!("Dropped {} listing: {}", marketplace, rejection);
                        rejected += 1;
                    }
                }
            }

            if found == 0 {
                warn!("No listings found on {} page", marketplace);
            } else {
                info!("Found {} listings on {}", found, marketplace);
            }
        }

        let extras: HashMap<String, ListingExtras> = listings
            .iter()
            .filter(|l| !l.extras().is_empty())
            .map(|l| (l.url().to_string(), l.extras().clone()))
            .collect();

        if listings.is_empty() {
            return Ok(SearchOutcome {
                query: query.to_string(),
                records: Vec::new(),
                extras,
                failures,
                rejected,
                saved: 0,
            });
        }

        let saved = self.store.save(&listings, query).await?;
        let records = self.store.latest(query).await?;

        Ok(SearchOutcome {
            query: query.to_string(),
            records,
            extras,
            failures,
            rejected,
            saved,
        })
    }

    /// Stored observations for `query`, oldest first
    pub async fn history(&self, query: &str) -> Result<Vec<PriceRecord>, StoreError> {
        self.store.history(query).await
    }

    /// Search terms with saved history, or none if the store can't be read
    pub async fn known_terms(&self) -> Vec<String> {
        match self.store.search_terms().await {
            Ok(terms) => terms,
            Err(e) => {
                warn!("Could not list saved search terms: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpSettings;
    use crate::error::FetchErrorKind;
    use crate::logging::test_support::WarnCounter;
    use crate::scrapers::HttpFetcher;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        Fetcher {}

        #[async_trait]
        impl PageFetcher for Fetcher {
            async fn fetch(&self, marketplace: Marketplace, query: &str) -> Result<String, FetchError>;
        }
    }

    const AMAZON_PAGE: &str = r#"
        <div data-component-type="s-search-result">
          <h2><a href="/a/dp/1"><span>Headphones A</span></a></h2>
          <span class="a-price"><span class="a-offscreen">$29.99</span></span>
        </div>
        <div data-component-type="s-search-result">
          <h2><a href="/c/dp/3"><span>Headphones C</span></a></h2>
          <span class="a-price"><span class="a-offscreen">$19.00</span></span>
          <span class="a-icon-alt">4.1 out of 5 stars</span>
        </div>
        <div data-component-type="s-search-result">
          <h2><a href="/d/dp/4"><span>Headphones D</span></a></h2>
          <span class="a-price"><span class="a-offscreen">Currently unavailable</span></span>
        </div>
    "#;

    const EBAY_PAGE: &str = r#"
        <li class="s-item">
          <a class="s-item__link" href="https://www.ebay.com/itm/2"></a>
          <div class="s-item__title">Headphones B</div>
          <span class="s-item__price">$24.50</span>
        </li>
    "#;

    async fn tracker(fetcher: MockFetcher) -> PriceTracker {
        let store = PriceStore::in_memory().await.unwrap();
        PriceTracker::new(Box::new(fetcher), store, Endpoints::default())
    }

    #[tokio::test]
    async fn merges_both_marketplaces_cheapest_first() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq(Marketplace::Amazon), eq("headphones"))
            .times(1)
            .returning(|_, _| Ok(AMAZON_PAGE.to_string()));
        fetcher
            .expect_fetch()
            .with(eq(Marketplace::Ebay), eq("headphones"))
            .times(1)
            .returning(|_, _| Ok(EBAY_PAGE.to_string()));

        let tracker = tracker(fetcher).await;
        let outcome = tracker.search(" headphones ").await.unwrap();

        let titles: Vec<_> = outcome.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Headphones C", "Headphones B", "Headphones A"]);
        assert_eq!(outcome.saved, 3);
        assert_eq!(outcome.rejected, 1);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.records[0].url, "https://www.amazon.com/c/dp/3");
        assert_eq!(
            outcome.extras.get("https://www.amazon.com/c/dp/3").and_then(|e| e.rating),
            Some(4.1)
        );
    }

    #[tokio::test]
    async fn ebay_failure_still_yields_amazon_results() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq(Marketplace::Amazon), always())
            .times(1)
            .returning(|_, _| Ok(AMAZON_PAGE.to_string()));
        fetcher
            .expect_fetch()
            .with(eq(Marketplace::Ebay), always())
            .times(1)
            .returning(|m, _| Err(FetchError::new(m, FetchErrorKind::Timeout)));

        let tracker = tracker(fetcher).await;
        let outcome = tracker.search("headphones").await.unwrap();

        assert!(!outcome.records.is_empty());
        assert!(outcome.records.iter().all(|r| r.source == Marketplace::Amazon));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].marketplace, Marketplace::Ebay);
    }

    #[tokio::test]
    async fn ebay_failure_logs_exactly_one_entry() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|m, _| match m {
                Marketplace::Amazon => Ok(AMAZON_PAGE.to_string()),
                Marketplace::Ebay => Err(FetchError::new(m, FetchErrorKind::Status(503))),
            });
        let tracker = tracker(fetcher).await;

        let (counter, _guard) = WarnCounter::install();
        let outcome = tracker.search("headphones").await.unwrap();

        assert!(!outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(counter.count(), 1);
    }

    /// Local HTTP server: Amazon paths get a results page, anything else a 503
    async fn spawn_marketplace_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let (status, body) = if request.starts_with("GET /amazon/") {
                    ("200 OK", AMAZON_PAGE)
                } else {
                    ("503 Service Unavailable", "")
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn http_error_status_logs_exactly_one_entry() {
        let server = spawn_marketplace_server().await;
        let mut endpoints = Endpoints::default();
        endpoints.amazon.search_url = format!("{server}/amazon/s");
        endpoints.ebay.search_url = format!("{server}/ebay/sch/i.html");
        let settings = HttpSettings {
            timeout_secs: 5,
            use_system_proxy: false,
            ..HttpSettings::default()
        };
        let fetcher = HttpFetcher::new(&settings, endpoints.clone()).unwrap();
        let store = PriceStore::in_memory().await.unwrap();
        let tracker = PriceTracker::new(Box::new(fetcher), store, endpoints);

        let (counter, _guard) = WarnCounter::install();
        let outcome = tracker.search("headphones").await.unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| r.source == Marketplace::Amazon));
        assert_eq!(
            outcome.failures,
            [FetchError::new(Marketplace::Ebay, FetchErrorKind::Status(503))]
        );
        assert_eq!(counter.count(), 1);
    }

    #[tokio::test]
    async fn known_terms_lists_saved_searches() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|m, _| match m {
                Marketplace::Amazon => Ok(AMAZON_PAGE.to_string()),
                Marketplace::Ebay => Ok(EBAY_PAGE.to_string()),
            });

        let tracker = tracker(fetcher).await;
        tracker.search("Headphones").await.unwrap();

        assert_eq!(tracker.known_terms().await, ["headphones"]);
    }

    #[tokio::test]
    async fn known_terms_logs_store_failure_and_falls_back() {
        let tracker = tracker(MockFetcher::new()).await;
        tracker.store().close().await;

        let (counter, _guard) = WarnCounter::install();
        let terms = tracker.known_terms().await;

        assert!(terms.is_empty());
        assert_eq!(counter.count(), 1);
    }

    #[tokio::test]
    async fn total_failure_saves_nothing() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|m, _| Err(FetchError::new(m, FetchErrorKind::Status(503))));

        let tracker = tracker(fetcher).await;
        let outcome = tracker.search("headphones").await.unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.saved, 0);
        assert_eq!(outcome.failures.len(), 2);
        assert!(tracker.history("headphones").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_searches_accumulate_history() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|m, _| match m {
                Marketplace::Amazon => Ok(AMAZON_PAGE.to_string()),
                Marketplace::Ebay => Ok(EBAY_PAGE.to_string()),
            });

        let tracker = tracker(fetcher).await;
        tracker.search("headphones").await.unwrap();
        let second = tracker.search("Headphones").await.unwrap();

        assert_eq!(second.records.len(), 3);
        let history = tracker.history("headphones").await.unwrap();
        assert_eq!(history.len(), 6);
        assert!(history
            .windows(2)
            .all(|w| w[0].observed_at <= w[1].observed_at));
    }
}
