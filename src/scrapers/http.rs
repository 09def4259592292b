use crate::config::HttpSettings;
use crate::error::{FetchError, FetchErrorKind};
use crate::models::Marketplace;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::Endpoints;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::{debug, info};

/// Fetches marketplace search pages over HTTP
pub struct HttpFetcher {
    client: Client,
    endpoints: Endpoints,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings, endpoints: Endpoints) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&settings.accept).context("Invalid Accept header")?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language)
                .context("Invalid Accept-Language header")?,
        );

        let mut builder = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers);
        if !settings.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { client, endpoints })
    }
}

fn classify(err: reqwest::Error) -> FetchErrorKind {
    if err.is_timeout() {
        FetchErrorKind::Timeout
    } else if let Some(status) = err.status() {
        FetchErrorKind::Status(status.as_u16())
    } else {
        FetchErrorKind::Request(err.to_string())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, marketplace: Marketplace, query: &str) -> Result<String, FetchError> {
        let url = self
            .endpoints
            .get(marketplace)
            .search_url_for(query)
            .map_err(|kind| FetchError::new(marketplace, kind))?;

        info!("Searching {} for {:?}", marketplace, query.trim());
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::new(marketplace, classify(e)))?;

        if !response.status().is_success() {
            debug!("{} returned status: {}", marketplace, response.status());
            return Err(FetchError::new(
                marketplace,
                FetchErrorKind::Status(response.status().as_u16()),
            ));
        }

        let html = response.text().await.map_err(|e| {
            let kind = if e.is_timeout() {
                FetchErrorKind::Timeout
            } else {
                FetchErrorKind::Body(e.to_string())
            };
            FetchError::new(marketplace, kind)
        })?;

        debug!("Downloaded {} bytes of HTML from {}", html.len(), marketplace);
        Ok(html)
    }
}
