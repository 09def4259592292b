use crate::error::FetchErrorKind;
use crate::models::Marketplace;
use reqwest::Url;
use serde::Deserialize;

/// Where and how a marketplace is searched
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MarketplaceEndpoint {
    /// Search results page, without the query string
    pub search_url: String,
    /// Query parameter carrying the search term
    pub query_param: String,
    /// Base that relative listing links are resolved against
    pub base_url: String,
}

impl MarketplaceEndpoint {
    pub fn default_for(marketplace: Marketplace) -> Self {
        match marketplace {
            Marketplace::Amazon => Self {
                search_url: "https://www.amazon.com/s".to_string(),
                query_param: "k".to_string(),
                base_url: "https://www.amazon.com".to_string(),
            },
            Marketplace::Ebay => Self {
                search_url: "https://www.ebay.com/sch/i.html".to_string(),
                query_param: "_nkw".to_string(),
                base_url: "https://www.ebay.com".to_string(),
            },
        }
    }

    /// Full search url for `query`, form-encoded
    pub fn search_url_for(&self, query: &str) -> Result<Url, FetchErrorKind> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchErrorKind::EmptyQuery);
        }

        Url::parse_with_params(&self.search_url, &[(self.query_param.as_str(), query)])
            .map_err(|e| FetchErrorKind::InvalidUrl(format!("{}: {e}", self.search_url)))
    }
}

/// Endpoints for every marketplace
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub amazon: MarketplaceEndpoint,
    pub ebay: MarketplaceEndpoint,
}

impl Endpoints {
    pub fn get(&self, marketplace: Marketplace) -> &MarketplaceEndpoint {
        match marketplace {
            Marketplace::Amazon => &self.amazon,
            Marketplace::Ebay => &self.ebay,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            amazon: MarketplaceEndpoint::default_for(Marketplace::Amazon),
            ebay: MarketplaceEndpoint::default_for(Marketplace::Ebay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_the_query() {
        let endpoint = MarketplaceEndpoint::default_for(Marketplace::Amazon);
        let url = endpoint.search_url_for(" usb c & hdmi ").unwrap();
        assert_eq!(url.as_str(), "https://www.amazon.com/s?k=usb+c+%26+hdmi");

        let endpoint = MarketplaceEndpoint::default_for(Marketplace::Ebay);
        let url = endpoint.search_url_for("headphones").unwrap();
        assert_eq!(url.as_str(), "https://www.ebay.com/sch/i.html?_nkw=headphones");
    }

    #[test]
    fn blank_query_is_refused() {
        let endpoint = MarketplaceEndpoint::default_for(Marketplace::Ebay);
        assert_eq!(endpoint.search_url_for("   "), Err(FetchErrorKind::EmptyQuery));
    }

    #[test]
    fn broken_endpoint_is_reported() {
        let endpoint = MarketplaceEndpoint {
            search_url: "not a url".to_string(),
            query_param: "q".to_string(),
            base_url: "https://example.com".to_string(),
        };
        assert!(matches!(
            endpoint.search_url_for("tv"),
            Err(FetchErrorKind::InvalidUrl(_))
        ));
    }
}
