use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketplace a listing was scraped from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Marketplace {
    Amazon,
    #[serde(rename = "eBay")]
    Ebay,
}

impl Marketplace {
    /// Every supported marketplace, in the order a search visits them
    pub const ALL: [Marketplace; 2] = [Marketplace::Amazon, Marketplace::Ebay];

    pub fn as_str(&self) -> &'static str {
        match self {
            Marketplace::Amazon => "Amazon",
            Marketplace::Ebay => "eBay",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marketplace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amazon" => Ok(Marketplace::Amazon),
            "ebay" => Ok(Marketplace::Ebay),
            other => Err(format!("unknown marketplace: {other}")),
        }
    }
}

/// Optional details some marketplaces expose on their result cards.
/// Shown in the result report, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingExtras {
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub condition: Option<String>,
}

impl ListingExtras {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.review_count.is_none() && self.condition.is_none()
    }
}

/// One result card as extracted from a search page, before any coercion
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub title: String,
    pub price_text: String,
    pub href: String,
    pub extras: ListingExtras,
}

/// A scraped offer whose price and link passed normalization.
///
/// Fields are private so a `Listing` can only exist with a finite,
/// non-negative price and a non-empty url.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    title: String,
    price: f64,
    url: String,
    source: Marketplace,
    observed_at: DateTime<Utc>,
    extras: ListingExtras,
}

impl Listing {
    /// Returns `None` when the price is negative or not finite, or the url is blank.
    pub fn new(
        title: impl Into<String>,
        price: f64,
        url: impl Into<String>,
        source: Marketplace,
        observed_at: DateTime<Utc>,
    ) -> Option<Self> {
        let url = url.into();
        if !price.is_finite() || price < 0.0 || url.trim().is_empty() {
            return None;
        }

        Some(Self {
            title: title.into(),
            price,
            url,
            source,
            observed_at,
            extras: ListingExtras::default(),
        })
    }

    pub fn with_extras(mut self, extras: ListingExtras) -> Self {
        self.extras = extras;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> Marketplace {
        self.source
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn extras(&self) -> &ListingExtras {
        &self.extras
    }
}

/// A persisted, timestamped price observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub url: String,
    pub source: Marketplace,
    pub search_term: String,
    pub batch: i64,
    pub observed_at: DateTime<Utc>,
}

/// Canonical form of a search term as stored alongside each record
pub fn normalize_search_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_rejects_invalid_prices_and_urls() {
        let now = Utc::now();
        assert!(Listing::new("a", -1.0, "https://x", Marketplace::Amazon, now).is_none());
        assert!(Listing::new("a", f64::NAN, "https://x", Marketplace::Amazon, now).is_none());
        assert!(Listing::new("a", f64::INFINITY, "https://x", Marketplace::Amazon, now).is_none());
        assert!(Listing::new("a", 1.0, "  ", Marketplace::Amazon, now).is_none());
        assert!(Listing::new("a", 0.0, "https://x", Marketplace::Ebay, now).is_some());
    }

    #[test]
    fn marketplace_round_trips_through_display() {
        for marketplace in Marketplace::ALL {
            let parsed: Marketplace = marketplace.to_string().parse().unwrap();
            assert_eq!(parsed, marketplace);
        }
        assert!("walmart".parse::<Marketplace>().is_err());
    }

    #[test]
    fn search_terms_are_case_and_space_insensitive() {
        assert_eq!(normalize_search_term("  Wireless   Headphones "), "wireless headphones");
    }
}
