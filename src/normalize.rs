//! Turns scraped card text into typed listings.
//!
//! Prices are currency-agnostic: symbols are discarded, `,` is treated as a
//! thousands separator and `.` as the decimal point. When a card shows a price
//! range the lower bound is kept.

use crate::error::Rejection;
use crate::models::{Listing, Marketplace, RawListing};
use chrono::{DateTime, Utc};
use reqwest::Url;

/// Parse the first number in `text` as a non-negative price
pub fn parse_price(text: &str) -> Result<f64, Rejection> {
    let reject = || Rejection::UnparsablePrice(text.to_string());

    let start = text.find(|c: char| c.is_ascii_digit()).ok_or_else(reject)?;
    let run: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    let run = run.trim_end_matches('.');

    let price: f64 = run.parse().map_err(|_| reject())?;
    if !price.is_finite() || price < 0.0 {
        return Err(reject());
    }
    Ok(price)
}

/// Resolve a possibly relative listing link against `base`
pub fn resolve_url(base: &str, href: &str) -> Result<String, Rejection> {
    let href = href.trim();
    if href.is_empty() {
        return Err(Rejection::MissingUrl(href.to_string()));
    }

    let base = Url::parse(base).map_err(|_| Rejection::MissingUrl(href.to_string()))?;
    base.join(href)
        .map(String::from)
        .map_err(|_| Rejection::MissingUrl(href.to_string()))
}

/// Coerce one raw listing into a canonical `Listing`
pub fn normalize(
    marketplace: Marketplace,
    base_url: &str,
    raw: RawListing,
    observed_at: DateTime<Utc>,
) -> Result<Listing, Rejection> {
    let price = parse_price(&raw.price_text)?;
    let url = resolve_url(base_url, &raw.href)?;

    let listing = Listing::new(raw.title, price, url, marketplace, observed_at)
        .ok_or_else(|| Rejection::UnparsablePrice(raw.price_text.clone()))?;
    Ok(listing.with_extras(raw.extras))
}
