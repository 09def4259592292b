use crate::error::ParseError;
use crate::models::{ListingExtras, Marketplace, RawListing};
use crate::scrapers::{first_attr, first_text, selector};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Title of the placeholder card eBay puts at the top of result lists
const PLACEHOLDER_TITLE: &str = "shop on ebay";

/// Selectors for one eBay result item, parsed once per page
struct ItemSelectors {
    item: Selector,
    title: [Selector; 1],
    price: [Selector; 1],
    link: [Selector; 1],
    condition: [Selector; 1],
}

impl ItemSelectors {
    fn new() -> Self {
        Self {
            item: selector("li.s-item"),
            title: [selector("div.s-item__title")],
            price: [selector("span.s-item__price")],
            link: [selector("a.s-item__link")],
            condition: [selector("span.SECONDARY_INFO")],
        }
    }
}

/// Extract result cards from an eBay search page
pub fn parse(html: &str) -> Vec<RawListing> {
    let document = Html::parse_document(html);
    let selectors = ItemSelectors::new();

    let items: Vec<_> = document.select(&selectors.item).collect();
    debug!("Found {} eBay result items", items.len());

    let mut listings = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match parse_item(item, &selectors) {
            Ok(Some(listing)) => listings.push(listing),
            Ok(None) => {}
            Err(e) => debug!("Skipped eBay item {}: {}", idx, e),
        }
    }

    listings
}

fn missing(field: &'static str) -> ParseError {
    ParseError::MissingField {
        marketplace: Marketplace::Ebay,
        field,
    }
}

fn parse_item(item: ElementRef<'_>, sel: &ItemSelectors) -> Result<Option<RawListing>, ParseError> {
    let title = first_text(item, &sel.title).ok_or_else(|| missing("title"))?;
    if title.eq_ignore_ascii_case(PLACEHOLDER_TITLE) {
        return Ok(None);
    }

    let price_text = first_text(item, &sel.price).ok_or_else(|| missing("price"))?;
    let href = first_attr(item, &sel.link, "href").ok_or_else(|| missing("link"))?;
    let condition = first_text(item, &sel.condition);

    Ok(Some(RawListing {
        title,
        price_text,
        href,
        extras: ListingExtras {
            condition,
            ..ListingExtras::default()
        },
    }))
}
