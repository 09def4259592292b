use crate::error::ParseError;
use crate::models::{ListingExtras, Marketplace, RawListing};
use crate::scrapers::{first_attr, first_text, selector};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Selectors for one Amazon result card, parsed once per page
struct CardSelectors {
    card: Selector,
    title: [Selector; 2],
    price: [Selector; 1],
    link: [Selector; 2],
    rating: [Selector; 1],
    reviews: [Selector; 1],
}

impl CardSelectors {
    fn new() -> Self {
        Self {
            card: selector(r#"div[data-component-type="s-search-result"]"#),
            title: [selector("h2 a span"), selector("h2 span")],
            price: [selector("span.a-price > span.a-offscreen")],
            link: [selector("h2 a"), selector("a.a-link-normal")],
            rating: [selector("span.a-icon-alt")],
            reviews: [selector("span.a-size-base.s-underline-text")],
        }
    }
}

/// Extract result cards from an Amazon search page
pub fn parse(html: &str) -> Vec<RawListing> {
    let document = Html::parse_document(html);
    let selectors = CardSelectors::new();

    let cards: Vec<_> = document.select(&selectors.card).collect();
    debug!("Found {} Amazon result cards", cards.len());

    let mut listings = Vec::with_capacity(cards.len());
    for (idx, card) in cards.into_iter().enumerate() {
        match parse_card(card, &selectors) {
            Ok(listing) => listings.push(listing),
            Err(e) => debug!("Skipped Amazon card {}: {}", idx, e),
        }
    }

    listings
}

fn missing(field: &'static str) -> ParseError {
    ParseError::MissingField {
        marketplace: Marketplace::Amazon,
        field,
    }
}

fn parse_card(card: ElementRef<'_>, sel: &CardSelectors) -> Result<RawListing, ParseError> {
    let title = first_text(card, &sel.title).ok_or_else(|| missing("title"))?;
    let price_text = first_text(card, &sel.price).ok_or_else(|| missing("price"))?;
    let href = first_attr(card, &sel.link, "href").ok_or_else(|| missing("link"))?;

    // "4.5 out of 5 stars"
    let rating = first_text(card, &sel.rating)
        .and_then(|text| text.split_whitespace().next()?.parse::<f32>().ok());
    let review_count = first_text(card, &sel.reviews)
        .and_then(|text| text.replace(',', "").parse::<u32>().ok());

    Ok(RawListing {
        title,
        price_text,
        href,
        extras: ListingExtras {
            rating,
            review_count,
            condition: None,
        },
    })
}
