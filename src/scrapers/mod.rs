pub mod amazon;
pub mod ebay;
pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpFetcher;
pub use traits::PageFetcher;
pub use types::{Endpoints, MarketplaceEndpoint};

use crate::models::{Marketplace, RawListing};
use scraper::{ElementRef, Selector};

/// Extract raw listings from a search results page of `marketplace`
pub fn parse(marketplace: Marketplace, html: &str) -> Vec<RawListing> {
    match marketplace {
        Marketplace::Amazon => amazon::parse(html),
        Marketplace::Ebay => ebay::parse(html),
    }
}

/// Parse a selector from a literal
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Collapse runs of whitespace and trim
pub(crate) fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first element matching any of `candidates`, skipping empty matches
pub(crate) fn first_text(root: ElementRef<'_>, candidates: &[Selector]) -> Option<String> {
    candidates.iter().find_map(|sel| {
        root.select(sel)
            .map(|el| collapse_ws(&el.text().collect::<String>()))
            .find(|text| !text.is_empty())
    })
}

/// Attribute of the first element matching any of `candidates` that carries it
pub(crate) fn first_attr(root: ElementRef<'_>, candidates: &[Selector], attr: &str) -> Option<String> {
    candidates.iter().find_map(|sel| {
        root.select(sel)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn dispatches_by_marketplace() {
        let ebay_page = r#"<li class="s-item"><a class="s-item__link" href="/itm/1"></a>
            <div class="s-item__title">Item</div><span class="s-item__price">$1</span></li>"#;

        assert_eq!(parse(Marketplace::Ebay, ebay_page).len(), 1);
        assert!(parse(Marketplace::Amazon, ebay_page).is_empty());
    }

    #[test]
    fn first_match_falls_through_empty_candidates() {
        let html = Html::parse_fragment(
            r#"<div><h2><span>  </span></h2><a class="x">Fallback</a><a class="x" href=" /p "></a></div>"#,
        );
        let root = html.root_element();

        let text = first_text(root, &[selector("h2 span"), selector("a.x")]);
        assert_eq!(text.as_deref(), Some("Fallback"));
        assert_eq!(first_attr(root, &[selector("h2"), selector("a.x")], "href").as_deref(), Some("/p"));
        assert_eq!(first_text(root, &[selector("p")]), None);
    }

    #[test]
    fn collapse_ws_joins_lines() {
        assert_eq!(collapse_ws("  a\n   b\tc "), "a b c");
    }
}
