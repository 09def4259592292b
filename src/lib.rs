pub mod browser;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod scrapers;
pub mod store;

pub use config::Config;
pub use error::{FetchError, FetchErrorKind, ParseError, Rejection, StoreError};
pub use models::{Listing, ListingExtras, Marketplace, PriceRecord, RawListing};
pub use pipeline::{PriceTracker, SearchOutcome};
pub use store::PriceStore;
