use crate::models::Marketplace;
use std::path::PathBuf;
use thiserror::Error;

/// Why a marketplace page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("invalid search url: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("could not read response body: {0}")]
    Body(String),
}

/// A failed fetch for one marketplace. The search carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{marketplace}: {kind}")]
pub struct FetchError {
    pub marketplace: Marketplace,
    #[source]
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(marketplace: Marketplace, kind: FetchErrorKind) -> Self {
        Self { marketplace, kind }
    }
}

/// A result card that could not be turned into a raw listing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{marketplace} listing is missing its {field}")]
    MissingField {
        marketplace: Marketplace,
        field: &'static str,
    },
}

/// A raw listing dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unparsable price {0:?}")]
    UnparsablePrice(String),
    #[error("missing or unresolvable url {0:?}")]
    MissingUrl(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open price database {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to prepare price database schema")]
    Migrate(#[source] sqlx::Error),
    #[error("price database query failed")]
    Query(#[from] sqlx::Error),
    #[error("stored record {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
