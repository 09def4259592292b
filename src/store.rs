//! Append-only SQLite storage of price observations.
//!
//! Every `save` call is one batch, written in a single transaction and tagged
//! with the next batch number. Records are never updated or deleted.

use crate::error::StoreError;
use crate::models::{normalize_search_term, Listing, Marketplace, PriceRecord};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: [&str; 2] = [
    r#"
CREATE TABLE IF NOT EXISTS price_records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL,
    price       REAL    NOT NULL CHECK (price >= 0),
    url         TEXT    NOT NULL CHECK (length(url) > 0),
    source      TEXT    NOT NULL,
    search_term TEXT    NOT NULL,
    batch       INTEGER NOT NULL,
    observed_at TEXT    NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_price_records_term ON price_records (search_term, batch)",
];

#[derive(FromRow)]
struct PriceRow {
    id: i64,
    title: String,
    price: f64,
    url: String,
    source: String,
    search_term: String,
    batch: i64,
    observed_at: DateTime<Utc>,
}

impl TryFrom<PriceRow> for PriceRecord {
    type Error = StoreError;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        let source: Marketplace = row.source.parse().map_err(|reason| StoreError::Corrupt {
            id: row.id,
            reason,
        })?;

        Ok(PriceRecord {
            id: row.id,
            title: row.title,
            price: row.price,
            url: row.url,
            source,
            search_term: row.search_term,
            batch: row.batch,
            observed_at: row.observed_at,
        })
    }
}

fn into_records(rows: Vec<PriceRow>) -> Result<Vec<PriceRecord>, StoreError> {
    rows.into_iter().map(PriceRecord::try_from).collect()
}

/// Handle to the price database. Opened once at startup and passed to
/// whatever needs it; call [`PriceStore::close`] before exiting.
#[derive(Clone)]
pub struct PriceStore {
    pool: SqlitePool,
}

impl PriceStore {
    /// Open (creating if needed) the database file at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Opened price database at {}", path.display());
        Self::with_pool(pool).await
    }

    /// A private database that lives as long as the store
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        // A single connection that never expires, since every new in-memory
        // connection would see an empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Open {
                path: ":memory:".into(),
                source,
            })?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(StoreError::Migrate)?;
        }
        Ok(Self { pool })
    }

    /// Append `listings` as one batch under `search_term`.
    /// Either every row is committed or none is.
    pub async fn save(&self, listings: &[Listing], search_term: &str) -> Result<usize, StoreError> {
        if listings.is_empty() {
            debug!("Nothing to save for {:?}", search_term);
            return Ok(0);
        }

        let term = normalize_search_term(search_term);
        let mut tx = self.pool.begin().await?;

        let (batch,): (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(batch), 0) + 1 FROM price_records")
                .fetch_one(&mut *tx)
                .await?;

        for listing in listings {
            sqlx::query(
                "INSERT INTO price_records (title, price, url, source, search_term, batch, observed_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(listing.title())
            .bind(listing.price())
            .bind(listing.url())
            .bind(listing.source().as_str())
            .bind(term.as_str())
            .bind(batch)
            .bind(listing.observed_at())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "💾 Saved {} price records for {:?} (batch {})",
            listings.len(),
            term,
            batch
        );
        Ok(listings.len())
    }

    /// Every record stored for `search_term`, oldest first
    pub async fn history(&self, search_term: &str) -> Result<Vec<PriceRecord>, StoreError> {
        let rows: Vec<PriceRow> = sqlx::query_as(
            "SELECT id, title, price, url, source, search_term, batch, observed_at
             FROM price_records
             WHERE search_term = ?
             ORDER BY observed_at ASC, id ASC",
        )
        .bind(normalize_search_term(search_term))
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    /// Records of the most recent batch for `search_term`, cheapest first
    pub async fn latest(&self, search_term: &str) -> Result<Vec<PriceRecord>, StoreError> {
        let rows: Vec<PriceRow> = sqlx::query_as(
            "SELECT id, title, price, url, source, search_term, batch, observed_at
             FROM price_records
             WHERE search_term = ?1
               AND batch = (SELECT MAX(batch) FROM price_records WHERE search_term = ?1)
             ORDER BY price ASC, id ASC",
        )
        .bind(normalize_search_term(search_term))
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    /// Distinct search terms that have stored records
    pub async fn search_terms(&self) -> Result<Vec<String>, StoreError> {
        let terms: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT search_term FROM price_records ORDER BY search_term")
                .fetch_all(&self.pool)
                .await?;
        Ok(terms.into_iter().map(|(term,)| term).collect())
    }

    /// Release the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Closed price database");
    }
}
