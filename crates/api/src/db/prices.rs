//! `PostgreSQL` price cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use price_comparer_core::{Price, PriceRecordId};

use super::{CACHE_LOOKUP_LIMIT, PriceCache, RepositoryError, escape_like};
use crate::models::{CachedPrice, NewPriceRecord};

#[derive(sqlx::FromRow)]
struct PriceRow {
    id: PriceRecordId,
    title: String,
    price: Price,
    source: String,
    external_link: String,
    inserted_at: DateTime<Utc>,
}

impl From<PriceRow> for CachedPrice {
    fn from(row: PriceRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            price: row.price,
            source: row.source,
            external_link: row.external_link,
            inserted_at: row.inserted_at,
        }
    }
}

/// Price cache backed by the `prices` table.
#[derive(Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    /// Create a new price repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceCache for PriceRepository {
    #[tracing::instrument(skip(self), err)]
    async fn lookup(&self, query: &str) -> Result<Vec<CachedPrice>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(query.trim()));

        let rows: Vec<PriceRow> = sqlx::query_as(
            r"
            SELECT id, title, price, source, external_link, inserted_at
            FROM prices
            WHERE title ILIKE $1 ESCAPE '\'
            ORDER BY price ASC, id ASC
            LIMIT $2
            ",
        )
        .bind(pattern)
        .bind(CACHE_LOOKUP_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CachedPrice::from).collect())
    }

    async fn append(&self, record: &NewPriceRecord) -> Result<PriceRecordId, RepositoryError> {
        let id: PriceRecordId = sqlx::query_scalar(
            r"
            INSERT INTO prices (title, price, source, external_link)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&record.title)
        .bind(record.price)
        .bind(&record.source)
        .bind(&record.external_link)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}
