//! `PostgreSQL` storage for shopping lists and carts.

use async_trait::async_trait;
use sqlx::PgPool;

use price_comparer_core::{ListItem, Price, Quantity};

use super::{ListStore, RepositoryError};
use crate::models::ListKey;

#[derive(sqlx::FromRow)]
struct ListItemRow {
    item_id: String,
    title: String,
    store: String,
    price: Price,
    qty: i32,
}

impl TryFrom<ListItemRow> for ListItem {
    type Error = RepositoryError;

    fn try_from(row: ListItemRow) -> Result<Self, Self::Error> {
        let qty = Quantity::new(i64::from(row.qty)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity in database: {e}"))
        })?;

        Ok(Self {
            id: row.item_id,
            title: row.title,
            store: row.store,
            price: row.price,
            qty,
        })
    }
}

/// List storage backed by the `list_items` table.
#[derive(Clone)]
pub struct ListRepository {
    pool: PgPool,
}

impl ListRepository {
    /// Create a new list repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListStore for ListRepository {
    /// Delete-then-insert in one transaction, so a reader never sees a
    /// half-written list from a single save.
    #[tracing::instrument(skip(self, items), fields(key = %key, count = items.len()), err)]
    async fn replace(&self, key: &ListKey, items: &[ListItem]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM list_items WHERE list_kind = $1 AND owner_key = $2")
            .bind(key.kind())
            .bind(key.owner())
            .execute(&mut *tx)
            .await?;

        for (position, item) in items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::InvalidInput("too many items".to_owned()))?;
            let qty = i32::try_from(item.qty.get()).map_err(|_| {
                RepositoryError::InvalidInput(format!("quantity {} is too large", item.qty))
            })?;

            sqlx::query(
                r"
                INSERT INTO list_items
                    (list_kind, owner_key, position, item_id, title, store, price, qty)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(key.kind())
            .bind(key.owner())
            .bind(position)
            .bind(&item.id)
            .bind(&item.title)
            .bind(&item.store)
            .bind(item.price)
            .bind(qty)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load(&self, key: &ListKey) -> Result<Vec<ListItem>, RepositoryError> {
        let rows: Vec<ListItemRow> = sqlx::query_as(
            r"
            SELECT item_id, title, store, price, qty
            FROM list_items
            WHERE list_kind = $1 AND owner_key = $2
            ORDER BY position ASC
            ",
        )
        .bind(key.kind())
        .bind(key.owner())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ListItem::try_from).collect()
    }
}
