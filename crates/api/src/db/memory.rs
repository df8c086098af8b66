//! In-memory stores.
//!
//! Same contracts as the `PostgreSQL` repositories, held in process memory.
//! Used by the integration tests and for running the API without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use price_comparer_core::{Email, ListItem, PriceRecordId, UserId};

use super::{CACHE_LOOKUP_LIMIT, ListStore, PriceCache, RepositoryError, UserStore};
use crate::models::{CachedPrice, ListKey, NewPriceRecord, User};

/// Append-only price cache in a `Vec`.
#[derive(Default)]
pub struct MemoryPriceCache {
    rows: RwLock<Vec<CachedPrice>>,
    next_id: AtomicI64,
}

impl MemoryPriceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, in insertion order.
    pub async fn rows(&self) -> Vec<CachedPrice> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl PriceCache for MemoryPriceCache {
    async fn lookup(&self, query: &str) -> Result<Vec<CachedPrice>, RepositoryError> {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<CachedPrice> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        matches.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));
        matches.truncate(usize::try_from(CACHE_LOOKUP_LIMIT).unwrap_or(usize::MAX));
        Ok(matches)
    }

    async fn append(&self, record: &NewPriceRecord) -> Result<PriceRecordId, RepositoryError> {
        let id = PriceRecordId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.rows.write().await.push(CachedPrice {
            id,
            title: record.title.clone(),
            price: record.price,
            source: record.source.clone(),
            external_link: record.external_link.clone(),
            inserted_at: Utc::now(),
        });
        Ok(id)
    }
}

/// Lists and carts in a `HashMap`.
#[derive(Default)]
pub struct MemoryListStore {
    lists: RwLock<HashMap<ListKey, Vec<ListItem>>>,
}

impl MemoryListStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListStore for MemoryListStore {
    async fn replace(&self, key: &ListKey, items: &[ListItem]) -> Result<(), RepositoryError> {
        self.lists.write().await.insert(key.clone(), items.to_vec());
        Ok(())
    }

    async fn load(&self, key: &ListKey) -> Result<Vec<ListItem>, RepositoryError> {
        Ok(self
            .lists
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

/// Accounts in a `Vec`, unique by email.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<(User, String)>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }

    async fn insert(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.iter().any(|(user, _)| &user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let next = i64::try_from(users.len()).unwrap_or(i64::MAX).saturating_add(1);
        let user = User {
            id: UserId::new(next),
            email: email.clone(),
            created_at: Utc::now(),
        };
        users.push((user.clone(), password_hash.to_owned()));
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use price_comparer_core::{Price, Quantity};

    use super::*;

    fn record(title: &str, price: &str) -> NewPriceRecord {
        NewPriceRecord {
            title: title.to_string(),
            price: Price::parse_text(price).unwrap(),
            source: "walmart.com".to_string(),
            external_link: format!("https://walmart.com/{title}"),
        }
    }

    #[tokio::test]
    async fn test_price_lookup_is_case_insensitive_and_sorted() {
        let cache = MemoryPriceCache::new();
        cache.append(&record("Organic EGGS 12ct", "5.49")).await.unwrap();
        cache.append(&record("Milk 1gal", "3.99")).await.unwrap();
        cache.append(&record("Cage-free eggs", "3.29")).await.unwrap();

        let hits = cache.lookup("eggs").await.unwrap();
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Cage-free eggs", "Organic EGGS 12ct"]);

        assert!(cache.lookup("bread").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_lookup_caps_rows() {
        let cache = MemoryPriceCache::new();
        for i in 0..60 {
            cache
                .append(&record(&format!("rice {i}"), "1.00"))
                .await
                .unwrap();
        }
        assert_eq!(cache.lookup("rice").await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_list_replace_overwrites() {
        let store = MemoryListStore::new();
        let key = ListKey::cart("u1");
        let item = ListItem {
            id: "g-0".to_string(),
            title: "Bread".to_string(),
            store: "aldi.us".to_string(),
            price: Price::parse_text("2.49").unwrap(),
            qty: Quantity::ONE,
        };

        store.replace(&key, &[item.clone(), item.clone()]).await.unwrap();
        store.replace(&key, &[item]).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap().len(), 1);
        assert!(store.load(&ListKey::cart("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_insert_conflicts_on_email() {
        let store = MemoryUserStore::new();
        let email = Email::parse("a@b.com").unwrap();
        let user = store.insert(&email, "hash").await.unwrap();
        assert_eq!(user.id, UserId::new(1));

        let err = store.insert(&email, "hash2").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let (found, hash) = store.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");
    }
}
