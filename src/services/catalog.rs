// src/services/catalog.rs

//! Read-through catalog over the item store.
//!
//! This is what a read API calls: page listings and single-item lookups,
//! memoized in an [`ExpiringCache`] for a short time.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ExpiringCache;
use crate::error::{AppError, Result};
use crate::models::{CacheConfig, Item, ItemPage};
use crate::storage::ItemStore;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Values the catalog keeps in its cache.
#[derive(Debug, Clone)]
pub enum CachedRead {
    Page(ItemPage),
    Item(Item),
}

/// A read result and whether it came from the cache.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub cached: bool,
}

/// Cache-fronted reads of stored items.
pub struct Catalog {
    store: Arc<dyn ItemStore>,
    cache: Arc<dyn ExpiringCache<CachedRead>>,
    list_ttl: Duration,
    detail_ttl: Duration,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn ItemStore>,
        cache: Arc<dyn ExpiringCache<CachedRead>>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store,
            cache,
            list_ttl: config.list_ttl(),
            detail_ttl: config.detail_ttl(),
        }
    }

    /// Clamp raw paging input: page below 1 becomes 1, page size is
    /// kept within `1..=MAX_PAGE_SIZE` (0 means the default).
    pub fn normalize_paging(page: u32, page_size: u32) -> (u32, u32) {
        let page = page.max(1);
        let page_size = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        (page, page_size)
    }

    /// One page of item summaries, newest first.
    pub async fn list_items(&self, page: u32, page_size: u32) -> Result<Cached<ItemPage>> {
        let (page, page_size) = Self::normalize_paging(page, page_size);
        let key = format!("items:{page}:{page_size}");

        if let Some(CachedRead::Page(value)) = self.cache.get(&key) {
            return Ok(Cached {
                value,
                cached: true,
            });
        }

        let value = self.store.list_items(page, page_size).await?;
        self.cache
            .set(&key, CachedRead::Page(value.clone()), self.list_ttl);
        Ok(Cached {
            value,
            cached: false,
        })
    }

    /// A single item with its image URLs.
    ///
    /// Misses are not cached, so an item persisted by the next sync run is
    /// visible immediately.
    pub async fn get_item(&self, id: &str) -> Result<Cached<Item>> {
        let key = format!("item:{id}");

        if let Some(CachedRead::Item(value)) = self.cache.get(&key) {
            return Ok(Cached {
                value,
                cached: true,
            });
        }

        let value = self
            .store
            .get_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        self.cache
            .set(&key, CachedRead::Item(value.clone()), self.detail_ttl);
        Ok(Cached {
            value,
            cached: false,
        })
    }

    /// Drop every cached read, e.g. after a sync run stored new items.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::models::NewItem;
    use crate::storage::SqliteItemStore;

    fn new_item(id: &str) -> NewItem {
        NewItem {
            id: id.to_string(),
            title: format!("Post {id}"),
            description: String::new(),
            user_nick: "lens".to_string(),
            signature: String::new(),
            images: vec![format!("https://img/{id}.jpg")],
        }
    }

    fn catalog(store: Arc<SqliteItemStore>) -> Catalog {
        Catalog::new(store, Arc::new(TtlCache::<CachedRead>::new()), &CacheConfig::default())
    }

    #[test]
    fn test_normalize_paging() {
        assert_eq!(Catalog::normalize_paging(0, 0), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(Catalog::normalize_paging(3, 500), (3, MAX_PAGE_SIZE));
        assert_eq!(Catalog::normalize_paging(2, 7), (2, 7));
    }

    #[tokio::test]
    async fn test_list_is_cached_until_invalidated() {
        let store = Arc::new(SqliteItemStore::open_in_memory().unwrap());
        store.upsert(&new_item("1")).await.unwrap();
        let catalog = catalog(Arc::clone(&store));

        let first = catalog.list_items(1, 20).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.value.total, 1);

        store.upsert(&new_item("2")).await.unwrap();
        let second = catalog.list_items(1, 20).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.value.total, 1);

        catalog.invalidate();
        let third = catalog.list_items(1, 20).await.unwrap();
        assert!(!third.cached);
        assert_eq!(third.value.total, 2);
    }

    #[tokio::test]
    async fn test_get_item_read_through() {
        let store = Arc::new(SqliteItemStore::open_in_memory().unwrap());
        store.upsert(&new_item("5")).await.unwrap();
        let catalog = catalog(store);

        let miss = catalog.get_item("5").await.unwrap();
        assert!(!miss.cached);
        assert_eq!(miss.value.images, vec!["https://img/5.jpg"]);

        let hit = catalog.get_item("5").await.unwrap();
        assert!(hit.cached);
        assert_eq!(hit.value, miss.value);
    }

    #[tokio::test]
    async fn test_get_missing_item_is_not_found() {
        let store = Arc::new(SqliteItemStore::open_in_memory().unwrap());
        let catalog = catalog(Arc::clone(&store));

        let err = catalog.get_item("404").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(id) if id == "404"));

        store.upsert(&new_item("404")).await.unwrap();
        assert!(catalog.get_item("404").await.is_ok());
    }
}
