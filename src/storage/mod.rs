//! Storage abstractions for mirrored items.
//!
//! The item store is the only writer of durable state and the authority
//! for which identifiers already exist.
//!
//! ## Layout
//!
//! ```text
//! posts   post_id (PK) │ title │ description │ user_nick │ signature │ created_at │ updated_at
//! images  id (PK, autoincrement) │ post_id → posts │ url (UNIQUE) │ created_at
//! ```
//!
//! Image URLs are unique across all posts: the first post to store a URL
//! keeps it, later posts silently skip it.

pub mod sqlite;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Item, ItemPage, NewItem};

// Re-export for convenience
pub use sqlite::SqliteItemStore;

/// Result of an upsert call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The item row was written along with `images_stored` URLs;
    /// `images_skipped` URLs already belonged to another item.
    Inserted {
        images_stored: usize,
        images_skipped: usize,
    },
    /// An item with this identifier exists; nothing was written.
    AlreadyPresent,
}

/// Trait for item storage backends.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All committed identifiers.
    async fn existing_ids(&self) -> Result<HashSet<String>>;

    /// Insert an item and its image URLs in one transaction.
    ///
    /// Idempotent per identifier: an existing item is never modified.
    async fn upsert(&self, item: &NewItem) -> Result<UpsertOutcome>;

    /// One page of item summaries, newest first. `page` is 1-based.
    async fn list_items(&self, page: u32, page_size: u32) -> Result<ItemPage>;

    /// A single item with its image URLs in insertion order.
    async fn get_item(&self, id: &str) -> Result<Option<Item>>;

    /// Number of stored items.
    async fn count(&self) -> Result<usize>;
}
