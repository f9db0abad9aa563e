//! Stored item data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PostDetail;

/// A mirrored gallery post with its image URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Remote post identifier (opaque)
    pub id: String,

    pub title: String,

    pub description: String,

    /// Author display name
    pub user_nick: String,

    /// Author signature line
    pub signature: String,

    /// Image URLs in insertion order
    pub images: Vec<String>,

    /// Set when the item was first persisted
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

/// Storage record built from a fetched post detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub user_nick: String,
    pub signature: String,
    pub images: Vec<String>,
}

impl NewItem {
    /// Build a record for `id` from its detail response.
    ///
    /// The identifier observed on the listing wins over whatever the detail
    /// payload echoes back, so the diff key and the stored key always agree.
    pub fn from_detail(id: &str, detail: PostDetail) -> Self {
        Self {
            id: id.to_string(),
            title: detail.title,
            description: detail.description,
            user_nick: detail.user_nick,
            signature: detail.signature,
            images: detail.images,
        }
    }
}

/// List-view projection of an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub user_nick: String,
    pub signature: String,
    /// Number of stored image URLs
    pub image_count: usize,
    pub created_at: DateTime<Utc>,
}

/// One page of item summaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemPage {
    pub items: Vec<ItemSummary>,
    /// Total number of stored items
    pub total: usize,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl ItemPage {
    /// Number of pages needed to show `total` items.
    pub fn page_count(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(self.page_size as usize);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}
