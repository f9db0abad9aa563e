// src/models/mod.rs

//! Domain models for the gallery synchronizer.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod item;
mod remote;
mod sync;

// Re-export all public types
pub use config::{CacheConfig, Config, LoggingConfig, RemoteConfig, StorageConfig, SyncConfig};
pub use item::{Item, ItemPage, ItemSummary, NewItem};
pub use remote::{ListingEntry, ListingPage, PostDetail};
pub(crate) use remote::{DetailResponse, ListingResponse};
pub use sync::{ItemOutcome, SyncRun, SyncSummary};
