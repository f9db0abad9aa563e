//! Service layer for the gallery synchronizer.
//!
//! This module contains:
//! - Remote gallery access (`GalleryApi`, `GalleryClient`)
//! - Cache-fronted reads of stored items (`Catalog`)

mod catalog;
mod gallery;

pub use catalog::{Cached, CachedRead, Catalog, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use gallery::{GalleryApi, GalleryClient};
