// src/pipeline/sync.rs

//! Incremental synchronization engine.
//!
//! One run: snapshot stored identifiers, page through the remote listing,
//! fetch detail for identifiers not stored yet, and upsert them one by one.
//!
//! Failure policy:
//! - snapshot or listing failure aborts the run before anything is written,
//!   since a partial listing would hide new items;
//! - a failed detail fetch or upsert only fails that item. It stays outside
//!   the stored set and is picked up again by the next run.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{ItemOutcome, ListingEntry, NewItem, SyncRun, SyncSummary};
use crate::pipeline::ThrottlePolicy;
use crate::pipeline::diff::calculate_diff;
use crate::services::GalleryApi;
use crate::storage::{ItemStore, UpsertOutcome};

const PROGRESS_EVERY: usize = 10;

/// Orchestrates list → diff → fetch → persist.
pub struct SyncEngine {
    gallery: Arc<dyn GalleryApi>,
    store: Arc<dyn ItemStore>,
    throttle: ThrottlePolicy,
    running: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        gallery: Arc<dyn GalleryApi>,
        store: Arc<dyn ItemStore>,
        throttle: ThrottlePolicy,
    ) -> Self {
        Self {
            gallery,
            store,
            throttle,
            running: Mutex::new(()),
        }
    }

    /// Whether a run is currently executing.
    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Run one synchronization pass.
    ///
    /// Returns `Err` only when the run could not establish its baseline or
    /// complete the listing, or when another run is still executing.
    /// Per-item failures are reported through `SyncSummary::failed`.
    pub async fn sync(&self) -> Result<SyncSummary> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| AppError::SyncInProgress)?;

        let started = Instant::now();
        log::info!("Starting gallery sync");

        let existing = self.store.existing_ids().await.inspect_err(|e| {
            log::error!("Could not read stored identifiers: {}", e);
        })?;

        let listing = self.collect_listing().await?;
        let diff = calculate_diff(&listing, &existing);
        log::info!(
            "Discovered {} posts, {} already stored",
            diff.discovered.len(),
            diff.already_present()
        );

        let mut run = SyncRun {
            discovered: diff.discovered,
            new_ids: diff.added,
            outcomes: Vec::new(),
        };

        if run.new_ids.is_empty() {
            log::info!("No new posts to sync");
            return Ok(run.summarize(started.elapsed()));
        }

        let total = run.new_ids.len();
        log::info!("Syncing {} new posts", total);

        for (index, id) in run.new_ids.clone().iter().enumerate() {
            let outcome = self.sync_item(id).await;
            run.record(id, outcome);
            self.throttle.after_detail_fetch().await;

            if (index + 1) % PROGRESS_EVERY == 0 {
                log::info!("Progress: {}/{}", index + 1, total);
            }
        }

        let summary = run.summarize(started.elapsed());
        log::info!(
            "Sync finished: {}/{} new posts stored, {} failed in {:.1}s",
            summary.persisted,
            total,
            summary.failed,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    /// Page through the listing until an empty page.
    async fn collect_listing(&self) -> Result<Vec<ListingEntry>> {
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            let listing = self.gallery.list_page(page).await.inspect_err(|e| {
                log::error!("Listing page {} failed, aborting run: {}", page, e);
            })?;
            log::debug!("Listing page {}: {} posts", page, listing.entries.len());

            let last = listing.is_empty() || !listing.has_more;
            entries.extend(listing.entries);
            if last {
                break;
            }

            page += 1;
            self.throttle.after_listing_page().await;
        }

        Ok(entries)
    }

    /// Fetch and persist one new identifier. Never fails the run.
    async fn sync_item(&self, id: &str) -> ItemOutcome {
        let detail = match self.gallery.fetch_detail(id).await {
            Ok(detail) => detail,
            Err(e) => {
                log::warn!("Failed to fetch post {}: {}", id, e);
                return ItemOutcome::FetchFailed(e.to_string());
            }
        };

        let record = NewItem::from_detail(id, detail);
        match self.store.upsert(&record).await {
            Ok(UpsertOutcome::Inserted {
                images_stored,
                images_skipped,
            }) => {
                log::info!(
                    "Saved post {} ({} images, {} duplicates skipped)",
                    id,
                    images_stored,
                    images_skipped
                );
                ItemOutcome::Persisted {
                    images_stored,
                    images_skipped,
                }
            }
            Ok(UpsertOutcome::AlreadyPresent) => {
                log::debug!("Post {} was stored by another writer", id);
                ItemOutcome::AlreadyPresent
            }
            Err(e) => {
                log::warn!("Failed to save post {}: {}", id, e);
                ItemOutcome::PersistFailed(e.to_string())
            }
        }
    }
}
