//! Sync run bookkeeping.

use std::time::Duration;

use serde::Serialize;

/// What happened to one new identifier during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Item and its non-colliding images were committed
    Persisted { images_stored: usize, images_skipped: usize },
    /// Another writer stored the identifier first
    AlreadyPresent,
    /// Detail request failed
    FetchFailed(String),
    /// Upsert transaction failed
    PersistFailed(String),
}

/// State of a single synchronization pass. Dropped at the end of the run.
#[derive(Debug, Default)]
pub struct SyncRun {
    /// Unique identifiers seen on the listing, in discovery order
    pub discovered: Vec<String>,
    /// Subset of `discovered` absent from the store
    pub new_ids: Vec<String>,
    /// Outcome per processed identifier, in processing order
    pub outcomes: Vec<(String, ItemOutcome)>,
}

impl SyncRun {
    pub fn record(&mut self, id: &str, outcome: ItemOutcome) {
        self.outcomes.push((id.to_string(), outcome));
    }

    /// Collapse the run into its summary.
    pub fn summarize(&self, elapsed: Duration) -> SyncSummary {
        let mut summary = SyncSummary {
            discovered: self.discovered.len(),
            already_present: self.discovered.len() - self.new_ids.len(),
            elapsed,
            ..SyncSummary::default()
        };

        for (id, outcome) in &self.outcomes {
            match outcome {
                ItemOutcome::Persisted { .. } => summary.persisted += 1,
                ItemOutcome::AlreadyPresent => summary.already_present += 1,
                ItemOutcome::FetchFailed(_) | ItemOutcome::PersistFailed(_) => {
                    summary.failed += 1;
                    summary.failed_ids.push(id.clone());
                }
            }
        }

        summary
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Unique identifiers found on the remote listing
    pub discovered: usize,
    /// Identifiers that were already stored
    pub already_present: usize,
    /// Items committed by this run
    pub persisted: usize,
    /// Items whose fetch or persist failed
    pub failed: usize,
    pub failed_ids: Vec<String>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SyncSummary {
    /// Whether every new item made it into the store.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Key/value rows for log output.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Discovered", self.discovered.to_string()),
            ("Already present", self.already_present.to_string()),
            ("Persisted", self.persisted.to_string()),
            ("Failed", self.failed.to_string()),
            ("Elapsed", format!("{:.1}s", self.elapsed.as_secs_f64())),
        ]
    }
}
