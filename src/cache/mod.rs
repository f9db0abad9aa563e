//! Expiring key-value cache for read-path memoization.
//!
//! Readers share the lock; `set`, `delete`, `clear` and the periodic sweep
//! take it exclusively. Expired entries are misses even before a sweep
//! removes them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// A cache whose entries carry their own time-to-live.
pub trait ExpiringCache<V>: Send + Sync {
    /// Live value for `key`, if any.
    fn get(&self, key: &str) -> Option<V>;

    fn set(&self, key: &str, value: V, ttl: Duration);

    fn delete(&self, key: &str);

    fn clear(&self);

    /// Drop expired entries and return how many were removed.
    fn sweep(&self) -> usize;
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process [`ExpiringCache`] backed by a guarded map.
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic sweep task. Must be called inside a tokio runtime.
    pub fn start_sweeper(&self, every: Duration) -> CacheSweeper {
        let entries = Arc::clone(&self.entries);
        let (shutdown, mut stop) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; nothing can have expired yet.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = sweep_entries(&entries);
                        if removed > 0 {
                            log::debug!("Cache sweep removed {} expired entries", removed);
                        }
                    }
                    _ = &mut stop => break,
                }
            }
        });

        CacheSweeper {
            shutdown: Some(shutdown),
            task,
        }
    }
}

fn sweep_entries<V>(entries: &RwLock<HashMap<String, Entry<V>>>) -> usize {
    let now = Instant::now();
    let mut map = entries.write().unwrap_or_else(PoisonError::into_inner);
    let before = map.len();
    map.retain(|_, entry| entry.expires_at > now);
    before - map.len()
}

impl<V> ExpiringCache<V> for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<V> {
        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        map.get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn sweep(&self) -> usize {
        sweep_entries(&self.entries)
    }
}

/// Handle to a running sweep task.
pub struct CacheSweeper {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl CacheSweeper {
    /// Stop sweeping and wait for the task to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            log::warn!("Cache sweeper ended abnormally: {}", e);
        }
    }
}
