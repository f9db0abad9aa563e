//! Pacing between remote calls.
//!
//! The gallery service starts throttling clients that hit it in tight
//! loops, so the sync engine waits a fixed delay between listing pages and
//! after every detail fetch. Tests inject [`ThrottlePolicy::none`].

use std::time::Duration;

use crate::models::SyncConfig;

/// Minimum delays between successive remote calls of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Wait between two listing page requests
    pub listing_delay: Duration,
    /// Wait after each detail fetch attempt
    pub detail_delay: Duration,
}

impl ThrottlePolicy {
    pub const fn new(listing_delay: Duration, detail_delay: Duration) -> Self {
        Self {
            listing_delay,
            detail_delay,
        }
    }

    /// No waiting at all.
    pub const fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            Duration::from_millis(config.listing_delay_ms),
            Duration::from_millis(config.detail_delay_ms),
        )
    }

    pub async fn after_listing_page(&self) {
        pause(self.listing_delay).await;
    }

    pub async fn after_detail_fetch(&self) {
        pause(self.detail_delay).await;
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), Duration::from_millis(500))
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_from_config_matches_default() {
        let policy = ThrottlePolicy::from_config(&SyncConfig::default());
        assert_eq!(policy, ThrottlePolicy::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_pause_waits() {
        let policy = ThrottlePolicy::default();
        let start = Instant::now();
        policy.after_detail_fetch().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_does_not_wait() {
        let start = Instant::now();
        ThrottlePolicy::none().after_listing_page().await;
        ThrottlePolicy::none().after_detail_fetch().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
