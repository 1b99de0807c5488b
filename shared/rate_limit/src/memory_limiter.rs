//! In-memory rate limiter using a sliding window log

use crate::limiter::{now_secs, RateLimitError, RateLimitResult, RateLimiter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Entry tracking request timestamps for one key
#[derive(Debug, Clone, Default)]
struct RateLimitEntry {
    /// Timestamps of requests within the window
    timestamps: Vec<u64>,
}

impl RateLimitEntry {
    /// Drop timestamps that fell out of the window
    fn cleanup(&mut self, window_start: u64) {
        self.timestamps.retain(|&ts| ts >= window_start);
    }

    fn newest(&self) -> u64 {
        self.timestamps.iter().copied().max().unwrap_or(0)
    }
}

/// Process-local sliding-window-log limiter
///
/// State is per process; horizontally scaled deployments need sticky IPs or
/// a shared store behind the same `RateLimiter` contract.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    store: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Remove entries whose newest timestamp has fallen out of `window`
    pub async fn sweep_once(&self, window: Duration) -> usize {
        let cutoff = now_secs().saturating_sub(window.as_secs());
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| entry.newest() >= cutoff);
        let removed = before - store.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = store.len(), "rate limit sweep");
        }
        removed
    }

    /// Spawn the background sweeper
    ///
    /// Runs every `every`, dropping fully expired entries. Not required for
    /// correctness (expiry is also checked at use time), it only bounds
    /// memory.
    pub fn spawn_sweeper(&self, window: Duration, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                limiter.sweep_once(window).await;
            }
        })
    }

    #[cfg(test)]
    async fn backdate(&self, key: &str, secs: u64) {
        let mut store = self.store.write().await;
        if let Some(entry) = store.get_mut(key) {
            for ts in entry.timestamps.iter_mut() {
                *ts = ts.saturating_sub(secs);
            }
        }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitResult, RateLimitError> {
        let now = now_secs();
        let window_secs = window.as_secs();
        let window_start = now.saturating_sub(window_secs);

        let mut store = self.store.write().await;
        let entry = store.entry(key.to_string()).or_default();
        entry.cleanup(window_start);

        let current_count = entry.timestamps.len() as u32;

        if current_count >= max_requests {
            // Window resets when the oldest recorded request ages out
            let oldest = entry.timestamps.iter().copied().min().unwrap_or(now);
            let reset_at = oldest + window_secs;
            Ok(RateLimitResult::denied(max_requests, reset_at))
        } else {
            entry.timestamps.push(now);
            let remaining = max_requests.saturating_sub(current_count + 1);
            Ok(RateLimitResult::allowed(
                max_requests,
                remaining,
                now + window_secs,
            ))
        }
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn get_count(&self, key: &str, window: Duration) -> Result<u32, RateLimitError> {
        let window_start = now_secs().saturating_sub(window.as_secs());
        let store = self.store.read().await;
        Ok(store
            .get(key)
            .map(|entry| {
                entry
                    .timestamps
                    .iter()
                    .filter(|&&ts| ts >= window_start)
                    .count() as u32
            })
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_basic_rate_limiting() {
        let limiter = InMemoryRateLimiter::new();
        let key = "test:user:1";

        for i in 0..3 {
            let result = limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
            assert!(result.allowed, "request {} should be allowed", i + 1);
            assert_eq!(result.remaining, 2 - i);
        }

        let result = limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
        assert!(!result.allowed, "4th request should be denied");
        assert_eq!(result.remaining, 0);
        assert!(result.retry_after > 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let limiter = InMemoryRateLimiter::new();
        let key = "test:reset";

        for _ in 0..3 {
            limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
        }
        let result = limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
        assert!(!result.allowed);

        limiter.reset(key).await.unwrap();

        let result = limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn test_get_count() {
        let limiter = InMemoryRateLimiter::new();
        let key = "test:count";

        assert_eq!(limiter.get_count(key, WINDOW).await.unwrap(), 0);

        limiter.check_rate_limit(key, 10, WINDOW).await.unwrap();
        assert_eq!(limiter.get_count(key, WINDOW).await.unwrap(), 1);

        limiter.check_rate_limit(key, 10, WINDOW).await.unwrap();
        assert_eq!(limiter.get_count(key, WINDOW).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_different_keys_independent() {
        let limiter = InMemoryRateLimiter::new();

        for _ in 0..3 {
            limiter.check_rate_limit("key1", 3, WINDOW).await.unwrap();
        }

        let result = limiter.check_rate_limit("key2", 3, WINDOW).await.unwrap();
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_stale_entries() {
        let limiter = InMemoryRateLimiter::new();
        limiter.check_rate_limit("stale", 5, WINDOW).await.unwrap();
        limiter.check_rate_limit("fresh", 5, WINDOW).await.unwrap();

        // Age the first entry past the window
        limiter.backdate("stale", 120).await;

        let removed = limiter.sweep_once(WINDOW).await;
        assert_eq!(removed, 1);
        assert_eq!(limiter.get_count("fresh", WINDOW).await.unwrap(), 1);
        assert_eq!(
            limiter
                .get_count("stale", Duration::from_secs(3600))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = InMemoryRateLimiter::new();
        let key = "test:slide";

        for _ in 0..3 {
            limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
        }
        let result = limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
        assert!(!result.allowed);

        // Once the recorded requests age out, the key admits traffic again
        limiter.backdate(key, 120).await;
        let result = limiter.check_rate_limit(key, 3, WINDOW).await.unwrap();
        assert!(result.allowed);
    }
}
