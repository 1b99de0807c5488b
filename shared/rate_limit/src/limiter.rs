//! Rate limiter contract and result types

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Maximum number of requests allowed in the window
    pub limit: u32,
    /// Number of requests remaining in the current window
    pub remaining: u32,
    /// Unix timestamp when the rate limit resets
    pub reset_at: u64,
    /// Seconds until the rate limit resets
    pub retry_after: u64,
}

impl RateLimitResult {
    pub fn allowed(limit: u32, remaining: u32, reset_at: u64) -> Self {
        let retry_after = reset_at.saturating_sub(now_secs());
        Self {
            allowed: true,
            limit,
            remaining,
            reset_at,
            retry_after,
        }
    }

    pub fn denied(limit: u32, reset_at: u64) -> Self {
        let retry_after = reset_at.saturating_sub(now_secs());
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_at,
            retry_after,
        }
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Error types for rate limiting operations
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Rate limit store contract
///
/// `check_rate_limit` is increment-and-count over a sliding window. The
/// in-process store implements it over a map of timestamp logs; a shared
/// store (for horizontally scaled deployments) can implement the same
/// contract without touching callers.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether a request is allowed and record it if so
    async fn check_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Reset the rate limit for a specific key
    async fn reset(&self, key: &str) -> Result<(), RateLimitError>;

    /// Current count for a key without incrementing
    async fn get_count(&self, key: &str, window: Duration) -> Result<u32, RateLimitError>;
}

/// Key generator for rate limiting
///
/// Raw IPs and emails are hashed before they become map keys so the
/// limiter state never stores them directly.
pub struct KeyGenerator;

impl KeyGenerator {
    pub fn ip_key(prefix: &str, ip: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(ip.as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("{}:{}", prefix, &hash[..16])
    }

    pub fn email_key(prefix: &str, email: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(email.to_lowercase().as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("{}:{}", prefix, &hash[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_result_allowed() {
        let reset_at = now_secs() + 60;
        let result = RateLimitResult::allowed(10, 5, reset_at);
        assert!(result.allowed);
        assert_eq!(result.limit, 10);
        assert_eq!(result.remaining, 5);
        assert!(result.retry_after <= 60);
    }

    #[test]
    fn test_rate_limit_result_denied_has_retry_after() {
        let reset_at = now_secs() + 900;
        let result = RateLimitResult::denied(5, reset_at);
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        assert!(result.retry_after > 0);
    }

    #[test]
    fn test_key_generator_ip() {
        let key1 = KeyGenerator::ip_key("rate_limit:auth:ip", "192.168.1.1");
        let key2 = KeyGenerator::ip_key("rate_limit:auth:ip", "192.168.1.1");
        let key3 = KeyGenerator::ip_key("rate_limit:auth:ip", "192.168.1.2");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert!(key1.starts_with("rate_limit:auth:ip:"));
    }

    #[test]
    fn test_key_generator_email_case_insensitive() {
        let key1 = KeyGenerator::email_key("rate_limit:reset", "User@Example.COM");
        let key2 = KeyGenerator::email_key("rate_limit:reset", "user@example.com");
        assert_eq!(key1, key2);
    }
}
