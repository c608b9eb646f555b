//! Login rate limiter for slowing down credential brute force

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Ban duration once the window is exhausted
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

impl RateLimiterConfig {
    /// Create a RateLimiterConfig from environment variables, falling back
    /// to the defaults above.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |var: &str, fallback: u64| {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            max_attempts: read("LOGIN_MAX_ATTEMPTS", defaults.max_attempts as u64) as u32,
            window_seconds: read("LOGIN_WINDOW_SECONDS", defaults.window_seconds),
            ban_duration_seconds: read("LOGIN_BAN_SECONDS", defaults.ban_duration_seconds),
        }
    }
}

#[derive(Debug)]
struct AttemptEntry {
    attempts: u32,
    last_attempt: Instant,
    ban_expires: Option<Instant>,
}

/// In-memory limiter keyed by login identity
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, AttemptEntry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and report whether it may proceed.
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(AttemptEntry {
            attempts: 0,
            last_attempt: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.attempts = 0;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.duration_since(entry.last_attempt) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.attempts = 0;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Banned login key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        entry.last_attempt = now;
        true
    }

    /// Forget a key after a successful login.
    pub async fn record_success(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        })
    }

    #[tokio::test]
    async fn allows_up_to_the_limit_then_bans() {
        let limiter = limiter(3);
        for _ in 0..3 {
            assert!(limiter.is_allowed("alice").await);
        }
        assert!(!limiter.is_allowed("alice").await);
        // banned until the ban expires, not just over-limit
        assert!(!limiter.is_allowed("alice").await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = limiter(1);
        assert!(limiter.is_allowed("alice").await);
        assert!(limiter.is_allowed("bob").await);
        assert!(!limiter.is_allowed("alice").await);
    }

    #[tokio::test]
    async fn success_clears_the_counter() {
        let limiter = limiter(2);
        assert!(limiter.is_allowed("alice").await);
        assert!(limiter.is_allowed("alice").await);
        limiter.record_success("alice").await;
        assert!(limiter.is_allowed("alice").await);
    }
}
