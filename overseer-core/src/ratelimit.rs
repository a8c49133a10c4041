//! Sliding-window rate limiter guarding AI calls.
//!
//! Window-by-reset counting: the first request for a fresh or expired
//! identifier opens a window; subsequent requests within the window
//! increment a counter up to the budget, after which requests are denied
//! until the window resets. Expired entries are swept lazily on each
//! check — no background timer. Not persisted; this is abuse mitigation,
//! not billing-accurate accounting.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Budget for one endpoint class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl RateLimitConfig {
    /// Construct a budget of `max_requests` per `window_ms`.
    #[must_use]
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// When the current window resets (milliseconds).
    pub reset_at_ms: u64,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up. Zero when already
    /// reset. This is the `retryAfter` hint surfaced to denied callers.
    #[must_use]
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at_ms.saturating_sub(now_ms).div_ceil(1000)
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at_ms: u64,
}

/// In-memory per-identifier request counter.
///
/// Identifiers are typically `"<endpoint>:<client-ip>"`. The check-and-
/// increment is synchronous; it is not atomic across an await, which is an
/// accepted relaxation at single-player scale.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: HashMap<String, Window>,
}

impl RateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and record a request for `identifier` under `config`.
    pub fn check(
        &mut self,
        identifier: &str,
        config: &RateLimitConfig,
        now_ms: u64,
    ) -> RateLimitDecision {
        // Amortized cleanup: drop every expired window, not just this one.
        self.windows.retain(|_, w| w.reset_at_ms > now_ms);

        let window = self
            .windows
            .entry(identifier.to_string())
            .or_insert_with(|| Window {
                count: 0,
                reset_at_ms: now_ms + config.window_ms,
            });

        if window.count >= config.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at_ms: window.reset_at_ms,
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: config.max_requests - window.count,
            reset_at_ms: window.reset_at_ms,
        }
    }

    /// Number of live windows (test/diagnostic hook).
    #[must_use]
    pub fn tracked_identifiers(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: RateLimitConfig = RateLimitConfig {
        max_requests: 3,
        window_ms: 60_000,
    };

    #[test]
    fn allows_up_to_budget_then_denies() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check("chat:1.2.3.4", &CONFIG, 0).allowed);
        assert!(limiter.check("chat:1.2.3.4", &CONFIG, 1_000).allowed);
        assert!(limiter.check("chat:1.2.3.4", &CONFIG, 2_000).allowed);

        let denied = limiter.check("chat:1.2.3.4", &CONFIG, 3_000);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_secs(3_000), 57);
    }

    #[test]
    fn window_resets_after_expiry() {
        let mut limiter = RateLimiter::new();
        for t in 0..3 {
            assert!(limiter.check("x", &CONFIG, t).allowed);
        }
        assert!(!limiter.check("x", &CONFIG, 100).allowed);

        // Past reset_at the counter starts over.
        let fresh = limiter.check("x", &CONFIG, 60_001);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2);
    }

    #[test]
    fn identifiers_are_independent() {
        let mut limiter = RateLimiter::new();
        for t in 0..3 {
            assert!(limiter.check("a", &CONFIG, t).allowed);
        }
        assert!(!limiter.check("a", &CONFIG, 10).allowed);
        assert!(limiter.check("b", &CONFIG, 10).allowed);
    }

    #[test]
    fn expired_windows_are_swept_lazily() {
        let mut limiter = RateLimiter::new();
        let _ = limiter.check("a", &CONFIG, 0);
        let _ = limiter.check("b", &CONFIG, 0);
        assert_eq!(limiter.tracked_identifiers(), 2);

        // A check far in the future sweeps both stale windows.
        let _ = limiter.check("c", &CONFIG, 120_000);
        assert_eq!(limiter.tracked_identifiers(), 1);
    }

    #[test]
    fn remaining_counts_down() {
        let mut limiter = RateLimiter::new();
        assert_eq!(limiter.check("x", &CONFIG, 0).remaining, 2);
        assert_eq!(limiter.check("x", &CONFIG, 0).remaining, 1);
        assert_eq!(limiter.check("x", &CONFIG, 0).remaining, 0);
    }
}
