//! Per-caller token bucket admission control.
//!
//! Checked after a cache miss and before the breaker, so over-budget
//! callers are turned away without touching the network.

use dashmap::DashMap;
use tokio::time::Instant;

use llmgate_types::config::BucketConfig;

/// Token bucket for one caller key.
///
/// Invariant: `0 <= tokens <= capacity`. Tokens rise only through
/// elapsed-time refill and fall only when a call is admitted.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_second: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket.
    pub fn new(config: &BucketConfig, now: Instant) -> Self {
        Self {
            capacity: config.capacity,
            tokens: config.capacity,
            refill_per_second: config.refill_per_second,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }

    /// Refill for the time since the last check, then take `cost` tokens
    /// if enough are available. Negative or non-finite costs are refused.
    pub fn allow(&mut self, cost: f64, now: Instant) -> bool {
        if !cost.is_finite() || cost < 0.0 {
            return false;
        }
        self.refill(now);
        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }

    /// Tokens that would be available at `now`, without mutating the bucket.
    pub fn available(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * self.refill_per_second).min(self.capacity)
    }
}

/// Lazily-populated map of caller key to token bucket.
#[derive(Debug)]
pub struct RateLimiter {
    config: BucketConfig,
    buckets: DashMap<String, TokenBucket>,
}

impl RateLimiter {
    pub fn new(config: BucketConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    /// Try to admit a call of `cost` for `caller`.
    ///
    /// The refill-check-deduct sequence runs under the caller's entry
    /// guard, so concurrent calls cannot spend the same tokens twice.
    pub fn allow(&self, caller: &str, cost: f64) -> bool {
        let now = Instant::now();
        let mut bucket = self
            .buckets
            .entry(caller.to_string())
            .or_insert_with(|| TokenBucket::new(&self.config, now));
        bucket.allow(cost, now)
    }

    /// Tokens currently available to `caller`; `None` if the caller has
    /// never been seen (its bucket would start full).
    pub fn available(&self, caller: &str) -> Option<f64> {
        self.buckets.get(caller).map(|b| b.available(Instant::now()))
    }

    pub fn capacity(&self) -> f64 {
        self.config.capacity
    }
}
