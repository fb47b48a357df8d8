use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Gas-price cache freshness window.
pub const GAS_PRICE_TTL_MILLIS: u64 = 15_000;

/// Per-contract energy-factor cache freshness window.
pub const ENERGY_FACTOR_TTL_MILLIS: u64 = 600_000;

/// Monotonic clock and cooperative sleep, injected into the provider and
/// signer so tests can substitute a deterministic fake.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Milliseconds on a monotonically non-decreasing, process-local scale.
    fn now_millis(&self) -> u64;

    /// Suspend the calling task for at least `millis` without blocking others.
    async fn sleep_millis(&self, millis: u64);
}

/// Real clock backed by `Instant` and `tokio::time::sleep`.
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    async fn sleep_millis(&self, millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// A value paired with the timestamp it was cached at.
///
/// A read either returns the cached value (still fresh) or a freshly fetched
/// one; a refresh always overwrites the cell with the current timestamp.
#[derive(Debug, Clone)]
pub struct Cached<V> {
    pub cached_at: u64,
    pub value: V,
}

impl<V> Cached<V> {
    pub fn new(now: u64, value: V) -> Self {
        Self {
            cached_at: now,
            value,
        }
    }

    /// Fresh iff `now - cached_at < ttl`.
    pub fn is_fresh(&self, now: u64, ttl_millis: u64) -> bool {
        now.saturating_sub(self.cached_at) < ttl_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_freshness_window() {
        let cell = Cached::new(1_000, 42u64);
        assert!(cell.is_fresh(1_000, 15_000));
        assert!(cell.is_fresh(15_999, 15_000));
        assert!(!cell.is_fresh(16_000, 15_000));
        assert!(!cell.is_fresh(16_001, 15_000));
    }

    #[test]
    fn test_cached_clock_regression_is_fresh() {
        // A non-decreasing clock can still report the same instant twice.
        let cell = Cached::new(500, "price");
        assert!(cell.is_fresh(500, 1));
    }
}
