// src/crawl/rate_limit.rs
// =============================================================================
// Request pacing shared by every crawl worker.
//
// RateLimiter:
// - Spaces consecutive acquire() completions at least 1/rps apart
// - The spacing holds across ALL workers sharing the limiter: acquire()
//   holds an async gate while it sleeps, so callers queue up behind it
// - rps <= 0 means "unlimited" and acquire() returns immediately
//
// AdaptiveRateLimiter:
// - Same gate, but the rate moves with server health
// - error or slow response (> 5s)  -> rate x 0.8 (not below min_rps)
// - every 10th success             -> rate x 1.1 (not above max_rps)
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Responses slower than this count against the adaptive rate
pub const SLOW_RESPONSE_THRESHOLD: Duration = Duration::from_secs(5);

const DECREASE_FACTOR: f64 = 0.8;
const INCREASE_FACTOR: f64 = 1.1;
const INCREASE_EVERY: u64 = 10;

/// Longest spacing the limiter will enforce between two requests
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

/// Slowest positive rate that still fits within MAX_INTERVAL
pub const MIN_REQUESTS_PER_SECOND: f64 = 1.0 / 3600.0;

/// Something the crawler waits on before each fetch and reports outcomes to.
#[async_trait]
pub trait RequestPacer: Send + Sync {
    /// Waits until the next request may be sent
    async fn acquire(&self);

    /// A fetch succeeded after `elapsed`
    fn record_success(&self, _elapsed: Duration) {}

    /// A fetch failed
    fn record_error(&self) {}
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    requests_per_second: f64,
    min_interval: Duration,
}

impl Pacing {
    fn new(requests_per_second: f64) -> Self {
        // A vanishingly small rate would overflow Duration, so it is capped
        let min_interval = if requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second)
                .map_or(MAX_INTERVAL, |interval| interval.min(MAX_INTERVAL))
        } else {
            Duration::ZERO
        };
        Self {
            requests_per_second,
            min_interval,
        }
    }
}

/// Fixed-rate limiter
pub struct RateLimiter {
    pacing: Mutex<Pacing>,
    // Held across the sleep so concurrent callers are serialized
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            pacing: Mutex::new(Pacing::new(requests_per_second)),
            last_request: tokio::sync::Mutex::new(None),
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        self.pacing.lock().requests_per_second
    }

    pub fn min_interval(&self) -> Duration {
        self.pacing.lock().min_interval
    }

    /// Changes the rate; the next acquire() uses the new interval.
    pub fn set_rate(&self, requests_per_second: f64) {
        *self.pacing.lock() = Pacing::new(requests_per_second);
    }

    pub async fn acquire(&self) {
        if self.requests_per_second() <= 0.0 {
            return;
        }

        let mut last = self.last_request.lock().await;
        let min_interval = self.min_interval();
        if let Some(previous) = *last {
            let since = previous.elapsed();
            if since < min_interval {
                sleep(min_interval - since).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Forgets the last request so the next acquire() is immediate.
    pub async fn reset(&self) {
        *self.last_request.lock().await = None;
    }
}

#[async_trait]
impl RequestPacer for RateLimiter {
    async fn acquire(&self) {
        RateLimiter::acquire(self).await
    }
}

/// Counters reported by AdaptiveRateLimiter::stats()
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RateLimiterStats {
    pub current_rps: f64,
    pub success_count: u64,
    pub error_count: u64,
    pub slow_response_count: u64,
}

#[derive(Debug, Default)]
struct Counters {
    success: u64,
    error: u64,
    slow: u64,
}

/// Rate limiter that slows down on errors and speeds up while healthy
pub struct AdaptiveRateLimiter {
    limiter: RateLimiter,
    min_rps: f64,
    max_rps: f64,
    counters: Mutex<Counters>,
}

impl AdaptiveRateLimiter {
    // Parameters:
    //   initial_rps: starting rate, clamped into [min_rps, max_rps]
    //   min_rps:     slowest rate the limiter will fall to
    //   max_rps:     fastest rate the limiter will climb to
    pub fn new(initial_rps: f64, min_rps: f64, max_rps: f64) -> Self {
        let initial_rps = initial_rps.clamp(min_rps, max_rps);
        Self {
            limiter: RateLimiter::new(initial_rps),
            min_rps,
            max_rps,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        self.limiter.requests_per_second()
    }

    pub fn stats(&self) -> RateLimiterStats {
        let counters = self.counters.lock();
        RateLimiterStats {
            current_rps: self.requests_per_second(),
            success_count: counters.success,
            error_count: counters.error,
            slow_response_count: counters.slow,
        }
    }

    pub async fn reset(&self) {
        self.limiter.reset().await
    }

    fn decrease_rate(&self) {
        let rps = (self.requests_per_second() * DECREASE_FACTOR).max(self.min_rps);
        self.limiter.set_rate(rps);
        debug!(rps, "rate limit decreased");
    }

    fn increase_rate(&self) {
        let rps = (self.requests_per_second() * INCREASE_FACTOR).min(self.max_rps);
        self.limiter.set_rate(rps);
        debug!(rps, "rate limit increased");
    }
}

impl Default for AdaptiveRateLimiter {
    fn default() -> Self {
        Self::new(2.0, 0.1, 10.0)
    }
}

#[async_trait]
impl RequestPacer for AdaptiveRateLimiter {
    async fn acquire(&self) {
        self.limiter.acquire().await
    }

    fn record_success(&self, elapsed: Duration) {
        let (slow, nth_success) = {
            let mut counters = self.counters.lock();
            counters.success += 1;
            let slow = elapsed > SLOW_RESPONSE_THRESHOLD;
            if slow {
                counters.slow += 1;
            }
            (slow, counters.success % INCREASE_EVERY == 0)
        };

        if slow {
            self.decrease_rate();
        } else if nth_success {
            self.increase_rate();
        }
    }

    fn record_error(&self) {
        self.counters.lock().error += 1;
        self.decrease_rate();
    }
}
