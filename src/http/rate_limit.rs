//! Rate limiting implementation
//!
//! Uses the governor crate for token bucket rate limiting. A [`RateGate`] is a
//! cheap-to-clone handle over one shared bucket; every clone draws from the
//! same budget.

use crate::error::{Error, Result};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Requests per minute allowed by the standard tier
pub const STANDARD_REQUESTS_PER_MINUTE: u32 = 500;

/// Requests per minute allowed by the pro tier
pub const PRO_REQUESTS_PER_MINUTE: u32 = 1000;

/// Configuration for a rate budget
///
/// `capacity` tokens refill evenly over `window_ms`, one token every
/// `window_ms / capacity` milliseconds. A full bucket admits `capacity`
/// requests at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateGateConfig {
    /// Bucket size, also the number of requests per window
    pub capacity: u32,
    /// Refill window in milliseconds
    pub window_ms: u64,
}

impl Default for RateGateConfig {
    fn default() -> Self {
        Self::per_minute(STANDARD_REQUESTS_PER_MINUTE)
    }
}

impl RateGateConfig {
    /// Create a new rate budget config
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window_ms: window.as_millis() as u64,
        }
    }

    /// `capacity` requests per second
    pub fn per_second(capacity: u32) -> Self {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// `capacity` requests per minute
    pub fn per_minute(capacity: u32) -> Self {
        Self::new(capacity, Duration::from_secs(60))
    }

    /// Interval after which a single token is replenished
    pub fn refill_interval(&self) -> Duration {
        let window = Duration::from_millis(self.window_ms.max(1));
        window / self.capacity.max(1)
    }
}

/// Named rate budgets for the upstream API tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    /// 500 requests per minute
    #[default]
    Standard,
    /// 1000 requests per minute
    Pro,
}

impl RateTier {
    /// Budget for this tier
    pub fn config(self) -> RateGateConfig {
        match self {
            RateTier::Standard => RateGateConfig::per_minute(STANDARD_REQUESTS_PER_MINUTE),
            RateTier::Pro => RateGateConfig::per_minute(PRO_REQUESTS_PER_MINUTE),
        }
    }
}

/// Shared token bucket rate gate
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    config: RateGateConfig,
}

impl RateGate {
    /// Create a new rate gate with the given config
    pub fn new(config: &RateGateConfig) -> Self {
        let one = NonZeroU32::MIN;
        let burst = NonZeroU32::new(config.capacity).unwrap_or(one);
        let quota = Quota::with_period(config.refill_interval())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: Arc::new(Governor::direct(quota)),
            config: *config,
        }
    }

    /// Create a rate gate for a named tier
    pub fn for_tier(tier: RateTier) -> Self {
        Self::new(&tier.config())
    }

    /// Budget this gate was built with
    pub fn config(&self) -> &RateGateConfig {
        &self.config
    }

    /// Wait for a token, or fail with [`Error::Cancelled`] once `cancel` fires
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            () = self.limiter.until_ready() => Ok(()),
        }
    }

    /// Try to take a token, returning immediately
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::for_tier(RateTier::default())
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
