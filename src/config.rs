//! Bucket configuration and strategy selection.
//!
//! A [`TokenBucketConfig`] is plain data, typically deserialized from the
//! host's own config file. [`TokenBucket::try_from`] validates it and builds
//! a bucket of the requested [`RefillStrategy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buckets::{ActiveTokenBucket, LazyTokenBucket, RefillHandle};
use crate::error::{ConfigError, RefillError};
use crate::rate_limit::RateLimiter;
use crate::types::Uint;

/// How a bucket gets its tokens back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillStrategy {
    /// Refill inline on every admission check.
    #[default]
    Lazy,
    /// Refill from a background worker once per interval.
    Active,
}

/// Configuration structure for creating a [`TokenBucket`].
///
/// ```
/// use token_bucket_core::{RefillStrategy, TokenBucketConfig};
///
/// let config: TokenBucketConfig = serde_json::from_str(
///     r#"{ "rate": 100, "capacity": 200, "interval": { "secs": 1, "nanos": 0 }, "strategy": "active" }"#,
/// ).unwrap();
/// assert_eq!(config.strategy, RefillStrategy::Active);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBucketConfig {
    /// Tokens added per interval.
    pub rate: Uint,
    /// Maximum number of tokens the bucket can hold.
    pub capacity: Uint,
    /// Refill period. Serialized losslessly as `{ "secs", "nanos" }`, so
    /// sub-millisecond intervals survive a round trip.
    pub interval: Duration,
    /// Refill strategy, `lazy` when omitted.
    #[serde(default)]
    pub strategy: RefillStrategy,
}

impl TokenBucketConfig {
    /// Creates a lazy-refill configuration.
    pub fn new(rate: Uint, capacity: Uint, interval: Duration) -> Self {
        Self {
            rate,
            capacity,
            interval,
            strategy: RefillStrategy::Lazy,
        }
    }

    /// Replaces the refill strategy.
    pub fn with_strategy(mut self, strategy: RefillStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Checks that every field is usable.
    ///
    /// `capacity < rate` is accepted but logged: each refill would be clipped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }

        if self.capacity < self.rate {
            warn!(
                rate = self.rate,
                capacity = self.capacity,
                "capacity is below rate; refills will be clipped to capacity"
            );
        }

        debug!(
            rate = self.rate,
            capacity = self.capacity,
            interval = ?self.interval,
            strategy = ?self.strategy,
            "token bucket configuration valid"
        );
        Ok(())
    }
}

/// A bucket of either refill strategy, chosen at configuration time.
#[derive(Debug)]
pub enum TokenBucket {
    Lazy(LazyTokenBucket),
    Active(ActiveTokenBucket),
}

impl TokenBucket {
    /// Starts background refill for an active bucket.
    ///
    /// # Returns
    /// * `Ok(None)` - Lazy buckets need no worker
    /// * `Ok(Some(handle))` - The worker is running
    /// * `Err(RefillError)` - See [`ActiveTokenBucket::start_refill`]
    pub fn start_refill(&self) -> Result<Option<RefillHandle>, RefillError> {
        match self {
            TokenBucket::Lazy(_) => Ok(None),
            TokenBucket::Active(bucket) => bucket.start_refill().map(Some),
        }
    }

    /// Which strategy this bucket uses.
    pub fn strategy(&self) -> RefillStrategy {
        match self {
            TokenBucket::Lazy(_) => RefillStrategy::Lazy,
            TokenBucket::Active(_) => RefillStrategy::Active,
        }
    }
}

impl RateLimiter for TokenBucket {
    #[inline]
    fn try_acquire(&self) -> bool {
        match self {
            TokenBucket::Lazy(bucket) => bucket.try_acquire(),
            TokenBucket::Active(bucket) => bucket.try_acquire(),
        }
    }

    #[inline]
    fn available(&self) -> Uint {
        match self {
            TokenBucket::Lazy(bucket) => bucket.available(),
            TokenBucket::Active(bucket) => bucket.available(),
        }
    }

    #[inline]
    fn capacity(&self) -> Uint {
        match self {
            TokenBucket::Lazy(bucket) => bucket.capacity(),
            TokenBucket::Active(bucket) => bucket.capacity(),
        }
    }
}

impl TryFrom<TokenBucketConfig> for TokenBucket {
    type Error = ConfigError;

    /// Validates `config` and builds the bucket. Active buckets are returned
    /// without a running worker.
    ///
    /// ```
    /// use std::time::Duration;
    /// use token_bucket_core::{RateLimiter, TokenBucket, TokenBucketConfig};
    ///
    /// let bucket = TokenBucket::try_from(TokenBucketConfig::new(5, 5, Duration::from_secs(1))).unwrap();
    /// assert_eq!(bucket.available(), 5);
    /// ```
    fn try_from(config: TokenBucketConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        let interval = config.interval;
        Ok(match config.strategy {
            RefillStrategy::Lazy => {
                TokenBucket::Lazy(LazyTokenBucket::new(config.rate, config.capacity, interval))
            }
            RefillStrategy::Active => {
                TokenBucket::Active(ActiveTokenBucket::new(config.rate, config.capacity, interval))
            }
        })
    }
}
