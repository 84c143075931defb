use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::error::{AcquireError, AcquireResult};
use crate::rate_limit::RateLimiter;
use crate::types::Uint;

/// Token bucket that tops itself up inline on every admission check.
///
/// There is no background work. Each call computes how many whole refill
/// intervals have passed since the last top-up and credits `rate` tokens per
/// interval, capped at `capacity`, before deciding. A bucket that sits idle
/// for hours catches up in one step.
///
/// # Algorithm Behavior
///
/// - The bucket starts full with `capacity` tokens
/// - Only whole intervals count; a partial interval adds nothing and is not lost
/// - `last_refill` moves to "now" only when tokens were actually added
/// - A successful check consumes exactly one token
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use token_bucket_core::{LazyTokenBucket, ManualClock};
///
/// let clock = ManualClock::new();
/// let bucket = LazyTokenBucket::with_clock(5, 5, Duration::from_secs(1), clock.clone());
///
/// for _ in 0..5 {
///     assert!(bucket.try_acquire());
/// }
/// assert!(!bucket.try_acquire());
///
/// clock.advance(Duration::from_secs(1));
/// assert!(bucket.try_acquire());
/// ```
#[derive(Debug)]
pub struct LazyTokenBucket<C: Clock = SystemClock> {
    /// Tokens credited per elapsed interval
    rate: Uint,
    /// Maximum number of tokens the bucket can hold
    capacity: Uint,
    /// Length of one refill period
    interval: Duration,
    clock: C,
    /// Internal state protected by mutex for thread safety
    state: Mutex<LazyTokenBucketState>,
}

#[derive(Debug)]
struct LazyTokenBucketState {
    /// Current number of tokens available in the bucket
    tokens: Uint,
    /// Instant of the last top-up that actually added tokens
    last_refill: Instant,
}

impl LazyTokenBucketState {
    /// Credits whole elapsed intervals. Returns the time already spent toward
    /// the next interval boundary.
    fn refill(&mut self, now: Instant, rate: Uint, capacity: Uint, interval: Duration) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed < interval {
            return elapsed;
        }

        let periods = elapsed.as_nanos() / interval.as_nanos();
        let add = periods.saturating_mul(u128::from(rate));
        if add == 0 {
            return elapsed;
        }

        let add = Uint::try_from(add).unwrap_or(Uint::MAX);
        let before = self.tokens;
        self.tokens = self.tokens.saturating_add(add).min(capacity);
        self.last_refill = now;

        tracing::trace!(
            periods = %periods,
            before,
            after = self.tokens,
            "lazy refill"
        );
        Duration::ZERO
    }
}

impl LazyTokenBucket<SystemClock> {
    /// Creates a full bucket driven by the system clock.
    ///
    /// # Parameters
    ///
    /// * `rate` - Tokens added per elapsed `interval`
    /// * `capacity` - Maximum number of tokens the bucket can hold
    /// * `interval` - Refill period
    ///
    /// # Panics
    ///
    /// Panics if `rate` or `capacity` is zero, or `interval` is zero.
    pub fn new(rate: Uint, capacity: Uint, interval: Duration) -> Self {
        Self::with_clock(rate, capacity, interval, SystemClock)
    }
}

impl<C: Clock> LazyTokenBucket<C> {
    /// Creates a full bucket that reads time from `clock`.
    ///
    /// The last-refill timestamp starts at `clock.now()`.
    ///
    /// # Panics
    ///
    /// Panics if `rate` or `capacity` is zero, or `interval` is zero.
    pub fn with_clock(rate: Uint, capacity: Uint, interval: Duration, clock: C) -> Self {
        assert!(rate > 0, "rate must be greater than 0");
        assert!(capacity > 0, "capacity must be greater than 0");
        assert!(!interval.is_zero(), "interval must be greater than 0");

        let last_refill = clock.now();
        LazyTokenBucket {
            rate,
            capacity,
            interval,
            clock,
            state: Mutex::new(LazyTokenBucketState {
                tokens: capacity, // Bucket starts full
                last_refill,
            }),
        }
    }

    #[inline(always)]
    fn lock(&self) -> MutexGuard<'_, LazyTokenBucketState> {
        // State is consistent between statements, so a poisoned guard is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts to take one token, refilling first.
    ///
    /// The refill and the check-and-decrement happen under one lock, so two
    /// concurrent callers can never be granted the same token.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_verbose().is_ok()
    }

    /// Attempts to take one token, reporting how long to wait on denial.
    ///
    /// # Returns
    /// * `Ok(())` - One token was consumed
    /// * `Err(AcquireError::Exhausted { retry_after })` - The bucket is empty;
    ///   `retry_after` is the time left until the next interval boundary
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use token_bucket_core::{AcquireError, LazyTokenBucket, ManualClock};
    ///
    /// let clock = ManualClock::new();
    /// let bucket = LazyTokenBucket::with_clock(1, 1, Duration::from_secs(10), clock.clone());
    /// assert_eq!(bucket.try_acquire_verbose(), Ok(()));
    ///
    /// clock.advance(Duration::from_secs(4));
    /// match bucket.try_acquire_verbose() {
    ///     Err(AcquireError::Exhausted { retry_after }) => {
    ///         assert_eq!(retry_after, Duration::from_secs(6));
    ///     }
    ///     other => panic!("unexpected {:?}", other),
    /// }
    /// ```
    pub fn try_acquire_verbose(&self) -> AcquireResult {
        let mut state = self.lock();
        let now = self.clock.now();
        let progress = state.refill(now, self.rate, self.capacity, self.interval);

        if state.tokens > 0 {
            state.tokens -= 1;
            Ok(())
        } else {
            Err(AcquireError::Exhausted {
                retry_after: self.interval.saturating_sub(progress),
            })
        }
    }

    /// Refills, then returns the number of tokens currently in the bucket.
    #[inline]
    pub fn available(&self) -> Uint {
        let mut state = self.lock();
        let now = self.clock.now();
        state.refill(now, self.rate, self.capacity, self.interval);
        state.tokens
    }

    /// Tokens added per elapsed interval.
    #[inline(always)]
    pub fn rate(&self) -> Uint {
        self.rate
    }

    /// Maximum number of tokens the bucket can hold.
    #[inline(always)]
    pub fn capacity(&self) -> Uint {
        self.capacity
    }

    /// Refill period.
    #[inline(always)]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<C: Clock> RateLimiter for LazyTokenBucket<C> {
    #[inline(always)]
    fn try_acquire(&self) -> bool {
        LazyTokenBucket::try_acquire(self)
    }

    #[inline(always)]
    fn available(&self) -> Uint {
        LazyTokenBucket::available(self)
    }

    #[inline(always)]
    fn capacity(&self) -> Uint {
        self.capacity
    }
}
