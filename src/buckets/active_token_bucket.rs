use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::buckets::refill_worker::RefillHandle;
use crate::error::RefillError;
use crate::rate_limit::RateLimiter;
use crate::types::Uint;

/// Token bucket refilled by a background worker on a fixed schedule.
///
/// The admission check never looks at the clock: it only tests and
/// decrements under the lock. Tokens come back solely through [`refill`],
/// which the worker started by [`start_refill`] calls once per `interval`.
///
/// Clones share the same bucket, so handing a clone to each caller gives
/// them one common budget.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use token_bucket_core::ActiveTokenBucket;
///
/// let bucket = ActiveTokenBucket::new(2, 4, Duration::from_millis(100));
/// for _ in 0..4 {
///     assert!(bucket.try_acquire());
/// }
/// assert!(!bucket.try_acquire());
///
/// // Drive one refill step by hand
/// bucket.refill();
/// assert_eq!(bucket.available(), 2);
/// ```
///
/// [`refill`]: ActiveTokenBucket::refill
/// [`start_refill`]: ActiveTokenBucket::start_refill
#[derive(Debug, Clone)]
pub struct ActiveTokenBucket {
    pub(crate) shared: Arc<ActiveTokenBucketShared>,
}

#[derive(Debug)]
pub(crate) struct ActiveTokenBucketShared {
    /// Tokens added per tick
    rate: Uint,
    /// Maximum number of tokens the bucket can hold
    capacity: Uint,
    /// Tick period of the refill worker
    interval: Duration,
    /// Current number of tokens available in the bucket
    tokens: Mutex<Uint>,
    /// Set while a refill worker owns this bucket
    pub(crate) refilling: AtomicBool,
}

impl ActiveTokenBucketShared {
    #[inline(always)]
    fn lock(&self) -> MutexGuard<'_, Uint> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One refill step: `tokens = min(capacity, tokens + rate)`.
    pub(crate) fn refill(&self) {
        let mut tokens = self.lock();
        if *tokens < self.capacity {
            let before = *tokens;
            *tokens = tokens.saturating_add(self.rate).min(self.capacity);
            tracing::trace!(before, after = *tokens, "active refill");
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }
}

impl ActiveTokenBucket {
    /// Creates a full bucket. No refill happens until [`start_refill`] is
    /// called or [`refill`] is driven by the host.
    ///
    /// # Parameters
    ///
    /// * `rate` - Tokens added per tick
    /// * `capacity` - Maximum number of tokens the bucket can hold
    /// * `interval` - Tick period of the refill worker
    ///
    /// # Panics
    ///
    /// Panics if `rate` or `capacity` is zero, or `interval` is zero.
    ///
    /// [`start_refill`]: ActiveTokenBucket::start_refill
    /// [`refill`]: ActiveTokenBucket::refill
    pub fn new(rate: Uint, capacity: Uint, interval: Duration) -> Self {
        assert!(rate > 0, "rate must be greater than 0");
        assert!(capacity > 0, "capacity must be greater than 0");
        assert!(!interval.is_zero(), "interval must be greater than 0");

        ActiveTokenBucket {
            shared: Arc::new(ActiveTokenBucketShared {
                rate,
                capacity,
                interval,
                tokens: Mutex::new(capacity), // Bucket starts full
                refilling: AtomicBool::new(false),
            }),
        }
    }

    /// Attempts to take one token. No time computation happens here.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        let mut tokens = self.shared.lock();
        if *tokens > 0 {
            *tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Performs one refill step, exactly what each background tick does.
    ///
    /// Exposed for hosts that schedule refill themselves instead of using
    /// [`start_refill`](ActiveTokenBucket::start_refill).
    #[inline]
    pub fn refill(&self) {
        self.shared.refill();
    }

    /// Starts the background refill worker and returns immediately.
    ///
    /// At most one worker runs per bucket (clones included). The worker stops
    /// when the returned handle is stopped or dropped; the bucket can then be
    /// started again.
    ///
    /// # Returns
    /// * `Ok(RefillHandle)` - The worker is running
    /// * `Err(RefillError::AlreadyRunning)` - Another worker owns this bucket
    /// * `Err(RefillError::Spawn)` - The worker thread could not be created
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use token_bucket_core::{ActiveTokenBucket, RefillError};
    ///
    /// let bucket = ActiveTokenBucket::new(10, 10, Duration::from_millis(50));
    /// let handle = bucket.start_refill().unwrap();
    /// assert!(matches!(bucket.start_refill(), Err(RefillError::AlreadyRunning)));
    /// handle.stop().unwrap();
    /// assert!(!bucket.is_refilling());
    /// ```
    pub fn start_refill(&self) -> Result<RefillHandle, RefillError> {
        if self
            .shared
            .refilling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RefillError::AlreadyRunning);
        }

        RefillHandle::spawn(Arc::clone(&self.shared)).map_err(|err| {
            self.shared.refilling.store(false, Ordering::Release);
            err
        })
    }

    /// Whether a refill worker is currently running for this bucket.
    #[inline]
    pub fn is_refilling(&self) -> bool {
        self.shared.refilling.load(Ordering::Acquire)
    }

    /// Returns the number of tokens currently in the bucket.
    #[inline]
    pub fn available(&self) -> Uint {
        *self.shared.lock()
    }

    /// Tokens added per tick.
    #[inline(always)]
    pub fn rate(&self) -> Uint {
        self.shared.rate
    }

    /// Maximum number of tokens the bucket can hold.
    #[inline(always)]
    pub fn capacity(&self) -> Uint {
        self.shared.capacity
    }

    /// Tick period of the refill worker.
    #[inline(always)]
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }
}

impl RateLimiter for ActiveTokenBucket {
    #[inline(always)]
    fn try_acquire(&self) -> bool {
        ActiveTokenBucket::try_acquire(self)
    }

    #[inline(always)]
    fn available(&self) -> Uint {
        ActiveTokenBucket::available(self)
    }

    #[inline(always)]
    fn capacity(&self) -> Uint {
        self.shared.capacity
    }
}
