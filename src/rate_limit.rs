//! Core trait for token bucket rate limiters.
//!
//! Both refill strategies implement [`RateLimiter`], so a host that keeps one
//! bucket per key can store them as `Box<dyn RateLimiter>` without caring how
//! each one refills.

pub use crate::types::Uint;

/// The trait implemented by every bucket in this crate.
pub trait RateLimiter: Send + Sync {
    /// Attempts to take one token.
    ///
    /// # Returns
    /// * `true` if the caller may proceed; exactly one token was consumed
    /// * `false` if the bucket is empty; no state changed
    fn try_acquire(&self) -> bool;

    /// Returns the number of tokens that could be acquired right now.
    fn available(&self) -> Uint;

    /// Maximum number of tokens the bucket can hold.
    fn capacity(&self) -> Uint;
}

impl<R: RateLimiter + ?Sized> RateLimiter for std::sync::Arc<R> {
    #[inline(always)]
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }

    #[inline(always)]
    fn available(&self) -> Uint {
        (**self).available()
    }

    #[inline(always)]
    fn capacity(&self) -> Uint {
        (**self).capacity()
    }
}
