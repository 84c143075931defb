//! A thread-safe token bucket rate limiter.
//!
//! A bucket holds up to `capacity` tokens and starts full. Each admission
//! check takes one token or reports that none are left; tokens come back at
//! `rate` per `interval`. The check never blocks waiting for tokens, so a
//! `false` is the caller's cue to reject, queue, or retry later.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use token_bucket_core::LazyTokenBucket;
//!
//! // 10 tokens per second, bursts of up to 20
//! let limiter = LazyTokenBucket::new(10, 20, Duration::from_secs(1));
//!
//! if limiter.try_acquire() {
//!     println!("Request allowed");
//! } else {
//!     println!("Request denied");
//! }
//! ```
//!
//! # Refill Strategies
//!
//! ## [Lazy](buckets::LazyTokenBucket)
//! Tops up inline on each check from the number of whole intervals elapsed.
//! No background work; time comes from an injectable [`Clock`]:
//! ```rust
//! # use std::time::Duration;
//! # use token_bucket_core::{LazyTokenBucket, ManualClock};
//! let clock = ManualClock::new();
//! let limiter = LazyTokenBucket::with_clock(5, 5, Duration::from_secs(1), clock.clone());
//! ```
//!
//! ## [Active](buckets::ActiveTokenBucket)
//! A background worker adds `rate` tokens every `interval`; the check only
//! tests and decrements:
//! ```rust
//! # use std::time::Duration;
//! # use token_bucket_core::ActiveTokenBucket;
//! let limiter = ActiveTokenBucket::new(5, 5, Duration::from_secs(1));
//! let refill = limiter.start_refill().unwrap();
//! // ... the worker stops when `refill` is stopped or dropped
//! refill.stop().unwrap();
//! ```
//!
//! # Many Keys
//!
//! One bucket guards one budget. Callers that limit per client or per
//! endpoint keep one bucket per key, for example as `Box<dyn RateLimiter>`
//! built from a [`TokenBucketConfig`].
//!
//! # Thread Safety
//!
//! All buckets are `Send + Sync`. Refill and check-and-decrement run under a
//! single per-bucket mutex, so concurrent callers never share a token and
//! the token count stays within `[0, capacity]`.

pub mod buckets;
pub mod clock;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod types;

pub use buckets::{ActiveTokenBucket, LazyTokenBucket, RefillHandle};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RefillStrategy, TokenBucket, TokenBucketConfig};
pub use error::{AcquireError, AcquireResult, ConfigError, RefillError};
pub use rate_limit::RateLimiter;
pub use types::Uint;
