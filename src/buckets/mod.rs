//! Token bucket implementations, one per refill strategy.
//!
//! # Available Strategies
//!
//! - **[`LazyTokenBucket`]** - Refills inline on every admission check from elapsed time
//! - **[`ActiveTokenBucket`]** - Refilled by a background worker on a fixed tick
//!
//! # Strategy Comparison
//!
//! | Strategy | Background work | Hot path | Idle catch-up |
//! |----------|-----------------|----------|---------------|
//! | Lazy | None | Reads clock, integer division | One step |
//! | Active | One thread per started bucket | Test and decrement only | One tick at a time |
//!
//! Pick one strategy per bucket. Driving a lazy bucket from a ticker, or
//! adding elapsed-time math to an active one, credits the same interval twice.
//!
//! # Thread Safety
//!
//! Each bucket guards its mutable state with a single mutex held for O(1)
//! work, so the admission check is linearizable and never waits on I/O.

pub mod lazy_token_bucket;
pub use lazy_token_bucket::LazyTokenBucket;

pub mod active_token_bucket;
pub use active_token_bucket::ActiveTokenBucket;

pub mod refill_worker;
pub use refill_worker::RefillHandle;
