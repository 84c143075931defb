//! error.rs
//! Error and result types for admission checks, refill workers and configuration.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Reason an admission check was denied, with diagnostics.
///
/// Denial is not a fault: it is the backpressure signal. Callers reject,
/// queue, or retry after `retry_after`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// The bucket is empty.
    #[error("no tokens available, next refill in {retry_after:?}")]
    Exhausted {
        /// Time until the next refill period boundary.
        retry_after: Duration,
    },
}

/// Result type for verbose admission checks.
pub type AcquireResult = Result<(), AcquireError>;

/// Errors from starting or stopping a background refill worker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RefillError {
    /// A refill worker is already running for this bucket.
    #[error("refill worker already running for this bucket")]
    AlreadyRunning,
    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn refill worker: {0}")]
    Spawn(#[from] io::Error),
    /// The worker thread panicked before it could be joined.
    #[error("refill worker panicked")]
    WorkerPanicked,
}

/// Invalid bucket configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("rate must be greater than 0")]
    ZeroRate,
    #[error("capacity must be greater than 0")]
    ZeroCapacity,
    #[error("interval must be greater than 0")]
    ZeroInterval,
}
