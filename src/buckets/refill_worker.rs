//! Background refill worker for [`ActiveTokenBucket`](crate::ActiveTokenBucket).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender};

use crate::buckets::active_token_bucket::ActiveTokenBucketShared;
use crate::error::RefillError;

const WORKER_THREAD_NAME: &str = "token-bucket-refill";

/// Owns a running refill worker.
///
/// Stopping or dropping the handle signals the worker and joins it, so the
/// worker never outlives the scope holding the handle.
#[derive(Debug)]
#[must_use = "dropping the handle stops the refill worker"]
pub struct RefillHandle {
    shared: Arc<ActiveTokenBucketShared>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl RefillHandle {
    pub(crate) fn spawn(shared: Arc<ActiveTokenBucketShared>) -> Result<Self, RefillError> {
        let (stop_tx, stop_rx) = crossbeam::channel::bounded(1);
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_refill_loop(worker_shared, stop_rx))?;

        tracing::debug!(interval = ?shared.interval(), "refill worker started");
        Ok(RefillHandle {
            shared,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }

    /// Signals the worker to stop and waits for it to exit.
    ///
    /// # Returns
    /// * `Ok(())` - The worker exited cleanly
    /// * `Err(RefillError::WorkerPanicked)` - The worker thread panicked
    pub fn stop(mut self) -> Result<(), RefillError> {
        self.shutdown()
    }

    /// Whether the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn shutdown(&mut self) -> Result<(), RefillError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        if let Some(stop_tx) = self.stop_tx.take() {
            // A full or disconnected channel both mean the worker will exit.
            let _ = stop_tx.try_send(());
        }

        let joined = worker.join().map_err(|_| RefillError::WorkerPanicked);
        self.shared.refilling.store(false, Ordering::Release);
        tracing::debug!("refill worker stopped");
        joined
    }
}

impl Drop for RefillHandle {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!(error = %err, "refill worker did not stop cleanly");
        }
    }
}

fn run_refill_loop(shared: Arc<ActiveTokenBucketShared>, stop_rx: Receiver<()>) {
    let ticker = crossbeam::channel::tick(shared.interval());
    loop {
        crossbeam::select! {
            recv(ticker) -> _ => shared.refill(),
            // Stop request or handle gone
            recv(stop_rx) -> _ => break,
        }
    }
}
