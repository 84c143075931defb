use std::thread;
use std::time::{Duration, Instant};

use token_bucket_core::{ActiveTokenBucket, RefillError};

/// Polls `cond` until it holds or `timeout` passes.
fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

fn drain(bucket: &ActiveTokenBucket) -> u64 {
    let mut passed = 0;
    while bucket.try_acquire() {
        passed += 1;
    }
    passed
}

#[test]
#[should_panic(expected = "rate must be greater than 0")]
fn test_new_with_zero_rate() {
    ActiveTokenBucket::new(0, 10, Duration::from_secs(1));
}

#[test]
#[should_panic(expected = "interval must be greater than 0")]
fn test_new_with_zero_interval() {
    ActiveTokenBucket::new(1, 10, Duration::ZERO);
}

#[test]
fn test_initial_burst() {
    let bucket = ActiveTokenBucket::new(1, 5, Duration::from_secs(1));
    assert_eq!(bucket.available(), 5);
    for _ in 0..5 {
        assert!(bucket.try_acquire());
    }
    assert!(!bucket.try_acquire());
    assert_eq!(bucket.available(), 0);
}

#[test]
fn test_no_refill_without_worker() {
    let bucket = ActiveTokenBucket::new(5, 5, Duration::from_millis(5));
    assert_eq!(drain(&bucket), 5);

    thread::sleep(Duration::from_millis(30));
    assert!(!bucket.try_acquire());
}

#[test]
fn test_manual_refill_steps() {
    let bucket = ActiveTokenBucket::new(3, 10, Duration::from_secs(1));
    assert_eq!(drain(&bucket), 10);

    bucket.refill();
    assert_eq!(bucket.available(), 3);
    bucket.refill();
    bucket.refill();
    assert_eq!(bucket.available(), 9);

    // Clamped at capacity
    bucket.refill();
    assert_eq!(bucket.available(), 10);
    bucket.refill();
    assert_eq!(bucket.available(), 10);
}

#[test]
fn test_background_refill_converges() {
    let bucket = ActiveTokenBucket::new(4, 4, Duration::from_millis(10));
    assert_eq!(drain(&bucket), 4);

    let handle = bucket.start_refill().unwrap();
    assert!(wait_until(Duration::from_secs(2), || bucket.available() == 4));
    handle.stop().unwrap();

    assert_eq!(drain(&bucket), 4);
}

#[test]
fn test_background_refill_never_exceeds_capacity() {
    let bucket = ActiveTokenBucket::new(3, 10, Duration::from_millis(5));
    assert_eq!(drain(&bucket), 10);

    let handle = bucket.start_refill().unwrap();
    assert!(wait_until(Duration::from_secs(2), || bucket.available() >= 3));
    thread::sleep(Duration::from_millis(50));
    assert!(bucket.available() <= 10);
    handle.stop().unwrap();
}

#[test]
fn test_double_start_is_rejected() {
    let bucket = ActiveTokenBucket::new(1, 1, Duration::from_millis(10));
    let handle = bucket.start_refill().unwrap();

    assert!(matches!(bucket.start_refill(), Err(RefillError::AlreadyRunning)));

    // Clones share the guard
    let clone = bucket.clone();
    assert!(matches!(clone.start_refill(), Err(RefillError::AlreadyRunning)));

    handle.stop().unwrap();
}

#[test]
fn test_stop_halts_refill() {
    let bucket = ActiveTokenBucket::new(1, 100, Duration::from_millis(5));
    let handle = bucket.start_refill().unwrap();
    assert!(bucket.is_refilling());
    handle.stop().unwrap();
    assert!(!bucket.is_refilling());

    assert_eq!(drain(&bucket), 100);
    thread::sleep(Duration::from_millis(40));
    assert_eq!(bucket.available(), 0);
}

#[test]
fn test_restart_after_stop() {
    let bucket = ActiveTokenBucket::new(2, 2, Duration::from_millis(5));
    bucket.start_refill().unwrap().stop().unwrap();

    assert_eq!(drain(&bucket), 2);
    let handle = bucket.start_refill().unwrap();
    assert!(wait_until(Duration::from_secs(2), || bucket.available() == 2));
    drop(handle);
    assert!(!bucket.is_refilling());
}

#[test]
fn test_one_tick_adds_exactly_rate() {
    let bucket = ActiveTokenBucket::new(2, 10, Duration::from_millis(200));
    assert_eq!(drain(&bucket), 10);

    let handle = bucket.start_refill().unwrap();

    // The first tick lands at ~200ms, the second at ~400ms
    assert!(wait_until(Duration::from_secs(2), || bucket.available() > 0));
    assert_eq!(bucket.available(), 2);

    thread::sleep(Duration::from_millis(50));
    assert_eq!(bucket.available(), 2);
    handle.stop().unwrap();
}

#[test]
fn test_refill_is_skipped_when_full() {
    let bucket = ActiveTokenBucket::new(3, 5, Duration::from_secs(1));
    bucket.refill();
    assert_eq!(bucket.available(), 5);
}

#[test]
fn test_clones_share_one_budget() {
    let a = ActiveTokenBucket::new(1, 2, Duration::from_secs(1));
    let b = a.clone();
    assert!(a.try_acquire());
    assert!(b.try_acquire());
    assert!(!a.try_acquire());
    assert!(!b.try_acquire());
}

#[test]
fn test_drop_stops_worker() {
    let bucket = ActiveTokenBucket::new(1, 1, Duration::from_millis(5));
    {
        let handle = bucket.start_refill().unwrap();
        assert!(handle.is_running());
        assert!(bucket.is_refilling());
    }
    assert!(!bucket.is_refilling());

    let handle = bucket.start_refill().unwrap();
    handle.stop().unwrap();
}
