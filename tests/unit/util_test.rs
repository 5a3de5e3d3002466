//! Tests for utility functions

use std::time::Duration;

use orb_thread_pool::util::{average_ms, now_ms, DEFAULT_LOG_FILTER};

#[test]
fn test_average_ms() {
    assert!((average_ms(Duration::from_millis(300), 3) - 100.0).abs() < 1e-9);
}

#[test]
fn test_average_ms_no_samples() {
    assert!(average_ms(Duration::from_secs(5), 0).abs() < f64::EPSILON);
}

#[test]
fn test_now_ms_advances() {
    let before = now_ms();
    std::thread::sleep(Duration::from_millis(5));
    assert!(now_ms() >= before + 5);
}

#[test]
fn test_default_log_filter_targets_crate() {
    assert!(DEFAULT_LOG_FILTER.starts_with("orb_thread_pool"));
}
