//! Tests for configuration validation

use std::time::Duration;

use orb_thread_pool::config::{
    ManagerConfig, PoolConfig, DEFAULT_CLOSE_TIMEOUT_MS, DEFAULT_IDLE_TIMEOUT_MS,
    DEFAULT_POOL_NAME,
};

#[test]
fn test_pool_config_validation() {
    let valid = PoolConfig {
        name: "rpc".into(),
        min_workers: 2,
        max_workers: Some(8),
        idle_timeout_ms: 1_000,
        thread_stack_size: None,
        close_timeout_ms: 500,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_name() {
    assert!(PoolConfig::unbounded("").validate().is_err());
    assert!(PoolConfig::unbounded("bad\0name").validate().is_err());
}

#[test]
fn test_pool_config_invalid_max_workers() {
    let zero = PoolConfig::unbounded("p").with_max_workers(Some(0));
    assert!(zero.validate().is_err());

    let below_min = PoolConfig::bounded("p", 4, 2, Duration::from_secs(1));
    assert!(below_min.validate().is_err());

    let equal = PoolConfig::bounded("p", 2, 2, Duration::from_secs(1));
    assert!(equal.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_timeout() {
    let invalid = PoolConfig::unbounded("p").with_idle_timeout(Duration::ZERO);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_stack_size() {
    let invalid = PoolConfig {
        thread_stack_size: Some(0),
        ..PoolConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_json_defaults() {
    let cfg: PoolConfig = serde_json::from_str(r#"{ "name": "lean" }"#).unwrap();
    assert_eq!(cfg.min_workers, 0);
    assert_eq!(cfg.max_workers, None);
    assert_eq!(cfg.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    assert_eq!(cfg.close_timeout_ms, DEFAULT_CLOSE_TIMEOUT_MS);
    assert_eq!(cfg.thread_stack_size, None);
}

#[test]
fn test_manager_config_default() {
    let cfg = ManagerConfig::default();
    assert_eq!(cfg.default_pool.name, DEFAULT_POOL_NAME);
    assert!(cfg.pools.is_empty());
    assert!(!cfg.strict_lookup);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_manager_config_rejects_invalid_named_pool() {
    let mut cfg = ManagerConfig::default();
    cfg.pools.insert(
        "rpc".into(),
        PoolConfig::unbounded("rpc").with_idle_timeout(Duration::ZERO),
    );
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("rpc"), "unexpected error: {err}");
}

#[test]
fn test_manager_config_from_lookup() {
    let cfg = ManagerConfig::from_lookup(|key| match key {
        "ORB_POOL_NAME" => Some("orb".into()),
        "ORB_POOL_MIN_WORKERS" => Some("1".into()),
        "ORB_POOL_MAX_WORKERS" => Some("6".into()),
        "ORB_POOL_IDLE_TIMEOUT_MS" => Some("2500".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(cfg.default_pool.name, "orb");
    assert_eq!(cfg.default_pool.min_workers, 1);
    assert_eq!(cfg.default_pool.max_workers, Some(6));
    assert_eq!(cfg.default_pool.idle_timeout(), Duration::from_millis(2500));
}

#[test]
fn test_manager_config_from_lookup_validates() {
    let result = ManagerConfig::from_lookup(|key| match key {
        "ORB_POOL_MIN_WORKERS" => Some("5".into()),
        "ORB_POOL_MAX_WORKERS" => Some("2".into()),
        _ => None,
    });
    assert!(result.is_err());
}
