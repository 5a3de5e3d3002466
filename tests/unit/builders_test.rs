//! Tests for builder modules

use std::time::Duration;

use orb_thread_pool::builders::{build_pools, PoolBuilder};
use orb_thread_pool::config::{ManagerConfig, PoolConfig};
use orb_thread_pool::core::PoolError;

#[test]
fn test_pool_builder_defaults() {
    let builder = PoolBuilder::new("pool1");
    assert_eq!(builder.name(), "pool1");
    assert_eq!(builder.config().min_workers, 0);
    assert_eq!(builder.config().max_workers, None);
}

#[test]
fn test_pool_builder_from_config() {
    let config = PoolConfig::bounded("pool2", 1, 3, Duration::from_secs(5));
    let pool = PoolBuilder::from_config(config)
        .stack_size(512 * 1024)
        .build()
        .unwrap();
    assert_eq!(pool.name(), "pool2");
    assert_eq!(pool.min_workers(), 1);
    assert_eq!(pool.max_workers(), Some(3));
    assert_eq!(pool.current_number_of_threads(), 1);
    pool.close();
}

#[test]
fn test_pool_builder_rejects_invalid() {
    let err = PoolBuilder::new("pool3").max_workers(0).build().unwrap_err();
    assert!(matches!(err, PoolError::InvalidConfig(_)));
}

#[test]
fn test_build_pools_starts_minimum_workers() {
    let mut cfg = ManagerConfig::default();
    cfg.default_pool = PoolConfig::bounded("orb", 2, 4, Duration::from_secs(5));
    cfg.pools.insert(
        "rpc".into(),
        PoolConfig::bounded("rpc", 1, 1, Duration::from_secs(5)),
    );

    let pools = build_pools(&cfg).unwrap();
    let threads: Vec<usize> = pools.iter().map(|p| p.current_number_of_threads()).collect();
    assert_eq!(threads, vec![2, 1]);
    for pool in &pools {
        pool.close();
        assert_eq!(pool.current_number_of_threads(), 0);
    }
}
