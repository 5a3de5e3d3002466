//! Tests for error types

use orb_thread_pool::core::PoolError;

#[test]
fn test_timeout_error() {
    let err = PoolError::Timeout;
    assert_eq!(format!("{}", err), "timed out waiting for work");
}

#[test]
fn test_cancelled_error() {
    let err = PoolError::Cancelled;
    assert_eq!(format!("{}", err), "wait for work was cancelled");
}

#[test]
fn test_not_found_error() {
    let err = PoolError::NotFound("rpc".to_string());
    assert_eq!(format!("{}", err), "pool not found: rpc");
}

#[test]
fn test_closed_error() {
    let err = PoolError::Closed("rpc-queue".to_string());
    assert_eq!(format!("{}", err), "closed: rpc-queue");
}

#[test]
fn test_invalid_config_error() {
    let err = PoolError::InvalidConfig("max_workers must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_workers must be greater than 0"
    );
}

#[test]
fn test_spawn_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
    let err: PoolError = io.into();
    assert!(matches!(err, PoolError::Spawn(_)));
    assert_eq!(format!("{}", err), "failed to spawn worker thread: no threads left");
}

#[test]
fn test_pool_error_converts_to_anyhow() {
    fn lookup() -> orb_thread_pool::core::AppResult<()> {
        Err(PoolError::NotFound("gone".into()))?;
        Ok(())
    }
    let err = lookup().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PoolError>(),
        Some(PoolError::NotFound(name)) if name == "gone"
    ));
}
