//! Configuration models for pools and the pool manager.

pub mod pool;

pub use pool::{
    ManagerConfig, PoolConfig, DEFAULT_CLOSE_TIMEOUT_MS, DEFAULT_IDLE_TIMEOUT_MS,
    DEFAULT_POOL_NAME,
};
