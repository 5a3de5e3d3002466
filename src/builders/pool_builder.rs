//! Builders to construct thread pools from configuration.

use std::time::Duration;

use crate::config::{ManagerConfig, PoolConfig};
use crate::core::{PoolError, ThreadPool};

/// Build the default pool (id 0) followed by the named pools in name order.
///
/// Pools already started are closed again if a later one fails.
///
/// # Errors
///
/// `PoolError::InvalidConfig` if `cfg` does not validate, or any error from
/// [`ThreadPool::new`].
pub fn build_pools(cfg: &ManagerConfig) -> Result<Vec<ThreadPool>, PoolError> {
    cfg.validate().map_err(PoolError::InvalidConfig)?;

    let mut names: Vec<&String> = cfg.pools.keys().collect();
    names.sort();

    let mut pools = Vec::with_capacity(names.len() + 1);
    pools.push(ThreadPool::with_id(cfg.default_pool.clone(), 0)?);

    for (offset, name) in names.into_iter().enumerate() {
        let pool_cfg = cfg.pools[name].clone().with_name(name.clone());
        match ThreadPool::with_id(pool_cfg, offset + 1) {
            Ok(pool) => pools.push(pool),
            Err(e) => {
                for pool in &pools {
                    pool.close();
                }
                return Err(e);
            }
        }
    }

    Ok(pools)
}

/// Fluent construction of a single [`ThreadPool`].
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    config: PoolConfig,
}

impl PoolBuilder {
    /// Start from an unbounded pool named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: PoolConfig::unbounded(name),
        }
    }

    /// Start from an existing configuration.
    #[must_use]
    pub const fn from_config(config: PoolConfig) -> Self {
        Self { config }
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration built so far.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Workers kept alive (and started up front).
    #[must_use]
    pub fn min_workers(mut self, min: usize) -> Self {
        self.config.min_workers = min;
        self
    }

    /// Cap on live workers.
    #[must_use]
    pub fn max_workers(mut self, max: usize) -> Self {
        self.config.max_workers = Some(max);
        self
    }

    /// Remove the worker cap.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.config.max_workers = None;
        self
    }

    /// How long idle workers wait before they may exit.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_idle_timeout(timeout);
        self
    }

    /// Worker thread stack size.
    #[must_use]
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.thread_stack_size = Some(size);
        self
    }

    /// How long `close` waits for workers.
    #[must_use]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_close_timeout(timeout);
        self
    }

    /// Validate the configuration and start the pool.
    ///
    /// # Errors
    ///
    /// Same as [`ThreadPool::new`].
    pub fn build(self) -> Result<ThreadPool, PoolError> {
        ThreadPool::new(self.config)
    }
}
