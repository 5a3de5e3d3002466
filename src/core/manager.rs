//! Process-wide registry of thread pools.
//!
//! A manager always owns one default pool and, optionally, named pools from
//! its configuration. Lookups are permissive by default: any id that does not
//! name a registered pool resolves to the default pool, which is how ORB
//! components have always obtained "their" pool. Set
//! [`ManagerConfig::strict_lookup`] to get `NotFound` instead.
//!
//! `close` must not race with `submit` calls on the managed pools; that is a
//! caller precondition and is not checked.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::info;

use super::{PoolError, ThreadPool};
use crate::builders::build_pools;
use crate::config::ManagerConfig;

/// Identifies a pool inside a [`PoolManager`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolId {
    /// Lookup by pool name.
    Name(String),
    /// Lookup by the small integer id assigned at registration.
    Index(usize),
}

impl From<&str> for PoolId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for PoolId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for PoolId {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}

static GLOBAL: OnceLock<PoolManager> = OnceLock::new();

/// Owner of the default pool and any named pools.
pub struct PoolManager {
    /// Pools in id order; index 0 is the default pool. Fixed after construction.
    pools: Vec<Arc<ThreadPool>>,
    strict_lookup: bool,
    closed: AtomicBool,
}

impl PoolManager {
    /// Build every pool described by `config`.
    ///
    /// # Errors
    ///
    /// `PoolError::InvalidConfig` or `PoolError::Spawn` from pool construction.
    pub fn new(config: &ManagerConfig) -> Result<Self, PoolError> {
        let pools = build_pools(config)?;
        info!(
            pools = pools.len(),
            default_pool = %config.default_pool.name,
            strict_lookup = config.strict_lookup,
            "pool manager started"
        );
        Ok(Self {
            pools: pools.into_iter().map(Arc::new).collect(),
            strict_lookup: config.strict_lookup,
            closed: AtomicBool::new(false),
        })
    }

    /// Manager owning only the standard unbounded default pool.
    #[must_use]
    pub fn with_default_pool() -> Self {
        let default = ManagerConfig::default();
        // An unbounded pool starts no threads, so assembling it cannot fail.
        let pool = ThreadPool::assemble(default.default_pool, 0);
        Self {
            pools: vec![Arc::new(pool)],
            strict_lookup: false,
            closed: AtomicBool::new(false),
        }
    }

    /// The process-wide manager, created with [`PoolManager::with_default_pool`]
    /// on first use.
    ///
    /// Closing it is permanent for the life of the process.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::with_default_pool)
    }

    /// Resolve `id` to a pool.
    ///
    /// Unknown ids return the default pool unless strict lookup is enabled.
    ///
    /// # Errors
    ///
    /// - `PoolError::Closed` after [`PoolManager::close`]
    /// - `PoolError::NotFound` for unknown ids under strict lookup
    pub fn get_pool(&self, id: impl Into<PoolId>) -> Result<Arc<ThreadPool>, PoolError> {
        let id = id.into();
        if self.is_closed() {
            return Err(PoolError::Closed(format!("pool manager (looking up {id})")));
        }

        let found = match &id {
            PoolId::Index(index) => self.pools.get(*index),
            PoolId::Name(name) => self.pools.iter().find(|pool| pool.name() == name),
        };

        match found {
            Some(pool) => Ok(Arc::clone(pool)),
            None if self.strict_lookup => Err(PoolError::NotFound(id.to_string())),
            None => Ok(self.default_pool()),
        }
    }

    /// The default pool (id 0).
    #[must_use]
    pub fn default_pool(&self) -> Arc<ThreadPool> {
        Arc::clone(&self.pools[0])
    }

    /// Names of all managed pools in id order.
    #[must_use]
    pub fn pool_names(&self) -> Vec<String> {
        self.pools.iter().map(|pool| pool.name().to_owned()).collect()
    }

    /// Number of managed pools, the default included.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Whether [`PoolManager::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close every managed pool. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for pool in &self.pools {
            pool.close();
        }
        info!(pools = self.pools.len(), "pool manager closed");
    }
}

impl fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolManager")
            .field("pools", &self.pool_names())
            .field("strict_lookup", &self.strict_lookup)
            .field("closed", &self.is_closed())
            .finish()
    }
}
