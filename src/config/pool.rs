//! Pool and manager configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the pool every manager owns.
pub const DEFAULT_POOL_NAME: &str = "default-threadpool";

/// Idle timeout applied when none is configured (two minutes).
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 120_000;

/// How long `close` waits for workers before detaching them.
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 2_000;

const fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT_MS
}

const fn default_close_timeout_ms() -> u64 {
    DEFAULT_CLOSE_TIMEOUT_MS
}

/// Worker thread pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool name; also the prefix of worker thread names.
    pub name: String,
    /// Workers kept alive even when idle. Spawned at construction.
    #[serde(default)]
    pub min_workers: usize,
    /// Upper bound on live workers; `None` means unbounded.
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// How long an idle worker waits for work before it may exit.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Stack size for worker threads; platform default when `None`.
    #[serde(default)]
    pub thread_stack_size: Option<usize>,
    /// How long `close` waits for workers to exit.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::unbounded(DEFAULT_POOL_NAME)
    }
}

impl PoolConfig {
    /// Unbounded pool: no pre-spawned workers, no cap, default idle timeout.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_workers: 0,
            max_workers: None,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            thread_stack_size: None,
            close_timeout_ms: DEFAULT_CLOSE_TIMEOUT_MS,
        }
    }

    /// Bounded pool with explicit limits.
    pub fn bounded(
        name: impl Into<String>,
        min_workers: usize,
        max_workers: usize,
        idle_timeout: Duration,
    ) -> Self {
        Self::unbounded(name)
            .with_min_workers(min_workers)
            .with_max_workers(Some(max_workers))
            .with_idle_timeout(idle_timeout)
    }

    /// Set the pool name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the minimum worker count.
    #[must_use]
    pub fn with_min_workers(mut self, min_workers: usize) -> Self {
        self.min_workers = min_workers;
        self
    }

    /// Set the maximum worker count (`None` for unbounded).
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = whole_millis(timeout);
        self
    }

    /// Set the worker stack size.
    #[must_use]
    pub fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = Some(size);
        self
    }

    /// Set how long `close` waits for workers.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout_ms = whole_millis(timeout);
        self
    }

    /// Idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Close timeout as a `Duration`.
    #[must_use]
    pub const fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// Whether the pool has a worker cap.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.max_workers.is_some()
    }

    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.name.as_bytes().contains(&0) {
            return Err("name must not contain null bytes".into());
        }
        if let Some(max) = self.max_workers {
            if max == 0 {
                return Err("max_workers must be greater than 0".into());
            }
            if max < self.min_workers {
                return Err(format!(
                    "max_workers ({max}) must be >= min_workers ({})",
                    self.min_workers
                ));
            }
        }
        if self.idle_timeout_ms == 0 {
            return Err("idle_timeout_ms must be greater than 0".into());
        }
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root configuration for a [`PoolManager`](crate::core::PoolManager).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// The pool returned for ids that name no other pool.
    #[serde(default)]
    pub default_pool: PoolConfig,
    /// Additional pools keyed by name; the key overrides `PoolConfig::name`.
    #[serde(default)]
    pub pools: HashMap<String, PoolConfig>,
    /// Reject unknown pool ids with `NotFound` instead of falling back to the
    /// default pool.
    #[serde(default)]
    pub strict_lookup: bool,
}

impl ManagerConfig {
    /// Validate every pool and reject names that collide with the default.
    pub fn validate(&self) -> Result<(), String> {
        self.default_pool
            .validate()
            .map_err(|e| format!("default pool invalid: {e}"))?;
        for (name, pool) in &self.pools {
            if name == &self.default_pool.name {
                return Err(format!("pool `{name}` shadows the default pool"));
            }
            pool.clone()
                .with_name(name.clone())
                .validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse manager configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load the default pool settings from the process environment.
    ///
    /// A `.env` file is read first if present. Recognised variables:
    /// `ORB_POOL_NAME`, `ORB_POOL_MIN_WORKERS`, `ORB_POOL_MAX_WORKERS`
    /// (an integer or `unbounded`) and `ORB_POOL_IDLE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ManagerConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let pool = &mut cfg.default_pool;

        if let Some(name) = lookup("ORB_POOL_NAME") {
            pool.name = name;
        }
        if let Some(min) = lookup("ORB_POOL_MIN_WORKERS") {
            pool.min_workers = parse_var("ORB_POOL_MIN_WORKERS", &min)?;
        }
        if let Some(max) = lookup("ORB_POOL_MAX_WORKERS") {
            pool.max_workers = if max.trim().eq_ignore_ascii_case("unbounded") {
                None
            } else {
                Some(parse_var("ORB_POOL_MAX_WORKERS", &max)?)
            };
        }
        if let Some(timeout) = lookup("ORB_POOL_IDLE_TIMEOUT_MS") {
            pool.idle_timeout_ms = parse_var("ORB_POOL_IDLE_TIMEOUT_MS", &timeout)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

/// Milliseconds in `d`, rounded up so a non-zero duration never becomes 0,
/// saturating at `u64::MAX`.
fn whole_millis(d: Duration) -> u64 {
    let ms = d.as_millis() + u128::from(d.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(ms).unwrap_or(u64::MAX)
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{key}={value:?}: {e}"))
}
