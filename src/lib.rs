//! # ORB Thread Pool
//!
//! A bounded, self-shrinking worker thread pool for an ORB-style runtime.
//!
//! Producers on any thread hand units of work to a pool; the pool queues them
//! in strict FIFO order, runs them on OS worker threads, starts more workers
//! when work outpaces idle ones (up to an optional cap) and lets surplus
//! workers exit after an idle timeout. A process-wide [`core::PoolManager`]
//! owns the default pool.
//!
//! ## Key Features
//!
//! - **FIFO work queue**: blocking dequeue with a fixed deadline, tolerant of
//!   spurious wake-ups, with admission and residency counters
//! - **Demand-driven workers**: lazily started, capped when bounded, retired
//!   when idle above the minimum
//! - **Failure isolation**: a task that errors or panics is logged and counted;
//!   its worker keeps serving
//! - **Monitoring counters**: thread counts, busy/idle split, completion time,
//!   queue depth and time-in-queue, all read under the owning lock
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use orb_thread_pool::core::{PoolManager, Task, ThreadPool};
//!
//! let pool = ThreadPool::bounded("rpc", 2, 8, Duration::from_secs(60)).unwrap();
//! pool.submit(Task::from_fn("dispatch", || Ok(()))).unwrap();
//! println!("threads: {}", pool.current_number_of_threads());
//! pool.close();
//!
//! // Components that do not own a pool ask the manager for one.
//! let manager = PoolManager::with_default_pool();
//! let default = manager.get_pool("anything").unwrap();
//! assert_eq!(default.name(), "default-threadpool");
//! manager.close();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Work queue, thread pool and pool manager.
pub mod core;
/// Configuration models for pools and the manager.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
