//! Work queue, worker thread pool and pool manager.

pub mod error;
pub mod manager;
pub mod stats;
pub mod task;
pub mod thread_pool;
pub mod work_queue;

pub use error::{AppResult, PoolError};
pub use manager::{PoolId, PoolManager};
pub use stats::{PoolStats, QueueStats};
pub use task::{Task, Work};
pub use thread_pool::ThreadPool;
pub use work_queue::WorkQueue;
