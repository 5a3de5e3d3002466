//! Read-only counter snapshots for monitoring collaborators.

use serde::{Deserialize, Serialize};

/// Work queue counters captured under the queue lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Queue name.
    pub name: String,
    /// Total tasks ever admitted.
    pub work_items_added: u64,
    /// Total tasks ever handed to a worker.
    pub work_items_dequeued: u64,
    /// Tasks pending at snapshot time.
    pub work_items_in_queue: usize,
    /// Mean residency time of dequeued tasks (ms).
    pub average_time_in_queue_ms: f64,
}

/// Pool counters captured under the pool lock, plus its queue's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Pool name.
    pub name: String,
    /// Pool id within its manager.
    pub pool_id: usize,
    /// Live worker threads.
    pub current_threads: usize,
    /// Workers waiting for work.
    pub available_threads: usize,
    /// Workers executing (or about to execute) a task.
    pub busy_threads: usize,
    /// Tasks executed so far, failed ones included.
    pub processed_count: u64,
    /// Mean task execution time (ms).
    pub average_work_completion_time_ms: f64,
    /// Queue counters; taken right after the pool counters.
    pub queue: QueueStats,
    /// Snapshot time in milliseconds since the Unix epoch.
    pub taken_at_ms: u128,
}
