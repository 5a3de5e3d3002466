//! Worker thread pool that grows on demand and shrinks when idle.
//!
//! Each pool owns one [`WorkQueue`] and a dynamic set of OS worker threads.
//! Workers loop on the queue: wait up to the idle timeout, run what they get,
//! record how long it took, repeat. A worker whose wait times out exits if the
//! pool is above its minimum size.
//!
//! # Locking
//!
//! The queue lock guards pending work; the pool lock guards worker counts and
//! execution totals. Neither is held while acquiring the other, and neither is
//! held across a blocking wait or a task execution. Producers enqueue first
//! (queue lock, released), then decide "wake or grow" under the pool lock.
//!
//! # Known limitations
//!
//! - The queue is unbounded. A bounded pool at its cap keeps admitting work
//!   and `submit` never reports pressure; poll [`ThreadPool::work_queue`] if
//!   you need it.
//! - If every worker of a pool at its cap blocks on a result that only a
//!   still-queued task can produce, the pool stalls. The cap is never exceeded
//!   to break such a cycle.
//! - `close` does not interrupt running tasks. Workers still busy when the
//!   close timeout expires are reported and detached.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use super::stats::PoolStats;
use super::{PoolError, Task, WorkQueue};
use crate::config::PoolConfig;
use crate::util::clock::{average_ms, now_ms};

/// State guarded by [`Shared::workers`].
#[derive(Debug, Default)]
struct WorkerState {
    /// Live workers, including slots reserved for threads still starting.
    current: usize,
    /// Workers between "about to wait" and "got work or gave up".
    idle: usize,
    processed: u64,
    total_time: Duration,
    next_worker_id: usize,
}

impl WorkerState {
    const fn busy(&self) -> usize {
        self.current.saturating_sub(self.idle)
    }
}

/// Pool state shared by the owning handle and every worker thread.
#[derive(Debug)]
struct Shared {
    pool_id: usize,
    config: PoolConfig,
    queue: WorkQueue,
    /// Worker counts and execution totals.
    workers: Mutex<WorkerState>,
    /// Signalled on every worker exit; `close` waits on it.
    exited: Condvar,
    closed: AtomicBool,
}

impl Shared {
    fn name(&self) -> &str {
        &self.config.name
    }

    /// Claim a worker slot if the cap allows; returns the new worker id.
    fn reserve_slot(&self, state: &mut WorkerState) -> Option<usize> {
        if self
            .config
            .max_workers
            .is_some_and(|max| state.current >= max)
        {
            return None;
        }
        state.current += 1;
        let worker_id = state.next_worker_id;
        state.next_worker_id += 1;
        Some(worker_id)
    }

    /// Decide whether freshly queued work needs another worker.
    ///
    /// Waking an idle worker already happened inside the queue; this only
    /// grows the pool when no worker is idle and the cap allows it.
    fn notify_for_available_work(self: &Arc<Self>) {
        let slot = {
            let mut state = self.workers.lock();
            if state.idle == 0 {
                self.reserve_slot(&mut state)
            } else {
                None
            }
        };
        if let Some(worker_id) = slot {
            // The dropped `Worker` has already released the slot.
            if let Err(e) = start_worker(self, worker_id) {
                debug!(pool = %self.name(), error = %e, "pool not grown, work stays queued");
            }
        }
    }

    /// Re-check the queue from a worker that just finished or retired.
    ///
    /// Covers the window where a producer counted this worker as idle an
    /// instant before it stopped being idle.
    fn spawn_helper_if_starved(self: &Arc<Self>) {
        if self.queue.size() > 0 {
            self.notify_for_available_work();
        }
    }

    fn run_task(&self, worker_id: usize, task: Task) {
        let task_id = task.id();
        let task_name = task.name().to_owned();
        let started = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.execute()));
        let elapsed = started.elapsed();

        match outcome {
            Ok(Ok(())) => {
                debug!(pool = %self.name(), worker_id, task_id, task = %task_name, ?elapsed, "task completed");
            }
            Ok(Err(e)) => {
                warn!(pool = %self.name(), worker_id, task_id, task = %task_name, error = %e, "task failed");
            }
            Err(payload) => {
                error!(
                    pool = %self.name(),
                    worker_id,
                    task_id,
                    task = %task_name,
                    panic = panic_message(payload.as_ref()),
                    "task panicked"
                );
            }
        }

        let mut state = self.workers.lock();
        state.processed += 1;
        state.total_time += elapsed;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// One worker thread's handle on the pool.
///
/// Dropping a worker that has not retired through the normal path (thread
/// failed to start, or died unexpectedly) still frees its slot, so the next
/// submission can replace it.
struct Worker {
    shared: Arc<Shared>,
    id: usize,
    retired: bool,
}

impl Worker {
    fn run(mut self) {
        debug!(pool = %self.shared.name(), worker_id = self.id, "worker started");
        let idle_timeout = self.shared.config.idle_timeout();

        loop {
            self.shared.workers.lock().idle += 1;
            match self.shared.queue.dequeue(idle_timeout) {
                Ok(task) => {
                    self.shared.workers.lock().idle -= 1;
                    self.shared.run_task(self.id, task);
                    self.shared.spawn_helper_if_starved();
                }
                Err(PoolError::Timeout) => {
                    if self.retire(true) {
                        self.shared.spawn_helper_if_starved();
                        break;
                    }
                }
                Err(_) => {
                    // Interrupted: keep serving unless the pool is closing.
                    if self.retire(false) {
                        break;
                    }
                }
            }
        }

        debug!(pool = %self.shared.name(), worker_id = self.id, "worker exiting");
    }

    /// Leave the idle set and exit if the pool is closed, or if the wait
    /// expired and the pool is above its minimum.
    fn retire(&mut self, idle_expired: bool) -> bool {
        let mut state = self.shared.workers.lock();
        state.idle -= 1;
        let closed = self.shared.closed.load(Ordering::Acquire);
        if closed || (idle_expired && state.current > self.shared.config.min_workers) {
            state.current -= 1;
            self.retired = true;
        }
        self.retired
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if !self.retired {
            let mut state = self.shared.workers.lock();
            state.current = state.current.saturating_sub(1);
        }
        self.shared.exited.notify_all();
    }
}

/// Spawn the thread for a slot already reserved in `shared.workers`.
fn start_worker(shared: &Arc<Shared>, worker_id: usize) -> Result<(), PoolError> {
    let mut builder = thread::Builder::new().name(format!("{}-worker-{worker_id}", shared.name()));
    if let Some(size) = shared.config.thread_stack_size {
        builder = builder.stack_size(size);
    }

    let worker = Worker {
        shared: Arc::clone(shared),
        id: worker_id,
        retired: false,
    };

    // On failure the closure, and the worker in it, is dropped, which frees
    // the slot again.
    match builder.spawn(move || worker.run()) {
        Ok(_detached) => Ok(()),
        Err(e) => {
            error!(pool = %shared.name(), worker_id, error = %e, "failed to spawn worker thread");
            Err(PoolError::Spawn(e))
        }
    }
}

/// A managed set of worker threads fed by one FIFO work queue.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use orb_thread_pool::core::{Task, ThreadPool};
///
/// let pool = ThreadPool::bounded("io", 1, 4, Duration::from_secs(30)).unwrap();
/// pool.submit(Task::from_fn("hello", || {
///     println!("hello from a worker");
///     Ok(())
/// }))
/// .unwrap();
/// pool.close();
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
}

impl ThreadPool {
    /// Create a pool and pre-spawn `config.min_workers` workers.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Spawn` if a minimum worker could not be started
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        Self::with_id(config, 0)
    }

    /// Unbounded pool: no minimum, no cap, default idle timeout.
    ///
    /// # Errors
    ///
    /// `PoolError::InvalidConfig` if `name` is empty.
    pub fn unbounded(name: impl Into<String>) -> Result<Self, PoolError> {
        Self::new(PoolConfig::unbounded(name))
    }

    /// Bounded pool with `min` workers started immediately.
    ///
    /// # Errors
    ///
    /// Same as [`ThreadPool::new`].
    pub fn bounded(
        name: impl Into<String>,
        min: usize,
        max: usize,
        idle_timeout: Duration,
    ) -> Result<Self, PoolError> {
        Self::new(PoolConfig::bounded(name, min, max, idle_timeout))
    }

    pub(crate) fn with_id(config: PoolConfig, pool_id: usize) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        let pool = Self::assemble(config, pool_id);

        for _ in 0..pool.shared.config.min_workers {
            let slot = pool.shared.reserve_slot(&mut pool.shared.workers.lock());
            if let Some(worker_id) = slot {
                // Dropping `pool` on error closes it and releases started workers.
                start_worker(&pool.shared, worker_id)?;
            }
        }

        info!(
            pool = %pool.name(),
            pool_id,
            min_workers = pool.shared.config.min_workers,
            max_workers = ?pool.shared.config.max_workers,
            idle_timeout_ms = pool.shared.config.idle_timeout_ms,
            "thread pool created"
        );
        Ok(pool)
    }

    /// Build the pool without validating or starting workers.
    pub(crate) fn assemble(config: PoolConfig, pool_id: usize) -> Self {
        let queue = WorkQueue::new(format!("{}-queue", config.name));
        Self {
            shared: Arc::new(Shared {
                pool_id,
                config,
                queue,
                workers: Mutex::new(WorkerState::default()),
                exited: Condvar::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Queue `task` for execution. Never blocks.
    ///
    /// Wakes an idle worker if there is one; otherwise starts a new worker
    /// when the cap allows it. At the cap the task just waits in the queue.
    ///
    /// # Errors
    ///
    /// `PoolError::Closed` after [`ThreadPool::close`]; the task is dropped.
    pub fn submit(&self, task: Task) -> Result<(), PoolError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed(self.name().to_owned()));
        }
        self.shared.queue.enqueue(task)?;
        self.shared.notify_for_available_work();
        Ok(())
    }

    /// Shorthand for submitting a closure.
    ///
    /// # Errors
    ///
    /// Same as [`ThreadPool::submit`].
    pub fn execute<F>(&self, name: impl Into<String>, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() -> crate::core::AppResult<()> + Send + 'static,
    {
        self.submit(Task::from_fn(name, f))
    }

    /// Stop accepting work and wait up to the close timeout for workers.
    ///
    /// Idle workers exit at once. Busy workers finish their task and drain
    /// what is already queued. Workers still alive at the deadline are logged
    /// and detached. Idempotent; always returns.
    pub fn close(&self) {
        let shared = &self.shared;
        if shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(pool = %shared.name(), "closing thread pool");
        shared.queue.close();

        let deadline = Instant::now().checked_add(shared.config.close_timeout());
        let (remaining, busy, processed) = {
            let mut state = shared.workers.lock();
            while state.current > 0 {
                match deadline {
                    Some(deadline) => {
                        if shared.exited.wait_until(&mut state, deadline).timed_out() {
                            break;
                        }
                    }
                    None => shared.exited.wait(&mut state),
                }
            }
            (state.current, state.busy(), state.processed)
        };

        if remaining > 0 {
            warn!(
                pool = %shared.name(),
                active_threads = remaining,
                busy_threads = busy,
                queued = shared.queue.size(),
                "workers still active at close, detaching"
            );
        }
        info!(pool = %shared.name(), processed, "thread pool closed");
    }

    /// Whether [`ThreadPool::close`] has been called (or the pool dropped).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Id assigned by the owning manager; `0` for standalone pools.
    #[must_use]
    pub fn pool_id(&self) -> usize {
        self.shared.pool_id
    }

    /// The configuration the pool was built from.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Whether the pool has a worker cap.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.shared.config.is_bounded()
    }

    /// Minimum worker count.
    #[must_use]
    pub fn min_workers(&self) -> usize {
        self.shared.config.min_workers
    }

    /// Maximum worker count, `None` when unbounded.
    #[must_use]
    pub fn max_workers(&self) -> Option<usize> {
        self.shared.config.max_workers
    }

    /// Idle timeout after which surplus workers exit.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.shared.config.idle_timeout()
    }

    /// The queue feeding this pool.
    #[must_use]
    pub fn work_queue(&self) -> &WorkQueue {
        &self.shared.queue
    }

    /// Live worker threads.
    #[must_use]
    pub fn current_number_of_threads(&self) -> usize {
        self.shared.workers.lock().current
    }

    /// Workers waiting for work.
    #[must_use]
    pub fn number_of_available_threads(&self) -> usize {
        self.shared.workers.lock().idle
    }

    /// Workers not waiting for work; never negative.
    #[must_use]
    pub fn number_of_busy_threads(&self) -> usize {
        self.shared.workers.lock().busy()
    }

    /// Mean task execution time in milliseconds.
    #[must_use]
    pub fn average_work_completion_time(&self) -> f64 {
        let state = self.shared.workers.lock();
        average_ms(state.total_time, state.processed)
    }

    /// Tasks executed so far, failed and panicked ones included.
    #[must_use]
    pub fn current_processed_count(&self) -> u64 {
        self.shared.workers.lock().processed
    }

    /// Consistent snapshot of pool counters followed by queue counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let mut stats = {
            let state = self.shared.workers.lock();
            PoolStats {
                name: self.name().to_owned(),
                pool_id: self.shared.pool_id,
                current_threads: state.current,
                available_threads: state.idle,
                busy_threads: state.busy(),
                processed_count: state.processed,
                average_work_completion_time_ms: average_ms(state.total_time, state.processed),
                ..PoolStats::default()
            }
        };
        stats.queue = self.shared.queue.stats();
        stats.taken_at_ms = now_ms();
        stats
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.workers.lock();
        f.debug_struct("ThreadPool")
            .field("name", &self.name())
            .field("pool_id", &self.shared.pool_id)
            .field("current_threads", &state.current)
            .field("available_threads", &state.idle)
            .field("processed", &state.processed)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Signal shutdown but never wait here: workers drain and exit on
        // their own. `close` is the way to wait for them.
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            self.shared.queue.close();
            debug!(pool = %self.name(), "thread pool dropped without close, workers detached");
        }
    }
}
