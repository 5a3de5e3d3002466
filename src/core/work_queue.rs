//! FIFO work queue with blocking, deadline-bounded dequeue.
//!
//! The queue owns every pending [`Task`] between admission and the moment a
//! worker takes it. Its mutex guards the pending sequence together with the
//! admission counters, so `dequeued <= added` holds at every observation.
//! The queue never calls back into its pool: producers learn the pending
//! depth from [`WorkQueue::enqueue`] and make growth decisions themselves,
//! after this lock has been released.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use super::stats::QueueStats;
use super::{PoolError, Task};
use crate::util::clock::average_ms;

/// State guarded by [`WorkQueue::state`].
#[derive(Debug, Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    added: u64,
    dequeued: u64,
    total_time_in_queue: Duration,
    /// Bumped by `interrupt_waiters`; a waiter that sees it change gives up.
    interrupt_epoch: u64,
    closed: bool,
}

impl QueueState {
    fn take_next(&mut self) -> Option<Task> {
        let task = self.tasks.pop_front()?;
        if let Some(at) = task.enqueued_at() {
            self.total_time_in_queue += at.elapsed();
        }
        self.dequeued += 1;
        Some(task)
    }
}

/// Unbounded FIFO of pending tasks bound to one pool.
///
/// There is no backpressure: `enqueue` always admits while the queue is open,
/// even when the owning pool is at its worker cap.
#[derive(Debug)]
pub struct WorkQueue {
    name: String,
    /// Pending tasks, admission counters, residency accumulator, close flag.
    state: Mutex<QueueState>,
    /// Signalled once per admitted task, and broadcast on close/interrupt.
    available: Condvar,
}

impl WorkQueue {
    /// Create an empty, open queue.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
        }
    }

    /// Queue name, used in logs and stats.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append `task` at the tail, stamp its admission time and wake one waiter.
    ///
    /// Returns the number of pending tasks right after admission.
    ///
    /// # Errors
    ///
    /// `PoolError::Closed` once [`WorkQueue::close`] has been called; the task
    /// is dropped unexecuted.
    pub fn enqueue(&self, mut task: Task) -> Result<usize, PoolError> {
        let pending = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(PoolError::Closed(self.name.clone()));
            }
            task.set_enqueued_at(Instant::now());
            trace!(queue = %self.name, task_id = task.id(), "task enqueued");
            state.tasks.push_back(task);
            state.added += 1;
            state.tasks.len()
        };
        self.available.notify_one();
        Ok(pending)
    }

    /// Take the head task, blocking for at most `timeout`.
    ///
    /// Spurious wake-ups re-check the queue and keep waiting against the same
    /// deadline. A closed queue still hands out whatever is pending.
    ///
    /// # Errors
    ///
    /// - `PoolError::Timeout` if nothing arrived before the deadline
    /// - `PoolError::Cancelled` if the wait was interrupted, or the queue is
    ///   closed and empty
    pub fn dequeue(&self, timeout: Duration) -> Result<Task, PoolError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        let epoch = state.interrupt_epoch;

        loop {
            if let Some(task) = state.take_next() {
                return Ok(task);
            }
            if state.closed || state.interrupt_epoch != epoch {
                return Err(PoolError::Cancelled);
            }
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        // Work admitted right at the deadline still counts.
                        return state.take_next().ok_or(PoolError::Timeout);
                    }
                }
                None => self.available.wait(&mut state),
            }
        }
    }

    /// Take the head task if one is pending, without blocking.
    pub fn try_dequeue(&self) -> Option<Task> {
        self.state.lock().take_next()
    }

    /// Wake every thread blocked in [`WorkQueue::dequeue`] with `Cancelled`.
    ///
    /// Best effort: threads that start waiting afterwards are unaffected.
    pub fn interrupt_waiters(&self) {
        self.state.lock().interrupt_epoch += 1;
        self.available.notify_all();
    }

    /// Stop admitting work and release waiters once the queue drains.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Whether [`WorkQueue::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Pending task count. Stale as soon as it is returned.
    #[must_use]
    pub fn size(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Total tasks ever admitted.
    #[must_use]
    pub fn total_work_items_added(&self) -> u64 {
        self.state.lock().added
    }

    /// Total tasks ever handed to a worker.
    #[must_use]
    pub fn total_work_items_dequeued(&self) -> u64 {
        self.state.lock().dequeued
    }

    /// Same as [`WorkQueue::size`], named for monitoring.
    #[must_use]
    pub fn work_items_in_queue(&self) -> usize {
        self.size()
    }

    /// Mean residency time of dequeued tasks, in milliseconds.
    #[must_use]
    pub fn average_time_in_queue(&self) -> f64 {
        let state = self.state.lock();
        average_ms(state.total_time_in_queue, state.dequeued)
    }

    /// Consistent snapshot of every queue counter.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            name: self.name.clone(),
            work_items_added: state.added,
            work_items_dequeued: state.dequeued,
            work_items_in_queue: state.tasks.len(),
            average_time_in_queue_ms: average_ms(state.total_time_in_queue, state.dequeued),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn noop(name: &str) -> Task {
        Task::from_fn(name, || Ok(()))
    }

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new("q");
        let ids: Vec<u64> = (0..5)
            .map(|i| {
                let task = noop(&format!("t{i}"));
                let id = task.id();
                queue.enqueue(task).unwrap();
                id
            })
            .collect();

        let drained: Vec<u64> = (0..5)
            .map(|_| queue.dequeue(Duration::from_millis(10)).unwrap().id())
            .collect();
        assert_eq!(drained, ids);
    }

    #[test]
    fn test_enqueue_stamps_and_counts() {
        let queue = WorkQueue::new("q");
        assert_eq!(queue.enqueue(noop("a")).unwrap(), 1);
        assert_eq!(queue.enqueue(noop("b")).unwrap(), 2);
        assert_eq!(queue.total_work_items_added(), 2);
        assert_eq!(queue.size(), 2);

        let task = queue.try_dequeue().unwrap();
        assert!(task.enqueued_at().is_some());
        assert_eq!(queue.total_work_items_dequeued(), 1);
        assert_eq!(queue.work_items_in_queue(), 1);
    }

    #[test]
    fn test_dequeue_times_out() {
        let queue = WorkQueue::new("q");
        let start = Instant::now();
        let err = queue.dequeue(Duration::from_millis(30)).unwrap_err();
        assert!(matches!(err, PoolError::Timeout));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_dequeue_wakes_on_enqueue() {
        let queue = Arc::new(WorkQueue::new("q"));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue(Duration::from_secs(5)).map(|t| t.id()))
        };
        thread::sleep(Duration::from_millis(20));
        let task = noop("late");
        let id = task.id();
        queue.enqueue(task).unwrap();
        assert_eq!(consumer.join().unwrap().unwrap(), id);
    }

    #[test]
    fn test_interrupt_cancels_waiter() {
        let queue = Arc::new(WorkQueue::new("q"));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(20));
        queue.interrupt_waiters();
        let err = consumer.join().unwrap().unwrap_err();
        assert!(matches!(err, PoolError::Cancelled));
    }

    #[test]
    fn test_closed_queue_drains_then_cancels() {
        let queue = WorkQueue::new("q");
        queue.enqueue(noop("left-over")).unwrap();
        queue.close();

        assert!(queue.is_closed());
        assert!(matches!(queue.enqueue(noop("rejected")), Err(PoolError::Closed(_))));
        assert!(queue.dequeue(Duration::from_millis(10)).is_ok());
        assert!(matches!(
            queue.dequeue(Duration::from_secs(5)),
            Err(PoolError::Cancelled)
        ));
    }

    #[test]
    fn test_stats_snapshot() {
        let queue = WorkQueue::new("stats-q");
        queue.enqueue(noop("a")).unwrap();
        thread::sleep(Duration::from_millis(15));
        queue.try_dequeue().unwrap();

        let stats = queue.stats();
        assert_eq!(stats.name, "stats-q");
        assert_eq!(stats.work_items_added, 1);
        assert_eq!(stats.work_items_dequeued, 1);
        assert_eq!(stats.work_items_in_queue, 0);
        assert!(stats.average_time_in_queue_ms >= 10.0);
        assert!(queue.average_time_in_queue() >= 10.0);
    }
}
