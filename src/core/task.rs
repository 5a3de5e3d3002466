//! Units of work and the envelope the queue carries them in.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::AppResult;

/// A unit of work executed by a pool worker.
///
/// Work is consumed by execution, so the type system guarantees it runs at
/// most once. Returning an error (or panicking) is reported by the worker and
/// does not affect the pool.
///
/// # Example
///
/// ```rust
/// use orb_thread_pool::core::{AppResult, Work};
///
/// struct Flush {
///     segment: u32,
/// }
///
/// impl Work for Flush {
///     fn execute(self: Box<Self>) -> AppResult<()> {
///         anyhow::ensure!(self.segment < 16, "segment {} out of range", self.segment);
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "flush"
///     }
/// }
/// ```
pub trait Work: Send + 'static {
    /// Run the work to completion on the calling worker thread.
    fn execute(self: Box<Self>) -> AppResult<()>;

    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        "work"
    }
}

/// Closure-backed work created by [`Task::from_fn`].
struct FnWork<F> {
    name: String,
    f: F,
}

impl<F> Work for FnWork<F>
where
    F: FnOnce() -> AppResult<()> + Send + 'static,
{
    fn execute(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        (this.f)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// A submitted unit of work plus its queue bookkeeping.
pub struct Task {
    id: u64,
    work: Box<dyn Work>,
    enqueued_at: Option<Instant>,
}

impl Task {
    /// Wrap a [`Work`] implementation.
    pub fn new<W: Work>(work: W) -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            work: Box::new(work),
            enqueued_at: None,
        }
    }

    /// Wrap a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> AppResult<()> + Send + 'static,
    {
        Self::new(FnWork {
            name: name.into(),
            f,
        })
    }

    /// Wrap a future. It is driven on a current-thread tokio runtime owned by
    /// the worker thread that dequeues it.
    #[cfg(feature = "tokio-runtime")]
    pub fn from_future<F>(name: impl Into<String>, fut: F) -> Self
    where
        F: std::future::Future<Output = AppResult<()>> + Send + 'static,
    {
        Self::new(async_work::FutureWork {
            name: name.into(),
            fut,
        })
    }

    /// Process-unique task identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Name of the wrapped work.
    #[must_use]
    pub fn name(&self) -> &str {
        self.work.name()
    }

    /// When the queue admitted this task, if it has been enqueued.
    #[must_use]
    pub const fn enqueued_at(&self) -> Option<Instant> {
        self.enqueued_at
    }

    pub(crate) fn set_enqueued_at(&mut self, at: Instant) {
        self.enqueued_at = Some(at);
    }

    /// Consume the task and run its work.
    pub(crate) fn execute(self) -> AppResult<()> {
        self.work.execute()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("enqueued_at", &self.enqueued_at)
            .finish()
    }
}

#[cfg(feature = "tokio-runtime")]
mod async_work {
    use std::cell::RefCell;
    use std::future::Future;

    use tokio::runtime::{Builder, Runtime};

    use super::Work;
    use crate::core::AppResult;

    thread_local! {
        // One runtime per worker thread, built on first use.
        static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
    }

    pub(super) struct FutureWork<F> {
        pub(super) name: String,
        pub(super) fut: F,
    }

    impl<F> Work for FutureWork<F>
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        fn execute(self: Box<Self>) -> AppResult<()> {
            let cached = RUNTIME.with(|cell| cell.borrow_mut().take());
            let rt = match cached {
                Some(rt) => rt,
                None => Builder::new_current_thread().enable_all().build()?,
            };
            let this = *self;
            let result = rt.block_on(this.fut);
            RUNTIME.with(|cell| *cell.borrow_mut() = Some(rt));
            result
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}
