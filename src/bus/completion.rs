//! # Completion handle for asynchronous dispatches.
//!
//! [`Completion`] is a counting synchronizer: the dispatcher registers one
//! pending unit per scheduled asynchronous handler and the worker finishes
//! it when the handler returns (or panics). Waiters block until the count
//! drops to zero.
//!
//! ## Rules
//! - Waiting on a complete handle returns immediately, any number of times.
//! - Handles are cheap to clone and may be waited on from several tasks.
//! - [`Completion::wait`] blocks the thread; inside async code prefer
//!   [`Completion::finished`].

use std::fmt;
use std::pin::pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    pending: Mutex<usize>,
    zero: Condvar,
    notify: Notify,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Waitable handle returned by [`EventBus::publish_wait`](crate::EventBus::publish_wait).
#[derive(Clone, Default)]
pub struct Completion {
    inner: Arc<Inner>,
}

impl Completion {
    /// Creates an already complete handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one unit of outstanding work.
    pub(crate) fn register(&self) -> PendingUnit {
        *self.inner.pending() += 1;
        PendingUnit {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of asynchronous handlers still running.
    pub fn pending(&self) -> usize {
        *self.inner.pending()
    }

    /// True once every registered handler has returned.
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    /// Blocks the current thread until every registered handler has returned.
    pub fn wait(&self) {
        let mut pending = self.inner.pending();
        while *pending > 0 {
            pending = self
                .inner
                .zero
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Waits asynchronously until every registered handler has returned.
    pub async fn finished(&self) {
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            notified.as_mut().enable();
            if self.is_complete() {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.pending())
            .finish()
    }
}

/// One outstanding unit; finishing it happens on drop, unwinding included.
pub(crate) struct PendingUnit {
    inner: Arc<Inner>,
}

impl Drop for PendingUnit {
    fn drop(&mut self) {
        let mut pending = self.inner.pending();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            drop(pending);
            self.inner.zero.notify_all();
            self.inner.notify.notify_waiters();
        }
    }
}
