//! Where asynchronous handlers run.
//!
//! Handlers are plain synchronous closures that may block, so on a tokio
//! runtime they go to the blocking pool rather than the async workers.
//! Without a runtime each invocation gets its own named OS thread.
//!
//! ## Rules
//! - A job handed to [`Executor::spawn`] runs exactly once.
//! - If the runtime drops a job unrun (it was shut down after the bus was
//!   built), the job moves to a dedicated thread instead.

use std::thread;

use tokio::runtime::Handle;

const THREAD_NAME: &str = "topicbus-async";

#[derive(Clone, Debug)]
pub(crate) enum Executor {
    Runtime(Handle),
    Threads,
}

impl Executor {
    pub(crate) fn new(runtime: Option<Handle>) -> Self {
        runtime.map_or(Executor::Threads, Executor::Runtime)
    }

    /// Detaches `job`; it runs to completion with no way to cancel it.
    pub(crate) fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Executor::Runtime(handle) => {
                let guard = Unrun(Some(job));
                drop(handle.spawn_blocking(move || guard.run()));
            }
            Executor::Threads => spawn_thread(job),
        }
    }
}

fn spawn_thread<F>(job: F)
where
    F: FnOnce() + Send + 'static,
{
    let spawned = thread::Builder::new().name(THREAD_NAME.into()).spawn(job);
    if let Err(err) = spawned {
        tracing::error!(error = %err, "failed to start async handler thread");
    }
}

/// Holds a job until it runs; dropping it unrun hands the job to a thread.
struct Unrun<F>(Option<F>)
where
    F: FnOnce() + Send + 'static;

impl<F> Unrun<F>
where
    F: FnOnce() + Send + 'static,
{
    fn run(mut self) {
        if let Some(job) = self.0.take() {
            job();
        }
    }
}

impl<F> Drop for Unrun<F>
where
    F: FnOnce() + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(job) = self.0.take() {
            tracing::warn!("runtime dropped an async handler unrun; moving it to a thread");
            spawn_thread(job);
        }
    }
}
