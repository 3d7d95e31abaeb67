use std::borrow::Cow;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::runtime::Handle;

use super::executor::Executor;
use super::registry::Registry;
use super::{EventBus, Shared};
use crate::config::{BusConfig, OncePolicy};

/// Builder for constructing an [`EventBus`].
pub struct BusBuilder {
    cfg: BusConfig,
}

impl BusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self { cfg }
    }

    /// Sets the label used in log events.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.cfg.name = name.into();
        self
    }

    /// Runs asynchronous handlers on this runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.cfg.runtime = Some(runtime);
        self
    }

    /// Selects how one-shot handlers behave under racing publishes.
    pub fn with_once_policy(mut self, once: OncePolicy) -> Self {
        self.cfg.once = once;
        self
    }

    /// Builds the bus.
    ///
    /// The executor is fixed here: the configured runtime, else the runtime
    /// current on this thread, else dedicated threads.
    pub fn build(self) -> EventBus {
        let executor = Executor::new(self.cfg.runtime_handle());
        tracing::debug!(
            bus = %self.cfg.name,
            executor = ?executor,
            once = ?self.cfg.once,
            "event bus created"
        );
        EventBus {
            shared: Arc::new(Shared {
                config: self.cfg,
                registry: Registry::default(),
                executor,
                next_id: AtomicU64::new(0),
            }),
        }
    }
}
