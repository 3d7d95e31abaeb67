//! # Bus configuration.
//!
//! Provides [`BusConfig`], the settings consumed by
//! [`EventBus::builder`](crate::EventBus::builder).
//!
//! ## Defaults
//! - `name = "bus"`
//! - `runtime = None` → the tokio runtime current at construction (if any)
//! - `once = OncePolicy::Exclusive`

use std::borrow::Cow;

use tokio::runtime::Handle;

/// How a one-shot handler behaves when several publishes race for it.
///
/// Both variants remove the handler record from its topic at most once.
/// They differ in what a publish that lost the removal race does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OncePolicy {
    /// The losing publish skips the handler: at most one invocation overall.
    #[default]
    Exclusive,
    /// The losing publish still invokes the handler with the arguments it
    /// matched against its own snapshot.
    Snapshot,
}

impl OncePolicy {
    /// True if a publish that failed to remove a once-handler still invokes it.
    #[inline]
    pub fn invokes_on_lost_race(self) -> bool {
        matches!(self, OncePolicy::Snapshot)
    }
}

/// Configuration for an [`EventBus`](crate::EventBus).
///
/// ## Field semantics
/// - `name`: label attached to every log event emitted by the bus
/// - `runtime`: where asynchronous handlers are scheduled
/// - `once`: race behavior of one-shot handlers
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Label used in log events (`bus = ...`).
    pub name: Cow<'static, str>,

    /// Runtime that executes asynchronous handlers.
    ///
    /// - `Some(handle)` → handlers run on the runtime's blocking pool
    /// - `None` → the runtime current at construction is used; without one,
    ///   each asynchronous invocation gets a dedicated OS thread
    pub runtime: Option<Handle>,

    /// Behavior of one-shot handlers under concurrent publishes.
    pub once: OncePolicy,
}

impl BusConfig {
    /// Returns the configured runtime, falling back to the current one.
    #[inline]
    pub fn runtime_handle(&self) -> Option<Handle> {
        self.runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("bus"),
            runtime: None,
            once: OncePolicy::default(),
        }
    }
}
