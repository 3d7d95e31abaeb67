//! # The event bus.
//!
//! [`EventBus`] keeps an ordered list of handler records per topic and
//! dispatches every publish to the records whose signature fits the
//! published arguments.
//!
//! ## Architecture
//! ```text
//! Subscribers:                         Registry (RwLock)
//!   subscribe(t, f)        ──append──►   "t" ─► [r0, r1, r2, ...]
//!   subscribe_async(t, f)  ──append──►   "u" ─► [r3]
//!   unsubscribe(t, f)      ──remove──►
//!
//! Publishers:
//!   publish_wait(t, args) ──snapshot──► match ─┬─► sync:  run on publisher
//!                                              └─► async: executor ──► Completion
//! ```
//!
//! ## Delivery modes
//! | Operation                 | once | async | transactional |
//! |---------------------------|------|-------|---------------|
//! | `subscribe`               |  no  |  no   |      -        |
//! | `subscribe_async`         |  no  |  yes  |  caller's     |
//! | `subscribe_once`          |  yes |  no   |      -        |
//! | `subscribe_once_async`    |  yes |  yes  |      no       |
//!
//! ## Guarantees
//! - Synchronous handlers run on the publisher, in subscription order, and
//!   observe publishes in the order the publisher issued them.
//! - A transactional handler runs one invocation at a time, in the order the
//!   publishes reached it.
//! - Other asynchronous invocations are unordered.
//! - [`EventBus::publish`] detaches asynchronous handlers; use
//!   [`EventBus::publish_wait`] to keep a [`Completion`] handle.

mod builder;
mod completion;
mod dispatch;
mod executor;
mod record;
mod registry;
mod serial;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use builder::BusBuilder;
pub use completion::Completion;
pub use record::SubscriptionId;

use self::executor::Executor;
use self::record::{Delivery, HandlerRecord};
use self::registry::{Registry, Removal};
use self::serial::SerialLock;
use crate::callable::{Arg, Identity, IntoCallable};
use crate::config::BusConfig;
use crate::error::{BusError, Result};

pub(crate) struct Shared {
    config: BusConfig,
    registry: Registry,
    executor: Executor,
    next_id: AtomicU64,
}

/// In-process publish/subscribe bus keyed by string topics.
///
/// Cheap to clone: clones share the same registry.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use topicbus::{args, EventBus, Null};
///
/// let bus = EventBus::new();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&hits);
/// bus.subscribe("t", move |a: i32, err: Option<String>| {
///     assert_eq!(a, 10);
///     assert!(err.is_none());
///     counter.fetch_add(1, Ordering::SeqCst);
/// })?;
/// bus.subscribe("t", |_s: String| unreachable!("never matches an i32"))?;
///
/// bus.publish("t", args![10, Null]);
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// # Ok::<(), topicbus::BusError>(())
/// ```
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    /// Creates a bus with the default configuration.
    pub fn new() -> Self {
        Self::builder(BusConfig::default()).build()
    }

    /// Starts building a bus from `cfg`.
    pub fn builder(cfg: BusConfig) -> BusBuilder {
        BusBuilder::new(cfg)
    }

    /// The configuration the bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.shared.config
    }

    // ---- subscribe ----

    /// Subscribes a synchronous handler.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`] if `handler` cannot be wrapped; nothing
    /// is registered in that case.
    pub fn subscribe<F, M>(&self, topic: &str, handler: F) -> Result<SubscriptionId>
    where
        F: IntoCallable<M>,
    {
        self.insert(topic, handler, false, Delivery::Sync)
    }

    /// Subscribes an asynchronous handler.
    ///
    /// With `transactional`, invocations of this handler never overlap and run
    /// in the order the publishes reached it. Each pending invocation occupies
    /// an executor thread while it waits for its turn.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`], as for [`EventBus::subscribe`].
    pub fn subscribe_async<F, M>(
        &self,
        topic: &str,
        handler: F,
        transactional: bool,
    ) -> Result<SubscriptionId>
    where
        F: IntoCallable<M>,
    {
        let serial = transactional.then(|| Arc::new(SerialLock::default()));
        self.insert(topic, handler, false, Delivery::Async { serial })
    }

    /// Subscribes a synchronous handler removed after its first invocation.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`], as for [`EventBus::subscribe`].
    pub fn subscribe_once<F, M>(&self, topic: &str, handler: F) -> Result<SubscriptionId>
    where
        F: IntoCallable<M>,
    {
        self.insert(topic, handler, true, Delivery::Sync)
    }

    /// Subscribes an asynchronous, non-transactional handler removed after its
    /// first invocation.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`], as for [`EventBus::subscribe`].
    pub fn subscribe_once_async<F, M>(&self, topic: &str, handler: F) -> Result<SubscriptionId>
    where
        F: IntoCallable<M>,
    {
        self.insert(topic, handler, true, Delivery::Async { serial: None })
    }

    fn insert<F, M>(
        &self,
        topic: &str,
        handler: F,
        once: bool,
        delivery: Delivery,
    ) -> Result<SubscriptionId>
    where
        F: IntoCallable<M>,
    {
        let callable = match handler.into_callable() {
            Ok(callable) => callable,
            Err(err) => {
                tracing::debug!(bus = %self.shared.config.name, topic, error = %err, "subscribe refused");
                return Err(err);
            }
        };
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let record = HandlerRecord::new(id, callable, once, delivery);
        tracing::debug!(
            bus = %self.shared.config.name,
            topic,
            id = %id,
            signature = %record.callable.signature(),
            once,
            r#async = record.is_async(),
            transactional = record.is_transactional(),
            "subscribed"
        );
        self.shared.registry.append(topic, Arc::new(record));
        Ok(id)
    }

    // ---- unsubscribe ----

    /// Removes the first handler on `topic` whose callable is `handler`.
    ///
    /// Succeeds without removing anything when the topic has handlers but
    /// none is `handler`.
    ///
    /// # Errors
    /// [`BusError::TopicEmpty`] if `topic` has no handlers.
    pub fn unsubscribe<F, M>(&self, topic: &str, handler: &F) -> Result<()>
    where
        F: IntoCallable<M>,
    {
        let identity: Option<Identity> = handler.identity().ok();
        self.remove(topic, |record| {
            identity
                .as_ref()
                .is_some_and(|id| record.callable.identity() == id)
        })
    }

    /// Removes the handler registered under `id`.
    ///
    /// # Errors
    /// [`BusError::TopicEmpty`] if `topic` has no handlers.
    pub fn unsubscribe_id(&self, topic: &str, id: SubscriptionId) -> Result<()> {
        self.remove(topic, |record| record.id == id)
    }

    fn remove<P>(&self, topic: &str, pred: P) -> Result<()>
    where
        P: Fn(&HandlerRecord) -> bool,
    {
        match self.shared.registry.remove_first(topic, pred) {
            Removal::Empty => Err(BusError::topic_empty(topic)),
            Removal::Missing => {
                tracing::trace!(bus = %self.shared.config.name, topic, "unsubscribe matched nothing");
                Ok(())
            }
            Removal::Removed(record) => {
                tracing::debug!(bus = %self.shared.config.name, topic, id = %record.id, "unsubscribed");
                Ok(())
            }
        }
    }

    // ---- publish ----

    /// Publishes `args` on `topic`.
    ///
    /// Synchronous handlers have run when this returns. Asynchronous handlers
    /// are detached: nothing can wait for them afterwards.
    pub fn publish(&self, topic: &str, args: Vec<Arg>) {
        drop(self.publish_wait(topic, args));
    }

    /// Publishes `args` on `topic` and returns a handle that completes when
    /// every asynchronous handler scheduled by this publish has returned.
    pub fn publish_wait(&self, topic: &str, args: Vec<Arg>) -> Completion {
        self.shared.dispatch(topic, &args)
    }

    /// Blocks until every asynchronous handler tracked by `handle` returned.
    pub fn wait_async(&self, handle: &Completion) {
        handle.wait();
    }

    // ---- queries ----

    /// True if `topic` has at least one handler.
    pub fn has_callback(&self, topic: &str) -> bool {
        self.shared.registry.len(topic) > 0
    }

    /// Number of handlers on `topic`.
    pub fn handler_count(&self, topic: &str) -> usize {
        self.shared.registry.len(topic)
    }

    /// True if `handler` is subscribed to `topic`.
    pub fn is_subscribed<F, M>(&self, topic: &str, handler: &F) -> bool
    where
        F: IntoCallable<M>,
    {
        let Ok(identity) = handler.identity() else {
            return false;
        };
        self.shared
            .registry
            .find(topic, |record| *record.callable.identity() == identity)
            .is_some()
    }

    /// Topics that currently have handlers, sorted.
    pub fn topics(&self) -> Vec<String> {
        self.shared.registry.topics()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.shared.config.name)
            .field("topics", &self.topics())
            .finish_non_exhaustive()
    }
}
