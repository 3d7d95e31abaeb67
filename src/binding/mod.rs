//! # Bindings: items that know how to subscribe themselves.
//!
//! Two extension points sit on top of [`EventBus`]:
//!
//! - [`Binding`] describes one handler as *(delivery kind, topic, callable)*.
//!   [`subscribe_binding`] applies it and hands back a [`Subscription`].
//! - [`Subscriber`] performs any number of subscriptions itself and returns
//!   them as [`Subscriptions`].
//!
//! Both are accepted by [`subscribe_batch`], which walks a list of named
//! entries and collects one teardown handle for everything it applied.
//!
//! ```text
//! Binding ──(kind, topic, callable)──► subscribe_binding ──► Subscription
//! Subscriber ──subscribe(&bus)──────────────────────────────► Subscriptions
//! ```
//!
//! ## Rules
//! - A teardown handle removes exactly the records it created, by
//!   [`SubscriptionId`]; identical handlers subscribed elsewhere stay.
//! - Cancelling a record that is already gone is a no-op.

mod batch;

use std::borrow::Cow;
use std::fmt;

pub use batch::{subscribe_batch, BatchEntry, BatchError, BatchItem};

use crate::bus::{EventBus, SubscriptionId};
use crate::callable::{Callable, IntoCallable};
use crate::error::Result;

/// Which subscribe operation a [`Binding`] goes through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeliveryKind {
    /// [`EventBus::subscribe`].
    #[default]
    Sync,
    /// [`EventBus::subscribe_async`], not transactional.
    Async,
    /// [`EventBus::subscribe_once`].
    OnceSync,
    /// [`EventBus::subscribe_once_async`].
    OnceAsync,
}

impl DeliveryKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            DeliveryKind::Sync => "sync",
            DeliveryKind::Async => "async",
            DeliveryKind::OnceSync => "once_sync",
            DeliveryKind::OnceAsync => "once_async",
        }
    }
}

/// An item that describes a single handler subscription.
pub trait Binding: Send + Sync {
    /// Delivery mode. Defaults to [`DeliveryKind::Sync`].
    fn kind(&self) -> DeliveryKind {
        DeliveryKind::Sync
    }

    /// Topic to subscribe on.
    fn topic(&self) -> &str;

    /// The handler to register.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`](crate::BusError::InvalidCallable) if no
    /// callable can be produced.
    fn callable(&self) -> Result<Callable>;
}

/// An item that performs its own subscriptions.
pub trait Subscriber: Send + Sync {
    /// Subscribes against `bus` and returns what to tear down later.
    ///
    /// # Errors
    /// Whatever subscription error the implementation hits first.
    fn subscribe(&self, bus: &EventBus) -> Result<Subscriptions>;
}

/// Ready-made [`Binding`] over an already wrapped callable.
#[derive(Clone, Debug)]
pub struct Handler {
    kind: DeliveryKind,
    topic: Cow<'static, str>,
    callable: Callable,
}

impl Handler {
    /// Wraps `handler` for synchronous delivery on `topic`.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`](crate::BusError::InvalidCallable) if
    /// `handler` cannot be wrapped.
    pub fn new<F, M>(topic: impl Into<Cow<'static, str>>, handler: F) -> Result<Self>
    where
        F: IntoCallable<M>,
    {
        Ok(Self {
            kind: DeliveryKind::Sync,
            topic: topic.into(),
            callable: handler.into_callable()?,
        })
    }

    /// Selects the delivery mode.
    pub fn with_kind(mut self, kind: DeliveryKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Binding for Handler {
    fn kind(&self) -> DeliveryKind {
        self.kind
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    fn callable(&self) -> Result<Callable> {
        Ok(self.callable.clone())
    }
}

/// Subscribes `item` on `bus` using its delivery kind.
///
/// # Errors
/// The error from [`Binding::callable`] or from the subscribe operation;
/// nothing is registered in that case.
pub fn subscribe_binding(bus: &EventBus, item: &dyn Binding) -> Result<Subscription> {
    let topic = item.topic();
    let callable = item.callable()?;
    let kind = item.kind();
    let id = match kind {
        DeliveryKind::Sync => bus.subscribe(topic, callable)?,
        DeliveryKind::Async => bus.subscribe_async(topic, callable, false)?,
        DeliveryKind::OnceSync => bus.subscribe_once(topic, callable)?,
        DeliveryKind::OnceAsync => bus.subscribe_once_async(topic, callable)?,
    };
    tracing::trace!(topic, id = %id, kind = kind.as_label(), "binding subscribed");
    Ok(Subscription::new(bus.clone(), topic, id))
}

/// Teardown handle for one subscribed record.
#[must_use = "dropping a Subscription keeps the handler subscribed; call cancel() to remove it"]
pub struct Subscription {
    bus: EventBus,
    topic: String,
    id: SubscriptionId,
}

impl Subscription {
    /// Handle for the record `id` on `topic`.
    pub fn new(bus: EventBus, topic: impl Into<String>, id: SubscriptionId) -> Self {
        Self {
            bus,
            topic: topic.into(),
            id,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribes the record if it is still registered.
    pub fn cancel(self) {
        if self.bus.unsubscribe_id(&self.topic, self.id).is_err() {
            tracing::trace!(topic = %self.topic, id = %self.id, "subscription already gone");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}

/// A group of [`Subscription`]s torn down together.
#[derive(Debug, Default)]
#[must_use = "dropping Subscriptions keeps the handlers subscribed; call cancel_all() to remove them"]
pub struct Subscriptions {
    items: Vec<Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sub: Subscription) {
        self.items.push(sub);
    }

    /// Moves every handle of `other` into `self`.
    pub fn append(&mut self, other: Subscriptions) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.items.iter()
    }

    /// Cancels every handle, in the order they were added.
    pub fn cancel_all(self) {
        for sub in self.items {
            sub.cancel();
        }
    }
}

impl From<Subscription> for Subscriptions {
    fn from(sub: Subscription) -> Self {
        Self { items: vec![sub] }
    }
}

impl FromIterator<Subscription> for Subscriptions {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
