//! Handler records: one subscription instance each.

use std::fmt;
use std::sync::Arc;

use super::serial::SerialLock;
use crate::callable::Callable;

/// Token identifying one subscription on a bus.
///
/// Returned by every subscribe operation; removing by token is equivalent to
/// removing the record whose callable identity matched at subscribe time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Raw numeric value (unique per bus).
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Where and how a record's callable runs.
pub(crate) enum Delivery {
    /// On the publishing thread, before publish returns.
    Sync,
    /// On a separately dispatched task; `serial` is set for transactional handlers.
    Async { serial: Option<Arc<SerialLock>> },
}

/// A subscription: callable plus flags. Immutable after creation.
pub(crate) struct HandlerRecord {
    pub(crate) id: SubscriptionId,
    pub(crate) callable: Callable,
    pub(crate) once: bool,
    pub(crate) delivery: Delivery,
}

impl HandlerRecord {
    pub(crate) fn new(id: SubscriptionId, callable: Callable, once: bool, delivery: Delivery) -> Self {
        Self {
            id,
            callable,
            once,
            delivery,
        }
    }

    pub(crate) fn is_async(&self) -> bool {
        matches!(self.delivery, Delivery::Async { .. })
    }

    pub(crate) fn is_transactional(&self) -> bool {
        matches!(self.delivery, Delivery::Async { serial: Some(_) })
    }
}

impl fmt::Debug for HandlerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("id", &self.id)
            .field("signature", &self.callable.signature().to_string())
            .field("once", &self.once)
            .field("async", &self.is_async())
            .field("transactional", &self.is_transactional())
            .finish()
    }
}
