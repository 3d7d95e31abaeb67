//! # Batch subscription over named entries.
//!
//! ```text
//! entries ──► skip excluded names ──► Binding    ─► subscribe_binding ─┐
//!                                  └► Subscriber ─► subscribe(&bus) ───┴─► Subscriptions
//! ```
//!
//! ## Modes
//! - `verify = true`: the first failure aborts the walk. Everything applied
//!   so far is cancelled and the failure is returned alone.
//! - `verify = false`: every entry is attempted. Failures are collected into
//!   [`BusError::Aggregate`] and returned together with the handles of the
//!   entries that were applied.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use super::{subscribe_binding, Binding, Subscriber, Subscriptions};
use crate::bus::EventBus;
use crate::error::BusError;

/// What a [`BatchEntry`] subscribes.
pub enum BatchItem {
    Binding(Box<dyn Binding>),
    Subscriber(Box<dyn Subscriber>),
}

/// A named item of a batch. The name is what exclusion lists match on.
pub struct BatchEntry {
    name: Cow<'static, str>,
    item: BatchItem,
}

impl BatchEntry {
    pub fn binding(name: impl Into<Cow<'static, str>>, item: impl Binding + 'static) -> Self {
        Self {
            name: name.into(),
            item: BatchItem::Binding(Box::new(item)),
        }
    }

    pub fn subscriber(name: impl Into<Cow<'static, str>>, item: impl Subscriber + 'static) -> Self {
        Self {
            name: name.into(),
            item: BatchItem::Subscriber(Box::new(item)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item(&self) -> &BatchItem {
        &self.item
    }

    fn apply(&self, bus: &EventBus) -> Result<Subscriptions, BusError> {
        match &self.item {
            BatchItem::Binding(binding) => subscribe_binding(bus, binding.as_ref()).map(Subscriptions::from),
            BatchItem::Subscriber(subscriber) => subscriber.subscribe(bus),
        }
    }
}

impl fmt::Debug for BatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.item {
            BatchItem::Binding(_) => "binding",
            BatchItem::Subscriber(_) => "subscriber",
        };
        f.debug_struct("BatchEntry")
            .field("name", &self.name)
            .field("item", &kind)
            .finish()
    }
}

/// Failure of [`subscribe_batch`].
#[derive(Error, Debug)]
#[error("{error}")]
pub struct BatchError {
    /// The single aborting error, or [`BusError::Aggregate`].
    #[source]
    pub error: BusError,
    /// Handles for the entries that were applied. Empty in verify mode.
    pub applied: Subscriptions,
}

impl BatchError {
    pub fn into_parts(self) -> (BusError, Subscriptions) {
        (self.error, self.applied)
    }
}

/// Subscribes every entry of `entries` whose name is not in `excludes`.
///
/// # Errors
/// See the module docs for how `verify` shapes the returned [`BatchError`].
pub fn subscribe_batch(
    bus: &EventBus,
    entries: &[BatchEntry],
    verify: bool,
    excludes: &[&str],
) -> Result<Subscriptions, BatchError> {
    let excludes: BTreeSet<&str> = excludes.iter().copied().collect();
    let mut applied = Subscriptions::new();
    let mut errors = Vec::new();

    for entry in entries {
        if excludes.contains(entry.name()) {
            tracing::trace!(entry = entry.name(), "batch entry excluded");
            continue;
        }
        match entry.apply(bus) {
            Ok(subs) => applied.append(subs),
            Err(error) if verify => {
                tracing::debug!(entry = entry.name(), error = %error, "batch aborted; rolling back");
                applied.cancel_all();
                return Err(BatchError {
                    error,
                    applied: Subscriptions::new(),
                });
            }
            Err(error) => {
                tracing::debug!(entry = entry.name(), error = %error, "batch entry failed");
                errors.push(error);
            }
        }
    }

    if errors.is_empty() {
        Ok(applied)
    } else {
        Err(BatchError {
            error: BusError::Aggregate { errors },
            applied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{DeliveryKind, Handler};
    use crate::callable::Arg;
    use crate::error::Result;

    struct Broken;

    impl Binding for Broken {
        fn topic(&self) -> &str {
            "broken"
        }

        fn callable(&self) -> Result<crate::Callable> {
            crate::IntoCallable::into_callable(Arg::new(5_i32))
        }
    }

    struct Pair;

    impl Subscriber for Pair {
        fn subscribe(&self, bus: &EventBus) -> Result<Subscriptions> {
            let mut subs = Subscriptions::new();
            for topic in ["a", "b"] {
                let handler = Handler::new(topic, || {})?.with_kind(DeliveryKind::Async);
                subs.push(subscribe_binding(bus, &handler)?);
            }
            Ok(subs)
        }
    }

    fn entries() -> Vec<BatchEntry> {
        vec![
            BatchEntry::binding("first", Handler::new("x", |_: i32| {}).unwrap()),
            BatchEntry::binding("broken", Broken),
            BatchEntry::subscriber("pair", Pair),
        ]
    }

    #[test]
    fn lenient_batch_applies_everything_it_can() {
        let bus = EventBus::new();
        let err = subscribe_batch(&bus, &entries(), false, &[]).unwrap_err();
        let (error, applied) = err.into_parts();
        assert_eq!(error.as_label(), "bus_aggregate");
        assert_eq!(error.errors().len(), 1);
        assert_eq!(applied.len(), 3);
        assert_eq!(bus.topics(), vec!["a", "b", "x"]);

        applied.cancel_all();
        assert!(bus.topics().is_empty());
    }

    #[test]
    fn verify_rolls_back_on_first_error() {
        let bus = EventBus::new();
        let err = subscribe_batch(&bus, &entries(), true, &[]).unwrap_err();
        assert_eq!(err.error.as_label(), "bus_invalid_callable");
        assert!(err.applied.is_empty());
        assert!(bus.topics().is_empty());
    }

    #[test]
    fn excluded_entries_are_skipped() {
        let bus = EventBus::new();
        let subs = subscribe_batch(&bus, &entries(), true, &["broken", "pair"]).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(bus.topics(), vec!["x"]);
    }
}
