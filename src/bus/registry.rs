//! # Handler registry: topic → ordered handler records.
//!
//! One readers–writer lock guards the whole mapping. Every mutation takes it
//! exclusively; snapshots and lookups take it shared. No method calls back
//! into user code, so the lock is never held across a handler invocation.
//!
//! ## Rules
//! - Insertion order is dispatch order; removal keeps the survivors' order.
//! - A topic whose last record is removed disappears from the mapping, so an
//!   empty topic and an absent topic look the same.
//! - Removing a record that is already gone is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::record::HandlerRecord;

type Topics = HashMap<String, Vec<Arc<HandlerRecord>>>;

/// Outcome of a conditional removal.
#[derive(Debug)]
pub(crate) enum Removal {
    /// The topic has no records.
    Empty,
    /// Records exist but none matched.
    Missing,
    /// This record was removed.
    Removed(Arc<HandlerRecord>),
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    topics: RwLock<Topics>,
}

impl Registry {
    fn read(&self) -> RwLockReadGuard<'_, Topics> {
        self.topics.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Topics> {
        self.topics.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a record at the end of `topic`'s sequence.
    pub(crate) fn append(&self, topic: &str, record: Arc<HandlerRecord>) {
        self.write().entry(topic.to_owned()).or_default().push(record);
    }

    /// Shallow copy of `topic`'s current sequence.
    pub(crate) fn snapshot(&self, topic: &str) -> Vec<Arc<HandlerRecord>> {
        self.read().get(topic).cloned().unwrap_or_default()
    }

    /// Index of the first record satisfying `pred`.
    pub(crate) fn find<P>(&self, topic: &str, pred: P) -> Option<usize>
    where
        P: Fn(&HandlerRecord) -> bool,
    {
        self.read().get(topic)?.iter().position(|r| pred(r))
    }

    /// Removes this exact record if it is still registered.
    pub(crate) fn remove_record(&self, topic: &str, record: &Arc<HandlerRecord>) -> bool {
        matches!(
            self.remove_first(topic, |r| std::ptr::eq(r, Arc::as_ptr(record))),
            Removal::Removed(_)
        )
    }

    /// Finds and removes the first record satisfying `pred` under one
    /// exclusive hold.
    pub(crate) fn remove_first<P>(&self, topic: &str, pred: P) -> Removal
    where
        P: Fn(&HandlerRecord) -> bool,
    {
        let mut topics = self.write();
        let Some(records) = topics.get(topic).filter(|r| !r.is_empty()) else {
            return Removal::Empty;
        };
        match records.iter().position(|r| pred(r)) {
            Some(index) => remove_at(&mut topics, topic, index)
                .map_or(Removal::Missing, Removal::Removed),
            None => Removal::Missing,
        }
    }

    /// Number of records on `topic`.
    pub(crate) fn len(&self, topic: &str) -> usize {
        self.read().get(topic).map_or(0, Vec::len)
    }

    /// Topics that currently have at least one record, sorted.
    pub(crate) fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }
}

fn remove_at(topics: &mut Topics, topic: &str, index: usize) -> Option<Arc<HandlerRecord>> {
    let records = topics.get_mut(topic)?;
    if index >= records.len() {
        return None;
    }
    let removed = records.remove(index);
    if records.is_empty() {
        topics.remove(topic);
    }
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::record::{Delivery, SubscriptionId};
    use crate::callable::IntoCallable;

    fn record(id: u64) -> Arc<HandlerRecord> {
        let callable = (|| {}).into_callable().unwrap();
        Arc::new(HandlerRecord::new(
            SubscriptionId(id),
            callable,
            false,
            Delivery::Sync,
        ))
    }

    fn ids(records: &[Arc<HandlerRecord>]) -> Vec<u64> {
        records.iter().map(|r| r.id.get()).collect()
    }

    #[test]
    fn append_keeps_order_and_snapshot_is_detached() {
        let reg = Registry::default();
        for id in 0..3 {
            reg.append("t", record(id));
        }
        let snap = reg.snapshot("t");
        reg.append("t", record(3));
        assert_eq!(ids(&snap), vec![0, 1, 2]);
        assert_eq!(reg.len("t"), 4);
    }

    #[test]
    fn remove_preserves_order_and_ignores_out_of_range() {
        let reg = Registry::default();
        for id in 0..3 {
            reg.append("t", record(id));
        }
        {
            let mut topics = reg.write();
            assert!(remove_at(&mut topics, "t", 7).is_none());
            assert_eq!(remove_at(&mut topics, "t", 1).map(|r| r.id.get()), Some(1));
            assert!(remove_at(&mut topics, "missing", 0).is_none());
        }
        assert_eq!(ids(&reg.snapshot("t")), vec![0, 2]);
    }

    #[test]
    fn removing_last_record_drops_topic() {
        let reg = Registry::default();
        let r = record(0);
        reg.append("", Arc::clone(&r));
        assert_eq!(reg.topics(), vec![String::new()]);
        assert!(reg.remove_record("", &r));
        assert!(!reg.remove_record("", &r));
        assert!(reg.topics().is_empty());
        assert_eq!(reg.len(""), 0);
    }

    #[test]
    fn remove_first_reports_empty_and_missing() {
        let reg = Registry::default();
        assert!(matches!(reg.remove_first("t", |_| true), Removal::Empty));
        reg.append("t", record(5));
        assert!(matches!(reg.remove_first("t", |r| r.id.get() == 9), Removal::Missing));
        assert_eq!(reg.find("t", |r| r.id.get() == 5), Some(0));
        assert!(matches!(reg.remove_first("t", |r| r.id.get() == 5), Removal::Removed(_)));
        assert_eq!(reg.find("t", |_| true), None);
    }
}
