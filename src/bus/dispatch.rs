//! # Publish: snapshot, match, invoke.
//!
//! ```text
//! publish_wait(topic, args)
//!   │
//!   ├─► registry.snapshot(topic)                      (shared lock, released)
//!   │
//!   └─► for record in snapshot (subscription order):
//!         ├─ signature.prepare(args) ── None ──► skip
//!         ├─ once? ──► registry.remove_record()        (exclusive lock, released)
//!         │              └─ lost the race + Exclusive ──► skip
//!         ├─ Sync  ──► callable.invoke(prepared)       (on the publisher)
//!         └─ Async ──► completion.register()
//!                      serial.enqueue(ticket ─► spawn) (transactional only)
//!                      executor.spawn(job.run)         (detached)
//! ```
//!
//! No lock is held while user code runs, so handlers may subscribe,
//! unsubscribe and publish on the same bus.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::completion::{Completion, PendingUnit};
use super::record::{Delivery, HandlerRecord};
use super::serial::SerialTicket;
use super::Shared;
use crate::callable::{Arg, Callable, Prepared};

impl Shared {
    pub(crate) fn dispatch(&self, topic: &str, args: &[Arg]) -> Completion {
        let completion = Completion::new();
        let snapshot = self.registry.snapshot(topic);
        if snapshot.is_empty() {
            return completion;
        }

        for record in &snapshot {
            let Some(prepared) = record.callable.signature().prepare(args) else {
                tracing::trace!(
                    bus = %self.config.name,
                    topic,
                    id = %record.id,
                    signature = %record.callable.signature(),
                    "arguments do not match; handler skipped"
                );
                continue;
            };

            if record.once && !self.claim_once(topic, record) {
                continue;
            }

            match &record.delivery {
                Delivery::Sync => record.callable.invoke(prepared),
                Delivery::Async { serial } => {
                    let job = AsyncJob {
                        callable: record.callable.clone(),
                        prepared,
                        ticket: None,
                        unit: completion.register(),
                    };
                    tracing::trace!(
                        bus = %self.config.name,
                        topic,
                        id = %record.id,
                        transactional = record.is_transactional(),
                        "async handler scheduled"
                    );
                    match serial {
                        Some(lock) => lock.enqueue(|ticket| {
                            let job = AsyncJob {
                                ticket: Some(ticket),
                                ..job
                            };
                            self.executor.spawn(move || job.run());
                        }),
                        None => self.executor.spawn(move || job.run()),
                    }
                }
            }
        }
        completion
    }

    /// Removes a once-record before its invocation. Returns whether this
    /// publish may invoke it.
    fn claim_once(&self, topic: &str, record: &Arc<HandlerRecord>) -> bool {
        if self.registry.remove_record(topic, record) {
            tracing::debug!(bus = %self.config.name, topic, id = %record.id, "once handler removed");
            return true;
        }
        let invoke = self.config.once.invokes_on_lost_race();
        tracing::trace!(
            bus = %self.config.name,
            topic,
            id = %record.id,
            invoke,
            "once handler already removed by a concurrent publish"
        );
        invoke
    }
}

/// One scheduled asynchronous invocation.
struct AsyncJob {
    callable: Callable,
    prepared: Prepared,
    ticket: Option<SerialTicket>,
    unit: PendingUnit,
}

impl AsyncJob {
    /// Waits for the serial turn, invokes, then releases the turn and
    /// finishes the unit, in that order. A panic is logged and resumed after
    /// both are released.
    fn run(self) {
        let AsyncJob {
            callable,
            prepared,
            mut ticket,
            unit,
        } = self;

        if let Some(ticket) = ticket.as_mut() {
            ticket.wait();
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| callable.invoke(prepared)));
        drop(ticket);
        drop(unit);

        if let Err(payload) = outcome {
            tracing::error!(
                signature = %callable.signature(),
                panic = %panic_message(payload.as_ref()),
                "async handler panicked"
            );
            panic::resume_unwind(payload);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
