//! # Serial lock for transactional handlers.
//!
//! A ticket lock: the publisher draws a ticket synchronously, before the
//! invocation is handed to another thread, and the worker waits until its
//! ticket is served. Invocations therefore run one at a time, in the order
//! the tickets were drawn, even though the lock is "held" across threads.
//!
//! ```text
//! publish #1 ── ticket 0 ──► worker: wait(0) ─ run ─ release ─┐
//! publish #2 ── ticket 1 ──► worker: wait(1) ············· run ─ release
//! ```
//!
//! ## Rules
//! - Releasing happens on drop, so a panicking handler still passes the turn.
//! - A ticket dropped before its turn (its worker never started) is skipped
//!   when the turn reaches it.
//! - [`SerialLock::enqueue`] draws a ticket and submits its job as one step,
//!   so a FIFO pool receives jobs in ticket order. A waiting worker then only
//!   ever waits on jobs that were queued ahead of it.

use std::collections::BTreeSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Turns {
    next: u64,
    serving: u64,
    abandoned: BTreeSet<u64>,
}

impl Turns {
    fn advance(&mut self) {
        self.serving += 1;
        while self.abandoned.remove(&self.serving) {
            self.serving += 1;
        }
    }
}

/// Per-handler serialization primitive.
#[derive(Debug, Default)]
pub(crate) struct SerialLock {
    turns: Mutex<Turns>,
    turn: Condvar,
    submit: Mutex<()>,
}

impl SerialLock {
    fn turns(&self) -> MutexGuard<'_, Turns> {
        self.turns.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draws a ticket and hands it to `submit` before any other publisher
    /// can draw the next one.
    ///
    /// `submit` must not draw from this lock again.
    pub(crate) fn enqueue<F>(self: &Arc<Self>, submit: F)
    where
        F: FnOnce(SerialTicket),
    {
        let _order = self.submit.lock().unwrap_or_else(PoisonError::into_inner);
        submit(self.ticket());
    }

    /// Draws the next ticket. Never blocks on other holders.
    fn ticket(self: &Arc<Self>) -> SerialTicket {
        let mut turns = self.turns();
        let number = turns.next;
        turns.next += 1;
        SerialTicket {
            lock: Arc::clone(self),
            number,
            held: false,
        }
    }
}

/// A place in a [`SerialLock`] queue; releases (or forfeits) it on drop.
#[derive(Debug)]
pub(crate) struct SerialTicket {
    lock: Arc<SerialLock>,
    number: u64,
    held: bool,
}

impl SerialTicket {
    /// Blocks until every earlier ticket has been released.
    pub(crate) fn wait(&mut self) {
        let mut turns = self.lock.turns();
        while turns.serving != self.number {
            turns = self
                .lock
                .turn
                .wait(turns)
                .unwrap_or_else(PoisonError::into_inner);
        }
        self.held = true;
    }
}

impl Drop for SerialTicket {
    fn drop(&mut self) {
        let mut turns = self.lock.turns();
        if self.held || turns.serving == self.number {
            turns.advance();
        } else {
            turns.abandoned.insert(self.number);
        }
        drop(turns);
        self.lock.turn.notify_all();
    }
}
