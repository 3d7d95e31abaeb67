//! # topicbus
//!
//! **topicbus** is an in-process publish/subscribe bus keyed by string topics.
//!
//! Handlers are ordinary closures with typed parameters. A publish carries a
//! list of dynamically typed [`Arg`]s, and only the handlers whose declared
//! signature fits those arguments are invoked; the rest are silently skipped.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  |a: i32, e: Option<String>|        |xs: Variadic<i32>|
//!             │ IntoCallable                 │
//!             ▼                              ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  EventBus                                                     │
//! │  - Registry: topic ─► [HandlerRecord, ...] (insertion order)  │
//! │  - Executor: tokio blocking pool, or dedicated threads        │
//! └──────┬────────────────────────────────────────────────┬───────┘
//!        │ publish_wait(topic, args![10, Null])           │
//!        ▼                                                ▼
//!   Signature::prepare(args)                       subscribe/unsubscribe
//!        ├─ no match ─► skip                       (never blocked by a
//!        ├─ sync     ─► run on the publisher        running handler)
//!        └─ async    ─► executor ─► Completion
//! ```
//!
//! ### Matching
//! ```text
//! fixed params:   one argument each, exact type, Option<T> also takes Null
//! variadic tail:  Variadic<T> takes the remaining arguments (possibly none)
//! Arg params:     take anything, including Null
//! ```
//!
//! ## Features
//! | Area              | Description                                            | Key types / traits                         |
//! |-------------------|--------------------------------------------------------|--------------------------------------------|
//! | **Bus**           | Subscribe, unsubscribe and publish by topic.            | [`EventBus`], [`Completion`]               |
//! | **Callables**     | Closures with discoverable parameter lists.             | [`Callable`], [`IntoCallable`], [`Param`]  |
//! | **Arguments**     | Dynamically typed, nullable published values.           | [`Arg`], [`Null`], [`args!`]               |
//! | **Bindings**      | Self-describing handlers and batch subscription.        | [`Binding`], [`Subscriber`], [`subscribe_batch`] |
//! | **Errors**        | Typed errors for subscription management.               | [`BusError`]                               |
//! | **Configuration** | Log label, async runtime, one-shot race policy.         | [`BusConfig`], [`OncePolicy`]              |
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use topicbus::{args, EventBus, Null, Variadic};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), topicbus::BusError> {
//!     let bus = EventBus::new();
//!     let seen = Arc::new(Mutex::new(Vec::new()));
//!
//!     let log = Arc::clone(&seen);
//!     bus.subscribe_async(
//!         "orders",
//!         move |id: i32, xs: Variadic<i32>| {
//!             log.lock().unwrap().push(id + xs.iter().sum::<i32>());
//!         },
//!         true,
//!     )?;
//!     bus.subscribe_once("orders", |id: i32, note: Option<String>| {
//!         println!("first order {id}, note: {note:?}");
//!     })?;
//!
//!     let done = bus.publish_wait("orders", args![1, Null]);
//!     assert!(!bus.has_callback("nothing"));
//!     done.finished().await;
//!
//!     let done = bus.publish_wait("orders", args![2, 3, 4]);
//!     done.finished().await;
//!
//!     assert_eq!(*seen.lock().unwrap(), vec![9]);
//!     Ok(())
//! }
//! ```
mod binding;
mod bus;
mod callable;
mod config;
mod error;

// ---- Public re-exports ----

pub use binding::{
    subscribe_batch, subscribe_binding, BatchEntry, BatchError, BatchItem, Binding, DeliveryKind,
    Handler, Subscriber, Subscription, Subscriptions,
};
pub use bus::{BusBuilder, Completion, EventBus, SubscriptionId};
pub use callable::{
    Arg, Callable, Identity, IntoCallable, Null, Param, ParamType, Payload, Prepared, Signature,
    Slot, Variadic,
};
pub use config::{BusConfig, OncePolicy};
pub use error::{BusError, Result};
