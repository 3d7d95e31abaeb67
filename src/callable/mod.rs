//! # Callables: opaque handlers with a discoverable signature.
//!
//! A [`Callable`] pairs a [`Signature`] with a thunk that binds a [`Prepared`]
//! argument list to the wrapped function. Closures of up to eight [`Param`]
//! parameters convert into callables through [`IntoCallable`].
//!
//! ```text
//!  |a: i32, e: Option<String>|  ──IntoCallable──►  Callable
//!                                                   ├─ signature  fn(i32, Option<String>)
//!                                                   ├─ identity   (closure type, signature)
//!                                                   └─ thunk      Prepared ─► (a, e)
//! ```
//!
//! ## Identity
//! Two callables are the same handler when their signatures are equal and
//! their code is the same: the same closure or function item type, or clones
//! of one callable built with [`Callable::from_parts`].

mod arg;
mod into;
mod matcher;
mod param;
mod signature;

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

pub use arg::{Arg, Null};
pub use into::IntoCallable;
pub use matcher::Prepared;
pub use param::{Param, ParamType, Payload, Slot, Variadic};
pub use signature::Signature;

type Thunk = Arc<dyn Fn(Prepared) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Code {
    /// Closure or function item type.
    Type(TypeId),
    /// Address of a shared thunk.
    Shared(usize),
}

/// Identity of a callable, used by unsubscribe.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    code: Code,
    signature: Signature,
}

impl Identity {
    pub(crate) fn of_type<F: 'static>(signature: Signature) -> Self {
        Self {
            code: Code::Type(TypeId::of::<F>()),
            signature,
        }
    }

    /// Declared signature of the callable.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// An invocable handler with a known signature.
#[derive(Clone)]
pub struct Callable {
    identity: Identity,
    thunk: Thunk,
}

impl Callable {
    /// Wraps a thunk that receives already matched arguments.
    ///
    /// Clones of the returned callable share one identity; independently
    /// built callables never compare equal.
    pub fn from_parts<F>(signature: Signature, thunk: F) -> Self
    where
        F: Fn(Prepared) + Send + Sync + 'static,
    {
        let thunk: Thunk = Arc::new(thunk);
        let addr = Arc::as_ptr(&thunk) as *const () as usize;
        Self {
            identity: Identity {
                code: Code::Shared(addr),
                signature,
            },
            thunk,
        }
    }

    pub(crate) fn new(identity: Identity, thunk: Thunk) -> Self {
        Self { identity, thunk }
    }

    /// Declared signature.
    pub fn signature(&self) -> &Signature {
        &self.identity.signature
    }

    /// Identity used to find this callable again.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// True if both callables are the same handler.
    pub fn same_as(&self, other: &Callable) -> bool {
        self.identity == other.identity
    }

    /// Invokes with arguments matched against this callable's signature.
    pub fn invoke(&self, args: Prepared) {
        (self.thunk)(args)
    }

    /// Matches `args` and invokes on success. Returns whether it ran.
    pub fn call(&self, args: &[Arg]) -> bool {
        match self.signature().prepare(args) {
            Some(prepared) => {
                self.invoke(prepared);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("signature", &self.identity.signature.to_string())
            .finish_non_exhaustive()
    }
}
