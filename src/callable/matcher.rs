//! # Argument matching.
//!
//! Decides whether a published argument list fits a [`Signature`] and, if it
//! does, produces a [`Prepared`] list that the callable's thunk can bind
//! without further checks.
//!
//! ## Rules
//! 1. Arity 0 accepts only an empty list.
//! 2. Without a variadic parameter the lengths must be equal; with one, the
//!    list must cover every fixed parameter.
//! 3. Position `i < fixed` must be assignable to parameter `i`; every later
//!    position must be assignable to the variadic element type.
//! 4. A null argument skips the type test but needs a nullable slot.
//!
//! A rejection is not an error: the dispatcher just skips that handler.

use std::vec;

use super::arg::Arg;
use super::signature::Signature;

/// Argument list accepted by a signature.
///
/// Produced by [`Signature::prepare`]. A thunk handed a list its signature
/// did not accept binds nothing and returns.
#[derive(Clone, Debug, Default)]
pub struct Prepared(Vec<Arg>);

impl Prepared {
    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The arguments in binding order.
    pub fn args(&self) -> &[Arg] {
        &self.0
    }
}

impl IntoIterator for Prepared {
    type Item = Arg;
    type IntoIter = vec::IntoIter<Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Signature {
    /// Matches `args` against this signature.
    ///
    /// Returns `None` when the handler must be skipped.
    pub fn prepare(&self, args: &[Arg]) -> Option<Prepared> {
        if self.arity() == 0 {
            return args.is_empty().then(Prepared::default);
        }

        let fixed = self.fixed();
        let count_ok = match self.variadic {
            None => args.len() == fixed,
            Some(_) => args.len() >= fixed,
        };
        if !count_ok {
            return None;
        }

        for (i, arg) in args.iter().enumerate() {
            let expected = self.params.get(i).or(self.variadic.as_ref())?;
            if !expected.accepts(arg) {
                return None;
            }
        }
        Some(Prepared(args.to_vec()))
    }

    /// True if `args` fit this signature.
    pub fn accepts(&self, args: &[Arg]) -> bool {
        self.prepare(args).is_some()
    }
}
