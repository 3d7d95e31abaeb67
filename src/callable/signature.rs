//! # Callable signatures.
//!
//! A [`Signature`] is the declared parameter list of a callable: the fixed
//! positional parameters, optionally followed by one variadic parameter.
//! It is built once at subscribe time and consulted by the matcher on every
//! publish.

use std::fmt;

use super::param::{ParamType, Slot};
use crate::error::{BusError, Result};

/// Declared parameter list of a callable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub(super) params: Vec<ParamType>,
    pub(super) variadic: Option<ParamType>,
}

impl Signature {
    /// Builds a signature from parameter slots, in declaration order.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`] if a variadic slot is not the last one or
    /// a slot is [`Slot::Invalid`].
    pub fn new(slots: impl IntoIterator<Item = Slot>) -> Result<Self> {
        let mut sig = Signature::default();
        for slot in slots {
            if sig.variadic.is_some() {
                return Err(BusError::invalid_callable(
                    "variadic parameter must be the last parameter",
                ));
            }
            match slot {
                Slot::Fixed(ty) => sig.params.push(ty),
                Slot::Variadic(elem) => sig.variadic = Some(elem),
                Slot::Invalid(reason) => return Err(BusError::invalid_callable(reason)),
            }
        }
        Ok(sig)
    }

    /// Number of declared parameters, the variadic one included.
    pub fn arity(&self) -> usize {
        self.params.len() + usize::from(self.variadic.is_some())
    }

    /// True if the last parameter collects trailing arguments.
    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    /// Number of parameters that bind exactly one argument each.
    pub fn fixed(&self) -> usize {
        self.params.len()
    }

    /// Declared type at position `i`; for the variadic position this is the
    /// element type.
    pub fn param(&self, i: usize) -> Option<ParamType> {
        self.params
            .get(i)
            .copied()
            .or(if i == self.params.len() { self.variadic } else { None })
    }

    /// Element type of the variadic parameter.
    pub fn variadic_elem(&self) -> Option<ParamType> {
        self.variadic
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fn(")?;
        for (i, ty) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        if let Some(elem) = self.variadic {
            if !self.params.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "...{elem}")?;
        }
        f.write_str(")")
    }
}
