//! # Dynamically typed publish arguments.
//!
//! [`Arg`] is what a publisher hands to the bus: any `Send + Sync + 'static`
//! value, or the absent value ([`Null`]). Arguments are reference-counted, so
//! fanning one publish out to many handlers clones pointers, not payloads.
//!
//! ```
//! use topicbus::{args, Arg, Null};
//!
//! let list = args![10_i32, Null, String::from("x")];
//! assert_eq!(list.len(), 3);
//! assert!(list[1].is_null());
//! assert_eq!(list[0].downcast_ref::<i32>(), Some(&10));
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// The absent value.
///
/// `Arg::new(Null)` produces a null argument, which only nullable parameters
/// (`Option<T>`, [`Arg`]) accept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Null;

/// A single dynamically typed argument.
#[derive(Clone)]
pub struct Arg {
    value: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl Arg {
    /// Wraps a value.
    ///
    /// Wrapping an `Arg` returns it unchanged and wrapping [`Null`] yields the
    /// null argument, so `args!` accepts both transparently.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(value);
        let boxed = match boxed.downcast::<Arg>() {
            Ok(arg) => return *arg,
            Err(other) => other,
        };
        if boxed.is::<Null>() {
            return Self::null();
        }
        Self {
            value: Some(Arc::from(boxed)),
            type_name: type_name::<T>(),
        }
    }

    /// The null argument.
    pub const fn null() -> Self {
        Self {
            value: None,
            type_name: "null",
        }
    }

    /// True for the null argument.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Runtime type of the carried value, `None` when null.
    pub fn type_id(&self) -> Option<TypeId> {
        self.value.as_deref().map(Any::type_id)
    }

    /// Name of the carried value's type (`"null"` when null).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the value as `T` if it is exactly a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref::<T>()
    }

    /// True if the value is exactly a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }
}

impl Default for Arg {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Null> for Arg {
    fn from(_: Null) -> Self {
        Self::null()
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Arg(null)")
        } else {
            write!(f, "Arg({})", self.type_name)
        }
    }
}

/// Builds a `Vec<Arg>` from a list of values.
///
/// ```
/// use topicbus::{args, Null};
///
/// let none = args![];
/// assert!(none.is_empty());
///
/// let some = args!["123", 9, 8, 7, Null];
/// assert_eq!(some.len(), 5);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::new($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_values_with_their_runtime_type() {
        let arg = Arg::new(42_u64);
        assert!(!arg.is_null());
        assert!(arg.is::<u64>());
        assert!(!arg.is::<u32>());
        assert_eq!(arg.type_id(), Some(TypeId::of::<u64>()));
        assert_eq!(arg.downcast_ref::<u64>(), Some(&42));
        assert_eq!(arg.type_name(), "u64");
    }

    #[test]
    fn null_marker_becomes_null() {
        let arg = Arg::new(Null);
        assert!(arg.is_null());
        assert_eq!(arg.type_id(), None);
        assert_eq!(arg.downcast_ref::<Null>(), None);
        assert!(Arg::default().is_null());
        assert!(Arg::from(Null).is_null());
    }

    #[test]
    fn wrapping_an_arg_does_not_nest() {
        let inner = Arg::new(String::from("x"));
        let outer = Arg::new(inner.clone());
        assert!(outer.is::<String>());
        assert!(Arg::new(Arg::null()).is_null());
    }

    #[test]
    fn macro_builds_in_order() {
        let list = args![1_i32, "two", Null];
        assert!(list[0].is::<i32>());
        assert!(list[1].is::<&'static str>());
        assert!(list[2].is_null());
        assert_eq!(format!("{:?}", list[2]), "Arg(null)");
    }
}
