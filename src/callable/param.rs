//! # Parameter types a callable may declare.
//!
//! Every parameter of a subscribed closure implements [`Param`]. The trait
//! does two things: it describes the slot ([`Slot`]) so the bus can build a
//! [`Signature`](crate::Signature) at subscribe time, and it extracts the
//! typed value from a prepared argument list at invocation time.
//!
//! ## Supported parameters
//! | Declared as          | Accepts                                         |
//! |----------------------|-------------------------------------------------|
//! | payload `T`          | a value of exactly type `T`                     |
//! | `Option<T>`          | a value of exactly type `T`, or null            |
//! | [`Arg`]              | anything, including null                        |
//! | [`Variadic<P>`]      | zero or more trailing values accepted by `P`    |
//!
//! [`Payload`] types: the primitive numbers, `bool`, `char`, `String`,
//! `&'static str`, `()`, `Vec<u8>`, `Vec<String>`, `Arc<T>` for any
//! `T: Send + Sync`, and any type registered with [`param_type!`](crate::param_type).

use std::any::{type_name, TypeId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::vec;

use super::arg::Arg;

/// Declared type of a single parameter position.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamType {
    id: TypeId,
    name: &'static str,
    nullable: bool,
    dynamic: bool,
}

impl ParamType {
    /// A parameter that takes exactly `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            nullable: false,
            dynamic: false,
        }
    }

    /// A parameter that takes exactly `T` or null.
    pub fn nullable<T: 'static>() -> Self {
        Self {
            nullable: true,
            ..Self::of::<T>()
        }
    }

    /// A parameter that takes any argument.
    pub fn dynamic() -> Self {
        Self {
            nullable: true,
            dynamic: true,
            ..Self::of::<Arg>()
        }
    }

    /// Type the parameter is declared with (the inner `T` for `Option<T>`).
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Readable name of the declared type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True if a null argument may be bound here.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// True for [`Arg`] parameters.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Assignability of `arg` to this parameter.
    ///
    /// Nulls skip the type test and only need a nullable slot; values need an
    /// identical runtime type unless the slot is dynamic. There is no numeric
    /// widening: an `i64` is never accepted by an `i32` slot.
    pub fn accepts(&self, arg: &Arg) -> bool {
        if self.dynamic {
            return true;
        }
        match arg.type_id() {
            None => self.nullable,
            Some(id) => id == self.id,
        }
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dynamic {
            f.write_str("Arg")
        } else if self.nullable {
            write!(f, "Option<{}>", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

/// How a parameter occupies the argument list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Exactly one argument.
    Fixed(ParamType),
    /// All remaining arguments, each of the element type. Must come last.
    Variadic(ParamType),
    /// The parameter can never be bound.
    Invalid(&'static str),
}

/// A type usable as a callable parameter.
///
/// Implement it for your own types with [`param_type!`](crate::param_type).
pub trait Param: Sized + Send + 'static {
    /// Slot description used to build the callable's signature.
    fn slot() -> Slot;

    /// Takes this parameter's value off the front of a prepared argument list.
    ///
    /// Returns `None` only if the list does not fit the slot, which the
    /// matcher rules out before invocation.
    fn take(args: &mut vec::IntoIter<Arg>) -> Option<Self>;
}

/// Payload types: passed by value, cloned out of the published argument.
///
/// Every payload `T` is a [`Param`], and so is `Option<T>`, which also takes
/// null. Register your own types with [`param_type!`](crate::param_type).
pub trait Payload: Clone + Send + Sync + 'static {}

/// Implements [`Payload`] and [`Param`] for the given types.
///
/// Handlers receive a clone of the published value.
///
/// ```
/// use topicbus::{args, param_type, EventBus};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct OrderPlaced { id: u64 }
///
/// param_type!(OrderPlaced);
///
/// let bus = EventBus::new();
/// bus.subscribe("orders", |ev: OrderPlaced| assert_eq!(ev.id, 7)).unwrap();
/// bus.subscribe("orders", |ev: Option<OrderPlaced>| assert!(ev.is_some())).unwrap();
/// bus.publish("orders", args![OrderPlaced { id: 7 }]);
/// ```
#[macro_export]
macro_rules! param_type {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Payload for $ty {}

        impl $crate::Param for $ty {
            fn slot() -> $crate::Slot {
                $crate::Slot::Fixed($crate::ParamType::of::<$ty>())
            }

            fn take(
                args: &mut ::std::vec::IntoIter<$crate::Arg>,
            ) -> ::std::option::Option<Self> {
                args.next()?.downcast_ref::<$ty>().cloned()
            }
        }
    )+};
}

param_type!(
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    bool,
    char,
    (),
    String,
    &'static str,
    Vec<u8>,
    Vec<String>,
);

impl<T: ?Sized + Send + Sync + 'static> Payload for Arc<T> {}

impl<T: ?Sized + Send + Sync + 'static> Param for Arc<T> {
    fn slot() -> Slot {
        Slot::Fixed(ParamType::of::<Arc<T>>())
    }

    fn take(args: &mut vec::IntoIter<Arg>) -> Option<Self> {
        args.next()?.downcast_ref::<Arc<T>>().cloned()
    }
}

impl<T: Payload> Param for Option<T> {
    fn slot() -> Slot {
        Slot::Fixed(ParamType::nullable::<T>())
    }

    fn take(args: &mut vec::IntoIter<Arg>) -> Option<Self> {
        let arg = args.next()?;
        if arg.is_null() {
            return Some(None);
        }
        arg.downcast_ref::<T>().cloned().map(Some)
    }
}

impl Param for Arg {
    fn slot() -> Slot {
        Slot::Fixed(ParamType::dynamic())
    }

    fn take(args: &mut vec::IntoIter<Arg>) -> Option<Self> {
        args.next()
    }
}

/// Trailing parameter collecting every remaining argument.
///
/// ```
/// use topicbus::{args, EventBus, Variadic};
///
/// let bus = EventBus::new();
/// bus.subscribe("sum", |label: &'static str, rest: Variadic<i32>| {
///     assert_eq!(label, "123");
///     assert_eq!(rest.len(), 3);
/// })
/// .unwrap();
/// bus.publish("sum", args!["123", 9, 8, 7]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Variadic<P>(pub Vec<P>);

impl<P> Variadic<P> {
    /// Unwraps the collected values.
    pub fn into_inner(self) -> Vec<P> {
        self.0
    }
}

impl<P> Deref for Variadic<P> {
    type Target = [P];

    fn deref(&self) -> &[P] {
        &self.0
    }
}

impl<P> IntoIterator for Variadic<P> {
    type Item = P;
    type IntoIter = vec::IntoIter<P>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<P: Param> Param for Variadic<P> {
    fn slot() -> Slot {
        match P::slot() {
            Slot::Fixed(elem) => Slot::Variadic(elem),
            Slot::Variadic(_) => Slot::Invalid("variadic parameters cannot be nested"),
            invalid @ Slot::Invalid(_) => invalid,
        }
    }

    fn take(args: &mut vec::IntoIter<Arg>) -> Option<Self> {
        let mut out = Vec::with_capacity(args.len());
        while args.len() > 0 {
            out.push(P::take(args)?);
        }
        Some(Variadic(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args, Null};

    #[test]
    fn exact_type_only() {
        let slot = ParamType::of::<i32>();
        assert!(slot.accepts(&Arg::new(1_i32)));
        assert!(!slot.accepts(&Arg::new(1_i64)));
        assert!(!slot.accepts(&Arg::new(1_u32)));
        assert!(!slot.accepts(&Arg::null()));
    }

    #[test]
    fn nullable_and_dynamic_accept_null() {
        assert!(ParamType::nullable::<String>().accepts(&Arg::null()));
        assert!(!ParamType::nullable::<String>().accepts(&Arg::new(3_u8)));
        assert!(ParamType::dynamic().accepts(&Arg::null()));
        assert!(ParamType::dynamic().accepts(&Arg::new(3_u8)));
    }

    #[test]
    fn option_takes_null_as_none() {
        let mut it = args![Null, 5_i32].into_iter();
        assert_eq!(<Option<i32> as Param>::take(&mut it), Some(None));
        assert_eq!(<Option<i32> as Param>::take(&mut it), Some(Some(5)));
        assert_eq!(<Option<i32> as Param>::take(&mut it), None);
    }

    #[test]
    fn variadic_drains_the_rest() {
        let mut it = args![9_i32, 8_i32, 7_i32].into_iter();
        let rest = <Variadic<i32> as Param>::take(&mut it).unwrap();
        assert_eq!(rest.into_inner(), vec![9, 8, 7]);
        assert_eq!(it.len(), 0);
    }

    #[test]
    fn nested_variadic_is_invalid() {
        assert!(matches!(<Variadic<Variadic<i32>>>::slot(), Slot::Invalid(_)));
        assert_eq!(
            <Variadic<Option<u8>>>::slot(),
            Slot::Variadic(ParamType::nullable::<u8>())
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(ParamType::of::<u8>().to_string(), "u8");
        assert_eq!(ParamType::nullable::<u8>().to_string(), "Option<u8>");
        assert_eq!(ParamType::dynamic().to_string(), "Arg");
    }
}
