//! # Conversion of closures and values into [`Callable`]s.
//!
//! [`IntoCallable`] is implemented for:
//! - every `Fn(P1, …, Pn) + Send + Sync + 'static` with `n <= 8` and `Pi: Param`;
//! - [`Callable`] itself;
//! - [`Arg`], which converts only when it carries a `Callable` and fails with
//!   [`BusError::InvalidCallable`] otherwise. This is the path used by layers
//!   that receive handlers as dynamically typed values.
//!
//! The `Marker` parameter only disambiguates the closure impls per arity; it
//! is always inferred.

use std::sync::Arc;

use super::arg::Arg;
use super::matcher::Prepared;
use super::param::Param;
use super::signature::Signature;
use super::{Callable, Identity, Thunk};
use crate::error::{BusError, Result};

/// Values that can be subscribed as handlers.
pub trait IntoCallable<Marker>: Send + Sync + 'static {
    /// Wraps the value.
    ///
    /// # Errors
    /// [`BusError::InvalidCallable`] when the value cannot be invoked or its
    /// parameter list is malformed.
    fn into_callable(self) -> Result<Callable>;

    /// Identity the value has once wrapped, without consuming it.
    ///
    /// # Errors
    /// Same conditions as [`IntoCallable::into_callable`].
    fn identity(&self) -> Result<Identity>;
}

impl IntoCallable<Callable> for Callable {
    fn into_callable(self) -> Result<Callable> {
        Ok(self)
    }

    fn identity(&self) -> Result<Identity> {
        Ok(Callable::identity(self).clone())
    }
}

impl IntoCallable<Arg> for Arg {
    fn into_callable(self) -> Result<Callable> {
        self.downcast_ref::<Callable>().cloned().ok_or_else(|| {
            BusError::invalid_callable(format!("{} is not callable", self.type_name()))
        })
    }

    fn identity(&self) -> Result<Identity> {
        self.downcast_ref::<Callable>()
            .map(|callable| callable.identity().clone())
            .ok_or_else(|| {
                BusError::invalid_callable(format!("{} is not callable", self.type_name()))
            })
    }
}

macro_rules! impl_into_callable {
    ($($P:ident),*) => {
        impl<F, $($P,)*> IntoCallable<fn($($P,)*)> for F
        where
            F: Fn($($P),*) + Send + Sync + 'static,
            $($P: Param,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_callable(self) -> Result<Callable> {
                let identity = IntoCallable::<fn($($P,)*)>::identity(&self)?;
                let thunk: Thunk = Arc::new(move |prepared: Prepared| {
                    let mut args = prepared.into_iter();
                    $(
                        let Some($P) = <$P as Param>::take(&mut args) else {
                            return;
                        };
                    )*
                    (self)($($P),*);
                });
                Ok(Callable::new(identity, thunk))
            }

            fn identity(&self) -> Result<Identity> {
                let signature = Signature::new([$(<$P as Param>::slot()),*])?;
                Ok(Identity::of_type::<F>(signature))
            }
        }
    };
}

impl_into_callable!();
impl_into_callable!(A);
impl_into_callable!(A, B);
impl_into_callable!(A, B, C);
impl_into_callable!(A, B, C, D);
impl_into_callable!(A, B, C, D, E);
impl_into_callable!(A, B, C, D, E, G);
impl_into_callable!(A, B, C, D, E, G, H);
impl_into_callable!(A, B, C, D, E, G, H, I);
