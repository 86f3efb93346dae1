//! Callable capability and typed closure adapters
//!
//! Every host function is an [`AnyFunction`]: a shared [`Callable`] taking a
//! slice of [`Any`] arguments. Typed closures are adapted through
//! [`IntoAnyFunction`], [`IntoMethod`], [`IntoMethodMut`] and
//! [`IntoConstructor`]. Missing trailing arguments are passed as `Empty`,
//! extra arguments are ignored.

use std::any::Any as StdAny;
use std::fmt;
use std::rc::Rc;

use crate::convert::{FromAny, IntoResult};
use crate::error::{GlueError, GlueResult};
use crate::value::Any;

/// Callable capability implemented by host closures and bridge adapters
pub trait Callable {
    /// Invoke with positional arguments
    fn call(&self, args: &[Any]) -> GlueResult<Any>;

    /// Downcast seam
    fn as_any(&self) -> &dyn StdAny;
}

struct RawFunction<F>(F);

impl<F> Callable for RawFunction<F>
where
    F: Fn(&[Any]) -> GlueResult<Any> + 'static,
{
    fn call(&self, args: &[Any]) -> GlueResult<Any> {
        (self.0)(args)
    }

    fn as_any(&self) -> &dyn StdAny {
        self
    }
}

// ============================================================================
// AnyFunction
// ============================================================================

/// Shared handle to a callable
#[derive(Clone)]
pub struct AnyFunction(Rc<dyn Callable>);

impl AnyFunction {
    /// Wrap a closure over raw arguments
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Any]) -> GlueResult<Any> + 'static,
    {
        AnyFunction(Rc::new(RawFunction(f)))
    }

    /// Share a callable implementation
    pub fn from_callable<C: Callable + 'static>(callable: C) -> Self {
        AnyFunction(Rc::new(callable))
    }

    /// Invoke with positional arguments
    pub fn call(&self, args: &[Any]) -> GlueResult<Any> {
        self.0.call(args)
    }

    /// Concrete implementation, if it is a `C`
    pub fn downcast_ref<C: Callable + 'static>(&self) -> Option<&C> {
        self.0.as_any().downcast_ref::<C>()
    }

    /// Identity of the shared callable
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether both handles share the same callable
    pub fn ptr_eq(&self, other: &AnyFunction) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for AnyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:#x})", self.identity())
    }
}

// ============================================================================
// Typed adapters
// ============================================================================

/// Conversion of a typed closure into an [`AnyFunction`]
pub trait IntoAnyFunction<Marker> {
    /// Adapt
    fn into_any_function(self) -> AnyFunction;
}

impl IntoAnyFunction<AnyFunction> for AnyFunction {
    fn into_any_function(self) -> AnyFunction {
        self
    }
}

/// Conversion of a closure taking `&T` first into a method
pub trait IntoMethod<T, Marker> {
    /// Adapt; the receiver is the first argument
    fn into_method(self) -> AnyFunction;
}

/// Conversion of a closure taking `&mut T` first into a method
pub trait IntoMethodMut<T, Marker> {
    /// Adapt; the receiver is the first argument
    fn into_method_mut(self) -> AnyFunction;
}

/// Conversion of a closure producing `T` into a constructor
pub trait IntoConstructor<T, Marker> {
    /// Adapt; the result is boxed into an object
    fn into_constructor(self) -> AnyFunction;
}

const EMPTY: Any = Any::Empty;

fn split_receiver(args: &[Any]) -> GlueResult<(&Any, &[Any])> {
    args.split_first()
        .ok_or_else(|| GlueError::Argument("missing receiver".to_string()))
}

macro_rules! impl_adapters {
    ($($A:ident),*) => {
        impl<F, R, $($A,)*> IntoAnyFunction<($($A,)*)> for F
        where
            F: Fn($($A),*) -> R + 'static,
            R: IntoResult,
            $($A: FromAny,)*
        {
            #[allow(non_snake_case, unused_variables, unused_mut)]
            fn into_any_function(self) -> AnyFunction {
                AnyFunction::new(move |args: &[Any]| {
                    let mut args = args.iter();
                    $(let $A = $A::from_any(args.next().unwrap_or(&EMPTY))?;)*
                    (self)($($A),*).into_result()
                })
            }
        }

        impl<T, F, R, $($A,)*> IntoMethod<T, ($($A,)*)> for F
        where
            T: 'static,
            F: Fn(&T, $($A),*) -> R + 'static,
            R: IntoResult,
            $($A: FromAny,)*
        {
            #[allow(non_snake_case, unused_variables, unused_mut)]
            fn into_method(self) -> AnyFunction {
                AnyFunction::new(move |args: &[Any]| {
                    let (receiver, rest) = split_receiver(args)?;
                    let mut args = rest.iter();
                    $(let $A = $A::from_any(args.next().unwrap_or(&EMPTY))?;)*
                    let result = {
                        let this = receiver.borrow::<T>()?;
                        (self)(&*this, $($A),*)
                    };
                    result.into_result()
                })
            }
        }

        impl<T, F, R, $($A,)*> IntoMethodMut<T, ($($A,)*)> for F
        where
            T: 'static,
            F: Fn(&mut T, $($A),*) -> R + 'static,
            R: IntoResult,
            $($A: FromAny,)*
        {
            #[allow(non_snake_case, unused_variables, unused_mut)]
            fn into_method_mut(self) -> AnyFunction {
                AnyFunction::new(move |args: &[Any]| {
                    let (receiver, rest) = split_receiver(args)?;
                    let mut args = rest.iter();
                    $(let $A = $A::from_any(args.next().unwrap_or(&EMPTY))?;)*
                    let result = {
                        let mut this = receiver.borrow_mut::<T>()?;
                        (self)(&mut *this, $($A),*)
                    };
                    result.into_result()
                })
            }
        }

        impl<T, F, $($A,)*> IntoConstructor<T, ($($A,)*)> for F
        where
            T: 'static,
            F: Fn($($A),*) -> T + 'static,
            $($A: FromAny,)*
        {
            #[allow(non_snake_case, unused_variables, unused_mut)]
            fn into_constructor(self) -> AnyFunction {
                AnyFunction::new(move |args: &[Any]| {
                    let mut args = args.iter();
                    $(let $A = $A::from_any(args.next().unwrap_or(&EMPTY))?;)*
                    Ok(Any::object((self)($($A),*)))
                })
            }
        }
    };
}

impl_adapters!();
impl_adapters!(A1);
impl_adapters!(A1, A2);
impl_adapters!(A1, A2, A3);
impl_adapters!(A1, A2, A3, A4);
