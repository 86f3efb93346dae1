//! Traits for converting between host values and Rust types.
//!
//! `FromAny` extracts a concrete type from an [`Any`] and fails with a type
//! mismatch when the value does not fit. `IntoAny` goes the other way and is
//! infallible. `IntoResult` is the return-type seam of the typed function
//! adapters: plain values and `Result`s are both accepted.

use crate::error::{GlueError, GlueResult};
use crate::function::AnyFunction;
use crate::map::MapValue;
use crate::object::Object;
use crate::value::Any;

/// Extract a Rust value from a host value
pub trait FromAny: Sized {
    /// Convert, failing with `TypeMismatch` when the value does not fit
    fn from_any(value: &Any) -> GlueResult<Self>;
}

/// Convert a Rust value into a host value
pub trait IntoAny {
    /// Convert
    fn into_any(self) -> Any;
}

/// Return value of a host function
pub trait IntoResult {
    /// Convert into the function's result
    fn into_result(self) -> GlueResult<Any>;
}

impl<T: IntoAny> IntoResult for T {
    fn into_result(self) -> GlueResult<Any> {
        Ok(self.into_any())
    }
}

impl<T: IntoAny, E: Into<GlueError>> IntoResult for Result<T, E> {
    fn into_result(self) -> GlueResult<Any> {
        self.map(IntoAny::into_any).map_err(Into::into)
    }
}

fn mismatch<T>(value: &Any) -> GlueError {
    GlueError::mismatch(crate::object::short_type_name::<T>(), value.type_name())
}

// ============================================================================
// FromAny
// ============================================================================

impl FromAny for Any {
    fn from_any(value: &Any) -> GlueResult<Self> {
        Ok(value.clone())
    }
}

impl FromAny for bool {
    fn from_any(value: &Any) -> GlueResult<Self> {
        match value {
            Any::Bool(b) => Ok(*b),
            other => Err(mismatch::<bool>(other)),
        }
    }
}

macro_rules! impl_from_any_int {
    ($($t:ty),*) => {
        $(
            impl FromAny for $t {
                fn from_any(value: &Any) -> GlueResult<Self> {
                    let fitted = match *value {
                        Any::Int(i) => <$t>::try_from(i).ok(),
                        Any::UInt(u) => <$t>::try_from(u).ok(),
                        Any::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                            if f < 0.0 {
                                <$t>::try_from(f as i64).ok().filter(|v| *v as f64 == f)
                            } else {
                                <$t>::try_from(f as u64).ok().filter(|v| *v as f64 == f)
                            }
                        }
                        _ => None,
                    };
                    fitted.ok_or_else(|| mismatch::<$t>(value))
                }
            }
        )*
    };
}

impl_from_any_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromAny for f64 {
    fn from_any(value: &Any) -> GlueResult<Self> {
        match *value {
            Any::Float(f) => Ok(f),
            Any::Int(i) => Ok(i as f64),
            Any::UInt(u) => Ok(u as f64),
            _ => Err(mismatch::<f64>(value)),
        }
    }
}

impl FromAny for f32 {
    fn from_any(value: &Any) -> GlueResult<Self> {
        f64::from_any(value)
            .map(|f| f as f32)
            .map_err(|_| mismatch::<f32>(value))
    }
}

impl FromAny for String {
    fn from_any(value: &Any) -> GlueResult<Self> {
        match value {
            Any::String(s) => Ok(s.clone()),
            other => Err(mismatch::<String>(other)),
        }
    }
}

impl FromAny for MapValue {
    fn from_any(value: &Any) -> GlueResult<Self> {
        match value {
            Any::Map(map) => Ok(map.clone()),
            other => Err(mismatch::<MapValue>(other)),
        }
    }
}

impl FromAny for AnyFunction {
    fn from_any(value: &Any) -> GlueResult<Self> {
        match value {
            Any::Function(func) => Ok(func.clone()),
            other => Err(mismatch::<AnyFunction>(other)),
        }
    }
}

impl FromAny for Object {
    fn from_any(value: &Any) -> GlueResult<Self> {
        match value {
            Any::Object(obj) => Ok(obj.clone()),
            other => Err(mismatch::<Object>(other)),
        }
    }
}

impl<T: FromAny> FromAny for Option<T> {
    fn from_any(value: &Any) -> GlueResult<Self> {
        match value {
            Any::Empty => Ok(None),
            other => T::from_any(other).map(Some),
        }
    }
}

// ============================================================================
// IntoAny
// ============================================================================

macro_rules! impl_into_any {
    ($($t:ty),*) => {
        $(
            impl IntoAny for $t {
                fn into_any(self) -> Any {
                    Any::from(self)
                }
            }
        )*
    };
}

impl_into_any!(
    (), bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, MapValue,
    AnyFunction, Object
);

impl IntoAny for Any {
    fn into_any(self) -> Any {
        self
    }
}

impl IntoAny for &str {
    fn into_any(self) -> Any {
        Any::from(self)
    }
}

impl<T: IntoAny> IntoAny for Option<T> {
    fn into_any(self) -> Any {
        self.map_or(Any::Empty, IntoAny::into_any)
    }
}
