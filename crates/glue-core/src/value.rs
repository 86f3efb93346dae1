//! The type-erased host value

use std::cell::{Ref, RefMut};
use std::fmt;

use crate::convert::FromAny;
use crate::error::GlueResult;
use crate::function::{AnyFunction, IntoAnyFunction};
use crate::map::MapValue;
use crate::object::Object;

// ============================================================================
// Any
// ============================================================================

/// Host value handed across a bridge.
///
/// Primitives are stored inline. Maps, functions and objects are shared
/// handles and compare by identity.
#[derive(Clone, Default)]
pub enum Any {
    /// Absence of a value
    #[default]
    Empty,
    /// Boolean
    Bool(bool),
    /// Signed integer of any width
    Int(i64),
    /// Unsigned integer of any width
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// String-keyed map capability
    Map(MapValue),
    /// Callable capability
    Function(AnyFunction),
    /// Boxed reference to any other host type
    Object(Object),
}

impl Any {
    /// Box an arbitrary host value
    pub fn object<T: 'static>(value: T) -> Self {
        Any::Object(Object::new(value))
    }

    /// Wrap a typed closure as a function value
    pub fn function<F, M>(f: F) -> Self
    where
        F: IntoAnyFunction<M>,
    {
        Any::Function(f.into_any_function())
    }

    /// Whether this is `Empty`
    pub fn is_empty(&self) -> bool {
        matches!(self, Any::Empty)
    }

    /// Map handle, if this is a map
    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Any::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Function handle, if this is a function
    pub fn as_function(&self) -> Option<&AnyFunction> {
        match self {
            Any::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Object handle, if this is a boxed reference
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Any::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// String slice, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Any::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a concrete type
    pub fn get<T: FromAny>(&self) -> GlueResult<T> {
        T::from_any(self)
    }

    /// Borrow the boxed object as `T`
    pub fn borrow<T: 'static>(&self) -> GlueResult<Ref<'_, T>> {
        match self {
            Any::Object(obj) => obj.borrow::<T>(),
            other => Err(crate::GlueError::mismatch(
                crate::object::short_type_name::<T>(),
                other.type_name(),
            )),
        }
    }

    /// Mutably borrow the boxed object as `T`
    pub fn borrow_mut<T: 'static>(&self) -> GlueResult<RefMut<'_, T>> {
        match self {
            Any::Object(obj) => obj.borrow_mut::<T>(),
            other => Err(crate::GlueError::mismatch(
                crate::object::short_type_name::<T>(),
                other.type_name(),
            )),
        }
    }

    /// Name of the held kind, or of the boxed type for objects
    pub fn type_name(&self) -> &'static str {
        match self {
            Any::Empty => "Empty",
            Any::Bool(_) => "bool",
            Any::Int(_) => "int",
            Any::UInt(_) => "uint",
            Any::Float(_) => "float",
            Any::String(_) => "String",
            Any::Map(_) => "Map",
            Any::Function(_) => "Function",
            Any::Object(obj) => obj.type_name(),
        }
    }

    /// Identity comparison for shared handles, `false` for primitives
    pub fn is_same(&self, other: &Any) -> bool {
        match (self, other) {
            (Any::Map(a), Any::Map(b)) => a.ptr_eq(b),
            (Any::Function(a), Any::Function(b)) => a.ptr_eq(b),
            (Any::Object(a), Any::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Any::Int(i) => Some(i as f64),
            Any::UInt(u) => Some(u as f64),
            Any::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl PartialEq for Any {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Any::Empty, Any::Empty) => true,
            (Any::Bool(a), Any::Bool(b)) => a == b,
            (Any::String(a), Any::String(b)) => a == b,
            (Any::Int(a), Any::Int(b)) => a == b,
            (Any::UInt(a), Any::UInt(b)) => a == b,
            (Any::Int(i), Any::UInt(u)) | (Any::UInt(u), Any::Int(i)) => {
                u64::try_from(*i).is_ok_and(|i| i == *u)
            }
            (Any::Map(_), _) | (Any::Function(_), _) | (Any::Object(_), _) => self.is_same(other),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Any::Empty => write!(f, "Empty"),
            Any::Bool(b) => write!(f, "Bool({})", b),
            Any::Int(i) => write!(f, "Int({})", i),
            Any::UInt(u) => write!(f, "UInt({})", u),
            Any::Float(x) => write!(f, "Float({})", x),
            Any::String(s) => write!(f, "String({:?})", s),
            Any::Map(map) => write!(f, "Map({:#x})", map.identity()),
            Any::Function(func) => write!(f, "{:?}", func),
            Any::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

// ============================================================================
// From impls
// ============================================================================

macro_rules! impl_from_int {
    ($variant:ident, $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Any {
                fn from(v: $t) -> Self {
                    Any::$variant(v as $target)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64: i8, i16, i32, i64, isize);
impl_from_int!(UInt, u64: u8, u16, u32, u64, usize);

impl From<bool> for Any {
    fn from(v: bool) -> Self {
        Any::Bool(v)
    }
}

impl From<f32> for Any {
    fn from(v: f32) -> Self {
        Any::Float(v as f64)
    }
}

impl From<f64> for Any {
    fn from(v: f64) -> Self {
        Any::Float(v)
    }
}

impl From<String> for Any {
    fn from(v: String) -> Self {
        Any::String(v)
    }
}

impl From<&str> for Any {
    fn from(v: &str) -> Self {
        Any::String(v.to_string())
    }
}

impl From<MapValue> for Any {
    fn from(v: MapValue) -> Self {
        Any::Map(v)
    }
}

impl From<AnyFunction> for Any {
    fn from(v: AnyFunction) -> Self {
        Any::Function(v)
    }
}

impl From<Object> for Any {
    fn from(v: Object) -> Self {
        Any::Object(v)
    }
}

impl From<()> for Any {
    fn from(_: ()) -> Self {
        Any::Empty
    }
}

impl<T: Into<Any>> From<Option<T>> for Any {
    fn from(v: Option<T>) -> Self {
        v.map_or(Any::Empty, Into::into)
    }
}
