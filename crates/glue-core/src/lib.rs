//! Glue Core - host value model for script bridges
//!
//! This crate provides the type-erased values a bridge marshals: [`Any`],
//! string-keyed [`Map`]s, [`AnyFunction`]s and boxed [`Object`]s, plus the
//! class and enum descriptor builders a bridge installs into a script runtime.
//!
//! # Example
//!
//! ```ignore
//! use glue_core::{create_map, Any, ClassBuilder};
//!
//! struct Counter { count: i64 }
//!
//! let module = create_map();
//! module.set("Counter", ClassBuilder::<Counter>::new()
//!     .constructor(|| Counter { count: 0 })
//!     .method_mut("bump", |c: &mut Counter| { c.count += 1; c.count })
//!     .build())?;
//! module.set("add", Any::function(|a: i64, b: i64| a + b))?;
//! ```

#![warn(missing_docs)]

pub mod class;
pub mod convert;
pub mod error;
pub mod function;
pub mod keys;
pub mod map;
pub mod object;
pub mod value;

pub use class::{descriptor_info, find_class_descriptors, ClassBuilder, ClassInfo, EnumBuilder};
pub use convert::{FromAny, IntoAny, IntoResult};
pub use error::{GlueError, GlueResult};
pub use function::{
    AnyFunction, Callable, IntoAnyFunction, IntoConstructor, IntoMethod, IntoMethodMut,
};
pub use map::{create_map, AnyMap, Map, MapValue};
pub use object::{short_type_name, Object, Upcast};
pub use value::Any;
