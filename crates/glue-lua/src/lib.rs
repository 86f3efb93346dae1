//! Glue Lua - bridge between glue host values and an embedded Lua runtime
//!
//! This crate marshals [`glue_core::Any`] values into Lua and back, exposes
//! Lua tables and functions to host code through the host map and callable
//! contracts, emulates host classes (members, inheritance, operators) and
//! installs host modules into a runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! use glue_core::{create_map, Any};
//! use glue_lua::State;
//!
//! let state = State::new()?;
//! let module = create_map();
//! module.set("add", Any::function(|a: i64, b: i64| a + b))?;
//! state.add_module(&module)?;
//! assert_eq!(state.get("add(1, 2)")?, Any::Int(3));
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod class;
pub mod convert;
pub mod error;
pub mod lifetime;
pub mod module;
pub mod options;
pub mod runtime;
pub mod state;
pub mod wrapped;

pub use cache::ReferenceCache;
pub use class::{ClassEmulator, HostObject, Operator};
pub use convert::{host_to_script, to_host, to_script};
pub use error::{glue_error, lua_error};
pub use lifetime::{Handle, Invalidate, LifetimeSync, Subscription};
pub use module::install;
pub use options::StateOptions;
pub use runtime::{runtime, RuntimeData};
pub use state::State;
pub use wrapped::{Passthrough, WrappedFunction, WrappedMap};

pub use glue_core;
pub use mlua;
