//! Host adapters over Lua values
//!
//! [`WrappedMap`] and [`WrappedFunction`] expose a Lua table or function
//! through the host `Map` and `Callable` contracts without copying.
//! [`Passthrough`] carries any other Lua value through host code unchanged.
//! Each holds its Lua value in a [`Handle`] so it becomes invalid when the
//! owning runtime is destroyed.

use std::any::Any as StdAny;
use std::ops::ControlFlow;

use glue_core::{Any, Callable, GlueError, GlueResult, Map};
use log::trace;
use mlua::{Function, Lua, MultiValue, Table, Value, WeakLua};

use crate::cache::ReferenceCache;
use crate::convert::{host_to_script, to_host};
use crate::error::glue_error;
use crate::lifetime::Handle;
use crate::runtime::runtime;

fn upgrade(lua: &WeakLua, what: &str) -> GlueResult<Lua> {
    lua.try_upgrade().ok_or_else(|| {
        log::warn!("{} used after its runtime was dropped", what);
        GlueError::InvalidReference(format!("{} outlived its runtime", what))
    })
}

// ============================================================================
// WrappedMap
// ============================================================================

/// A Lua table seen as a host map
pub struct WrappedMap {
    table: Handle<Table>,
    lua: WeakLua,
    runtime: u64,
}

impl WrappedMap {
    /// Wrap a table of `lua`
    pub fn new(lua: &Lua, table: Table) -> Self {
        let data = runtime(lua);
        trace!("wrapping table {:p}", table.to_pointer());
        Self {
            table: Handle::new(&data.lifetime, table),
            lua: lua.weak(),
            runtime: data.id,
        }
    }

    /// The wrapped table
    pub fn table(&self) -> GlueResult<Table> {
        upgrade(&self.lua, "map")?;
        self.table.get()
    }

    /// Whether the table is still reachable
    pub fn is_valid(&self) -> bool {
        self.lua.try_upgrade().is_some() && self.table.is_valid()
    }

    /// Identity of the runtime the table belongs to
    pub fn runtime_id(&self) -> u64 {
        self.runtime
    }

    fn access(&self) -> GlueResult<(Lua, Table)> {
        let lua = upgrade(&self.lua, "map")?;
        let table = self.table.get()?;
        Ok((lua, table))
    }
}

impl Map for WrappedMap {
    fn get(&self, key: &str) -> GlueResult<Any> {
        let (lua, table) = self.access()?;
        let value: Value = table.get(key).map_err(glue_error)?;
        Ok(to_host(&lua, value))
    }

    fn set(&self, key: &str, value: Any) -> GlueResult<()> {
        let (lua, table) = self.access()?;
        let mut cache = ReferenceCache::new();
        let value = host_to_script(&lua, &value, &mut cache).map_err(glue_error)?;
        table.set(key, value).map_err(glue_error)
    }

    fn for_each(&self, f: &mut dyn FnMut(&str, Any) -> ControlFlow<()>) -> GlueResult<()> {
        let (lua, table) = self.access()?;
        let entries = table
            .pairs::<Value, Value>()
            .collect::<mlua::Result<Vec<_>>>()
            .map_err(glue_error)?;

        for (key, value) in entries {
            // Only string keys are part of the map contract
            let Value::String(key) = key else {
                continue;
            };
            let key = key.to_string_lossy().to_string();
            if f(&key, to_host(&lua, value)).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn identity(&self) -> usize {
        match self.table.get() {
            Ok(table) => table.to_pointer() as usize,
            Err(_) => self as *const Self as usize,
        }
    }

    fn as_any(&self) -> &dyn StdAny {
        self
    }
}

// ============================================================================
// WrappedFunction
// ============================================================================

/// A Lua function seen as a host callable
pub struct WrappedFunction {
    function: Handle<Function>,
    lua: WeakLua,
    runtime: u64,
}

impl WrappedFunction {
    /// Wrap a function of `lua`
    pub fn new(lua: &Lua, function: Function) -> Self {
        let data = runtime(lua);
        trace!("wrapping function {:p}", function.to_pointer());
        Self {
            function: Handle::new(&data.lifetime, function),
            lua: lua.weak(),
            runtime: data.id,
        }
    }

    /// The wrapped function
    pub fn function(&self) -> GlueResult<Function> {
        upgrade(&self.lua, "function")?;
        self.function.get()
    }

    /// Whether the function is still reachable
    pub fn is_valid(&self) -> bool {
        self.lua.try_upgrade().is_some() && self.function.is_valid()
    }

    /// Identity of the runtime the function belongs to
    pub fn runtime_id(&self) -> u64 {
        self.runtime
    }
}

impl Callable for WrappedFunction {
    fn call(&self, args: &[Any]) -> GlueResult<Any> {
        let lua = upgrade(&self.lua, "function")?;
        let function = self.function.get()?;

        let mut cache = ReferenceCache::new();
        let args = args
            .iter()
            .map(|arg| host_to_script(&lua, arg, &mut cache))
            .collect::<mlua::Result<MultiValue>>()
            .map_err(glue_error)?;
        let result: Value = function.call(args).map_err(glue_error)?;
        Ok(to_host(&lua, result))
    }

    fn as_any(&self) -> &dyn StdAny {
        self
    }
}

// ============================================================================
// Passthrough
// ============================================================================

/// A Lua value with no host counterpart, returned to Lua unchanged
pub struct Passthrough {
    value: Handle<Value>,
    runtime: u64,
}

impl Passthrough {
    /// Hold a value of `lua`
    pub fn new(lua: &Lua, value: Value) -> Self {
        let data = runtime(lua);
        trace!("passing through {}", value.type_name());
        Self {
            value: Handle::new(&data.lifetime, value),
            runtime: data.id,
        }
    }

    /// The held value
    pub fn value(&self) -> GlueResult<Value> {
        self.value.get()
    }

    /// Identity of the runtime the value belongs to
    pub fn runtime_id(&self) -> u64 {
        self.runtime
    }
}
