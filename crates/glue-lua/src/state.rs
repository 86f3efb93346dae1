//! Lua state facade
//!
//! A [`State`] either owns its runtime or views one owned elsewhere. The
//! lifetime broadcast fires once the owning state and every view shared from
//! it are dropped. Views over an external runtime never fire it.
//!
//! # Example
//!
//! ```rust,ignore
//! use glue_lua::State;
//!
//! let state = State::new()?;
//! state.root().set("answer", 42)?;
//! assert_eq!(state.get("answer * 2")?.get::<i64>()?, 84);
//! ```

use std::path::Path;
use std::rc::Rc;

use glue_core::{Any, GlueResult, MapValue};
use log::debug;
use mlua::{AnyUserData, Lua, LuaOptions, StdLib, Value};

use crate::class::HostObject;
use crate::convert;
use crate::error::{glue_error, lua_error};
use crate::module;
use crate::options::StateOptions;
use crate::runtime::{runtime, RuntimeData};
use crate::wrapped::WrappedMap;

/// Host-side handle to a Lua runtime
pub struct State {
    lua: Lua,
    data: Rc<RuntimeData>,
    root: MapValue,
    owned: bool,
    holds: bool,
    options: StateOptions,
}

impl State {
    /// Create a runtime with default options
    pub fn new() -> GlueResult<Self> {
        Self::with_options(StateOptions::default())
    }

    /// Create a runtime with the given options
    pub fn with_options(options: StateOptions) -> GlueResult<Self> {
        let lua = Lua::new_with(StdLib::NONE, LuaOptions::default()).map_err(glue_error)?;
        if let Some(limit) = options.memory_limit {
            lua.set_memory_limit(limit).map_err(glue_error)?;
        }

        let state = Self::attach(lua, options, true, true);
        if state.options.std_libs {
            state.open_standard_libs()?;
        }
        debug!("created state {}", state.data.id);
        Ok(state)
    }

    /// View a runtime owned elsewhere; dropping the view leaves it intact
    pub fn from_lua(lua: Lua) -> Self {
        Self::attach(lua, StateOptions::default(), false, false)
    }

    /// Another view of this state's runtime. A view shared from the owner
    /// keeps the runtime's handles valid until it is dropped too.
    pub fn share(&self) -> Self {
        Self::attach(self.lua.clone(), self.options.clone(), false, self.holds)
    }

    fn attach(lua: Lua, options: StateOptions, owned: bool, holds: bool) -> Self {
        let data = runtime(&lua);
        if holds {
            data.holders.set(data.holders.get() + 1);
        }
        let root = MapValue::new(WrappedMap::new(&lua, lua.globals()));
        Self {
            lua,
            data,
            root,
            owned,
            holds,
            options,
        }
    }

    /// Raw runtime handle
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Whether this state created its runtime
    pub fn is_owner(&self) -> bool {
        self.owned
    }

    /// Options this state was created with
    pub fn options(&self) -> &StateOptions {
        &self.options
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run source code under the configured chunk name
    pub fn run(&self, code: &str) -> GlueResult<Any> {
        self.run_named(code, &self.options.chunk_name)
    }

    /// Run source code under a diagnostic name
    pub fn run_named(&self, code: &str, name: &str) -> GlueResult<Any> {
        let value: Value = self
            .lua
            .load(code)
            .set_name(name)
            .eval()
            .map_err(glue_error)?;
        Ok(convert::to_host(&self.lua, value))
    }

    /// Run a script file
    pub fn run_file(&self, path: impl AsRef<Path>) -> GlueResult<Any> {
        let path = path.as_ref();
        let code = std::fs::read_to_string(path)?;
        self.run_named(&code, &format!("@{}", path.display()))
    }

    /// Evaluate an expression
    pub fn get(&self, expression: &str) -> GlueResult<Any> {
        self.run(&format!("return {}", expression))
    }

    // ========================================================================
    // Runtime
    // ========================================================================

    /// Global namespace
    pub fn root(&self) -> MapValue {
        self.root.clone()
    }

    /// Install the safe standard library
    pub fn open_standard_libs(&self) -> GlueResult<()> {
        self.lua
            .load_std_libs(StdLib::ALL_SAFE)
            .map_err(glue_error)
    }

    /// Run a full garbage collection cycle
    pub fn collect_garbage(&self) -> GlueResult<()> {
        self.lua.gc_collect().map_err(glue_error)
    }

    /// Install a module into the global namespace
    pub fn add_module(&self, module: &MapValue) -> GlueResult<()> {
        module::install(&self.lua, module, &self.root)
    }

    /// Install a module into `target`
    pub fn add_module_to(&self, module: &MapValue, target: &MapValue) -> GlueResult<()> {
        module::install(&self.lua, module, target)
    }

    /// Function releasing the host object passed to it without waiting for
    /// collection
    pub fn value_deleter(&self) -> GlueResult<Any> {
        let deleter = self
            .lua
            .create_function(|_, ud: AnyUserData| {
                if let Ok(mut host) = ud.borrow_mut::<HostObject>() {
                    host.release().map_err(lua_error)?;
                }
                Ok(())
            })
            .map_err(glue_error)?;
        Ok(convert::to_host(&self.lua, Value::Function(deleter)))
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Convert a host value into this runtime
    pub fn to_script(&self, value: &Any) -> GlueResult<Value> {
        convert::to_script(&self.lua, value).map_err(glue_error)
    }

    /// Convert a value of this runtime into a host value
    pub fn to_host(&self, value: Value) -> Any {
        convert::to_host(&self.lua, value)
    }
}

impl Drop for State {
    fn drop(&mut self) {
        if !self.holds {
            return;
        }
        let holders = self.data.holders.get().saturating_sub(1);
        self.data.holders.set(holders);
        if holders > 0 {
            return;
        }
        debug!("destroying state {}", self.data.id);
        self.data.lifetime.fire();
        if let Ok(mut classes) = self.data.classes.try_borrow_mut() {
            classes.clear();
        }
    }
}
