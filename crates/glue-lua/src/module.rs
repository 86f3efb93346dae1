//! Module installation
//!
//! A module is a host map of classes and plain values. Installing it converts
//! the whole graph in one cache scope: class descriptors first, bases before
//! derived classes, then the module map itself. The resulting top-level
//! bindings are copied into the target namespace.

use glue_core::{find_class_descriptors, Any, GlueError, GlueResult, MapValue};
use log::debug;
use mlua::{Lua, Value};

use crate::cache::ReferenceCache;
use crate::convert::{host_to_script, to_host};
use crate::error::glue_error;
use crate::runtime::runtime;
use crate::wrapped::WrappedMap;

/// Convert `module` into `lua` and bind its entries in `target`
pub fn install(lua: &Lua, module: &MapValue, target: &MapValue) -> GlueResult<()> {
    let mut cache = ReferenceCache::new();

    let classes = find_class_descriptors(module)?;
    debug!("installing module with {} classes", classes.len());
    for class in &classes {
        host_to_script(lua, &Any::Map(class.clone()), &mut cache).map_err(glue_error)?;
    }

    let table = match host_to_script(lua, &Any::Map(module.clone()), &mut cache) {
        Ok(Value::Table(table)) => table,
        Ok(other) => {
            return Err(GlueError::mismatch("table", other.type_name()));
        }
        Err(err) => return Err(glue_error(err)),
    };

    let entries = table
        .pairs::<Value, Value>()
        .collect::<mlua::Result<Vec<_>>>()
        .map_err(glue_error)?;

    let native = target
        .downcast_ref::<WrappedMap>()
        .filter(|wrapped| wrapped.runtime_id() == runtime(lua).id);
    match native {
        Some(wrapped) => {
            let target = wrapped.table()?;
            for (key, value) in entries {
                if matches!(key, Value::String(_)) {
                    target.set(key, value).map_err(glue_error)?;
                }
            }
        }
        None => {
            for (key, value) in entries {
                if let Value::String(key) = key {
                    target.set(&key.to_string_lossy().to_string(), to_host(lua, value))?;
                }
            }
        }
    }

    debug!("module installed, {} values converted", cache.len());
    Ok(())
}
