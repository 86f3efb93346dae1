//! Conversion between host values and Lua values
//!
//! Both directions are total. Host-to-Lua builds native tables, closures and
//! userdata, consulting a [`ReferenceCache`] so shared or cyclic host maps
//! become a single table. Lua-to-host wraps tables and functions instead of
//! copying them; values with no host counterpart travel as passthroughs.

use glue_core::keys::{self, EXTENDS_KEY};
use glue_core::{descriptor_info, Any, AnyFunction, MapValue, Object};
use log::trace;
use mlua::{AnyUserData, Function, Lua, MultiValue, Value};

use crate::cache::ReferenceCache;
use crate::class::HostObject;
use crate::error::lua_error;
use crate::runtime::runtime;
use crate::wrapped::{Passthrough, WrappedFunction, WrappedMap};

const TRAMPOLINE_KEY: &str = "glue.trampoline";
const TRAMPOLINE: &str = "local f = ... return function(...) return f(...) end";

/// Convert a host value with a fresh cache
pub fn to_script(lua: &Lua, value: &Any) -> mlua::Result<Value> {
    let mut cache = ReferenceCache::new();
    host_to_script(lua, value, &mut cache)
}

// ============================================================================
// Host -> Lua
// ============================================================================

/// Convert a host value, sharing identities through `cache`
pub fn host_to_script(lua: &Lua, value: &Any, cache: &mut ReferenceCache) -> mlua::Result<Value> {
    Ok(match value {
        Any::Empty => Value::Nil,
        Any::Bool(b) => Value::Boolean(*b),
        Any::Int(i) => Value::Integer(*i),
        Any::UInt(u) => match i64::try_from(*u) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Number(*u as f64),
        },
        Any::Float(f) => Value::Number(*f),
        Any::String(s) => Value::String(lua.create_string(s)?),
        Any::Function(func) => Value::Function(function_to_script(lua, func, cache)?),
        Any::Map(map) => map_to_script(lua, map, cache)?,
        Any::Object(obj) => object_to_script(lua, obj, cache)?,
    })
}

fn function_to_script(
    lua: &Lua,
    func: &AnyFunction,
    cache: &mut ReferenceCache,
) -> mlua::Result<Function> {
    let data = runtime(lua);
    if let Some(wrapped) = func.downcast_ref::<WrappedFunction>() {
        if wrapped.runtime_id() == data.id {
            return wrapped.function().map_err(lua_error);
        }
    }
    if let Some(function) = cache.function(func) {
        return Ok(function);
    }

    let callable = func.clone();
    let function = lua.create_function(move |lua, args: MultiValue| {
        let args: Vec<Any> = args.into_iter().map(|arg| to_host(lua, arg)).collect();
        let result = callable.call(&args).map_err(lua_error)?;
        to_script(lua, &result)
    })?;
    trace!("created closure for host function {:#x}", func.identity());
    cache.insert_function(func, &function);
    Ok(function)
}

fn map_to_script(lua: &Lua, map: &MapValue, cache: &mut ReferenceCache) -> mlua::Result<Value> {
    let data = runtime(lua);
    if let Some(wrapped) = map.downcast_ref::<WrappedMap>() {
        if wrapped.runtime_id() == data.id {
            return wrapped.table().map(Value::Table).map_err(lua_error);
        }
    }
    if let Some(table) = cache.map(map) {
        trace!("cache hit for map {:#x}", map.identity());
        return Ok(Value::Table(table));
    }

    let info = descriptor_info(map);
    if info.is_some() {
        let known = data.classes.borrow().table_for_descriptor(map);
        if let Some(table) = known {
            cache.insert_map(map, &table);
            return Ok(Value::Table(table));
        }
    }

    // Visible before the entries so self references resolve to this table
    let table = lua.create_table()?;
    cache.insert_map(map, &table);
    if let Some(info) = info {
        data.classes.borrow_mut().register(info, map.clone(), table.clone());
    }

    let entries = map.entries().map_err(lua_error)?;
    for (key, value) in &entries {
        if keys::is_reserved(key) {
            continue;
        }
        let value = host_to_script(lua, value, cache)?;
        table.raw_set(key.as_str(), value)?;
    }

    if let Some((_, Any::Map(base))) = entries.iter().find(|(key, _)| key == EXTENDS_KEY) {
        if let Value::Table(base) = map_to_script(lua, base, cache)? {
            let meta = lua.create_table()?;
            meta.raw_set("__index", base)?;
            table.set_metatable(Some(meta));
        }
    }
    Ok(Value::Table(table))
}

fn object_to_script(lua: &Lua, obj: &Object, cache: &mut ReferenceCache) -> mlua::Result<Value> {
    let data = runtime(lua);
    if let Ok(passthrough) = obj.borrow::<Passthrough>() {
        if passthrough.runtime_id() == data.id {
            return passthrough.value().map_err(lua_error);
        }
    }
    if let Some(ud) = cache.object(obj) {
        return Ok(Value::UserData(ud));
    }

    let instance = data.classes.borrow().create_instance(obj);
    let host = match instance {
        Some((class, name)) => HostObject::instance(obj.clone(), class, name),
        None => HostObject::opaque(obj.clone()),
    };
    let ud = lua.create_userdata(host)?;
    cache.insert_object(obj, &ud);
    Ok(Value::UserData(ud))
}

// ============================================================================
// Lua -> Host
// ============================================================================

/// Convert a Lua value; tables and functions are wrapped, not copied
pub fn to_host(lua: &Lua, value: Value) -> Any {
    match value {
        Value::Nil => Any::Empty,
        Value::Boolean(b) => Any::Bool(b),
        Value::Integer(i) => Any::Int(i),
        Value::Number(n) => number_to_host(n),
        Value::String(s) => Any::String(s.to_string_lossy().to_string()),
        Value::Function(f) => Any::Function(AnyFunction::from_callable(WrappedFunction::new(lua, f))),
        Value::Table(t) => Any::Map(MapValue::new(WrappedMap::new(lua, t))),
        Value::UserData(ud) => userdata_to_host(lua, ud),
        other => passthrough(lua, other),
    }
}

fn number_to_host(n: f64) -> Any {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let signed_zero = n == 0.0 && n.is_sign_negative();
    if n.fract() == 0.0 && n >= -LIMIT && n < LIMIT && !signed_zero {
        Any::Int(n as i64)
    } else {
        Any::Float(n)
    }
}

fn userdata_to_host(lua: &Lua, ud: AnyUserData) -> Any {
    if let Ok(host) = ud.borrow::<HostObject>() {
        return host.value();
    }

    let callable = ud
        .metatable()
        .and_then(|meta| meta.contains("__call"))
        .unwrap_or(false);
    if callable {
        match trampoline(lua).and_then(|t| t.call::<Function>(ud.clone())) {
            Ok(f) => return Any::Function(AnyFunction::from_callable(WrappedFunction::new(lua, f))),
            Err(err) => log::warn!("callable userdata kept opaque: {}", err),
        }
    }
    passthrough(lua, Value::UserData(ud))
}

fn trampoline(lua: &Lua) -> mlua::Result<Function> {
    if let Ok(Value::Function(f)) = lua.named_registry_value::<Value>(TRAMPOLINE_KEY) {
        return Ok(f);
    }
    let f = lua.load(TRAMPOLINE).set_name("=glue_trampoline").into_function()?;
    lua.set_named_registry_value(TRAMPOLINE_KEY, f.clone())?;
    Ok(f)
}

fn passthrough(lua: &Lua, value: Value) -> Any {
    Any::Object(Object::new(Passthrough::new(lua, value)))
}
