//! Class emulation for host objects
//!
//! Installed class descriptors become plain Lua tables. A derived class table
//! gets a metatable whose `__index` is its base table, so Lua's own lookup
//! walks the inheritance chain. Host objects enter Lua as [`HostObject`]
//! userdata resolving members through their class table and forwarding
//! operators to the handlers found there.

use std::any::TypeId;

use glue_core::keys::operators;
use glue_core::{Any, ClassInfo, GlueError, MapValue, Object, Upcast};
use log::debug;
use mlua::{AnyUserData, MetaMethod, Table, UserData, UserDataMethods, Value};
use rustc_hash::FxHashMap;

use crate::error::lua_error;

// ============================================================================
// Class registry
// ============================================================================

struct ClassEntry {
    descriptor: MapValue,
    name: String,
    upcasts: Vec<Upcast>,
    table: Table,
}

/// Class tables registered in one runtime, keyed by instance type
#[derive(Default)]
pub struct ClassEmulator {
    classes: FxHashMap<TypeId, ClassEntry>,
}

impl ClassEmulator {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the table built for a descriptor. The first registration for
    /// a type wins; returns whether this one was recorded.
    pub fn register(&mut self, info: ClassInfo, descriptor: MapValue, table: Table) -> bool {
        if self.classes.contains_key(&info.type_id) {
            return false;
        }
        debug!("registered class {}", info.name);
        self.classes.insert(
            info.type_id,
            ClassEntry {
                descriptor,
                name: info.name,
                upcasts: info.upcasts,
                table,
            },
        );
        true
    }

    /// Table already built for the same descriptor
    pub fn table_for_descriptor(&self, descriptor: &MapValue) -> Option<Table> {
        self.classes
            .values()
            .find(|entry| entry.descriptor.ptr_eq(descriptor))
            .map(|entry| entry.table.clone())
    }

    /// Class table and name for an object, trying its own type first and then
    /// the bases it can be upcast to
    pub fn create_instance(&self, obj: &Object) -> Option<(Table, String)> {
        let entry = self.classes.get(&obj.type_id()).or_else(|| {
            obj.upcast_targets()
                .iter()
                .find_map(|target| self.classes.get(target))
        })?;
        obj.attach_upcasts(&entry.upcasts);
        Some((entry.table.clone(), entry.name.clone()))
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Drop every class table
    pub fn clear(&mut self) {
        self.classes.clear();
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Operators forwarded to class handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Eq,
    /// unary `-`
    Neg,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `//`
    IDiv,
    /// `%`
    Mod,
    /// `tostring`
    ToString,
}

impl Operator {
    /// Operators installed as metamethods on every instance
    pub const FORWARDED: [Operator; 11] = [
        Operator::Eq,
        Operator::Neg,
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Pow,
        Operator::Lt,
        Operator::Le,
        Operator::IDiv,
        Operator::Mod,
    ];

    /// Class table key holding the handler
    pub fn key(self) -> &'static str {
        match self {
            Operator::Eq => operators::EQ,
            Operator::Neg => operators::NEG,
            Operator::Add => operators::ADD,
            Operator::Sub => operators::SUB,
            Operator::Mul => operators::MUL,
            Operator::Div => operators::DIV,
            Operator::Pow => operators::POW,
            Operator::Lt => operators::LT,
            Operator::Le => operators::LE,
            Operator::IDiv => operators::IDIV,
            Operator::Mod => operators::MOD,
            Operator::ToString => operators::TOSTRING,
        }
    }

    /// Matching Lua metamethod
    pub fn meta(self) -> MetaMethod {
        match self {
            Operator::Eq => MetaMethod::Eq,
            Operator::Neg => MetaMethod::Unm,
            Operator::Add => MetaMethod::Add,
            Operator::Sub => MetaMethod::Sub,
            Operator::Mul => MetaMethod::Mul,
            Operator::Div => MetaMethod::Div,
            Operator::Pow => MetaMethod::Pow,
            Operator::Lt => MetaMethod::Lt,
            Operator::Le => MetaMethod::Le,
            Operator::IDiv => MetaMethod::IDiv,
            Operator::Mod => MetaMethod::Mod,
            Operator::ToString => MetaMethod::ToString,
        }
    }
}

// ============================================================================
// HostObject
// ============================================================================

/// Userdata carrying a host object and, when registered, its class table
pub struct HostObject {
    value: Any,
    class: Option<Table>,
    name: String,
}

impl HostObject {
    /// Object with a registered class
    pub fn instance(obj: Object, class: Table, name: String) -> Self {
        Self {
            value: Any::Object(obj),
            class: Some(class),
            name,
        }
    }

    /// Object without a class; only identity and string form are available
    pub fn opaque(obj: Object) -> Self {
        let name = obj.type_name().to_string();
        Self {
            value: Any::Object(obj),
            class: None,
            name,
        }
    }

    /// The carried host value
    pub fn value(&self) -> Any {
        self.value.clone()
    }

    /// Release the host object now
    pub fn release(&mut self) -> Result<(), GlueError> {
        if let Any::Object(obj) = &self.value {
            obj.reset()?;
        }
        self.value = Any::Empty;
        Ok(())
    }

    fn address(&self) -> usize {
        self.value.as_object().map_or(0, Object::address)
    }
}

fn host_parts(value: &Value) -> Option<(Option<Table>, String, Any)> {
    let Value::UserData(ud) = value else {
        return None;
    };
    let host = ud.borrow::<HostObject>().ok()?;
    Some((host.class.clone(), host.name.clone(), host.value.clone()))
}

fn forward(op: Operator, lhs: Value, rhs: Value) -> mlua::Result<Value> {
    let left = host_parts(&lhs);
    let right = host_parts(&rhs);

    let (class, name) = match (&left, &right) {
        (Some((Some(class), name, _)), _) | (_, Some((Some(class), name, _))) => {
            (Some(class.clone()), name.clone())
        }
        (Some((None, name, _)), _) | (_, Some((None, name, _))) => (None, name.clone()),
        _ => (None, lhs.type_name().to_string()),
    };

    if let Some(class) = &class {
        if let Value::Function(handler) = class.get::<Value>(op.key())? {
            return handler.call::<Value>((lhs, rhs));
        }
    }

    match op {
        Operator::Eq => {
            let same = match (&left, &right) {
                (Some((_, _, a)), Some((_, _, b))) => a.is_same(b),
                _ => false,
            };
            Ok(Value::Boolean(same))
        }
        _ => Err(lua_error(GlueError::UnsupportedOperator(format!(
            "{} on {}",
            op.key(),
            name
        )))),
    }
}

impl UserData for HostObject {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |_, this, key: Value| match &this.class {
            Some(class) => class.get::<Value>(key),
            None => Err(lua_error(GlueError::Runtime(format!(
                "attempt to index a {} value",
                this.name
            )))),
        });

        methods.add_meta_function(MetaMethod::ToString, |lua, ud: AnyUserData| {
            let (class, label) = {
                let this = ud.borrow::<HostObject>()?;
                let label = format!("{}({:#x})", this.name, this.address());
                (this.class.clone(), label)
            };
            if let Some(class) = class {
                if let Value::Function(handler) = class.get::<Value>(operators::TOSTRING)? {
                    return handler.call::<Value>(ud);
                }
            }
            lua.create_string(&label).map(Value::String)
        });

        for op in Operator::FORWARDED {
            methods.add_meta_function(op.meta(), move |_, (lhs, rhs): (Value, Value)| {
                forward(op, lhs, rhs)
            });
        }
    }
}
