//! Class and enum descriptors
//!
//! A descriptor is a plain [`MapValue`] whose entries are the class's
//! constructor, member accessors, methods and operator handlers. The reserved
//! [`CLASS_KEY`] entry identifies it as a descriptor and carries the
//! [`ClassInfo`]; [`EXTENDS_KEY`] links it to its base descriptor.
//!
//! # Example
//!
//! ```ignore
//! let shape = ClassBuilder::<Shape>::new()
//!     .method("area", |s: &Shape| s.area())
//!     .build();
//! let square = ClassBuilder::<Square>::new()
//!     .with_base::<Shape>()
//!     .extends(&shape)
//!     .constructor(|side: f64| Square::new(side))
//!     .member("side", |s: &Square| s.side, |s: &mut Square, v: f64| s.side = v)
//!     .build();
//! ```

use std::any::TypeId;
use std::marker::PhantomData;

use rustc_hash::FxHashSet;

use crate::convert::IntoResult;
use crate::error::{GlueError, GlueResult};
use crate::function::{AnyFunction, IntoAnyFunction, IntoConstructor, IntoMethod, IntoMethodMut};
use crate::keys::{operators, CLASS_KEY, CONSTRUCTOR_KEY, EXTENDS_KEY};
use crate::map::{create_map, MapValue};
use crate::object::{short_type_name, Object, Upcast};
use crate::value::Any;

/// Metadata stored under [`CLASS_KEY`]
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Type id of the instances
    pub type_id: TypeId,
    /// Class name
    pub name: String,
    /// Upcasts from the instance type to its base types
    pub upcasts: Vec<Upcast>,
}

/// Class metadata of a descriptor map, if it is one
pub fn descriptor_info(map: &MapValue) -> Option<ClassInfo> {
    match map.get(CLASS_KEY).ok()? {
        Any::Object(obj) => obj.borrow::<ClassInfo>().ok().map(|info| info.clone()),
        _ => None,
    }
}

/// Every class descriptor reachable from `map`, bases before derived classes
pub fn find_class_descriptors(map: &MapValue) -> GlueResult<Vec<MapValue>> {
    let mut seen = FxHashSet::default();
    let mut found = Vec::new();
    collect_descriptors(map, &mut seen, &mut found)?;
    Ok(found)
}

fn collect_descriptors(
    map: &MapValue,
    seen: &mut FxHashSet<usize>,
    found: &mut Vec<MapValue>,
) -> GlueResult<()> {
    if !seen.insert(map.identity()) {
        return Ok(());
    }

    if descriptor_info(map).is_some() {
        if let Any::Map(base) = map.get(EXTENDS_KEY)? {
            collect_descriptors(&base, seen, found)?;
        }
        found.push(map.clone());
        return Ok(());
    }

    for (_, value) in map.entries()? {
        if let Any::Map(child) = value {
            collect_descriptors(&child, seen, found)?;
        }
    }
    Ok(())
}

fn setter_name(member: &str) -> String {
    let mut chars = member.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

// ============================================================================
// ClassBuilder
// ============================================================================

/// Builder for a class descriptor of host type `T`
pub struct ClassBuilder<T: 'static> {
    name: String,
    entries: Vec<(String, Any)>,
    constructors: Vec<AnyFunction>,
    upcasts: Vec<Upcast>,
    base: Option<MapValue>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ClassBuilder<T> {
    /// Class named after the Rust type
    pub fn new() -> Self {
        Self::named(short_type_name::<T>())
    }

    /// Class with an explicit name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            constructors: Vec::new(),
            upcasts: Vec::new(),
            base: None,
            _marker: PhantomData,
        }
    }

    /// Allow methods registered for `B` to receive a `T`
    pub fn with_base<B: 'static>(mut self) -> Self
    where
        T: AsRef<B> + AsMut<B>,
    {
        self.upcasts.push(Upcast::of::<T, B>());
        self
    }

    /// Inherit the entries of a base class descriptor
    pub fn extends(mut self, base: &MapValue) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add a constructor; the first one accepting the arguments wins
    pub fn constructor<F, M>(mut self, f: F) -> Self
    where
        F: IntoConstructor<T, M>,
    {
        self.constructors.push(f.into_constructor());
        self
    }

    /// Add a getter `name` and a setter `setName`
    pub fn member<G, S, MG, MS>(self, name: &str, getter: G, setter: S) -> Self
    where
        G: IntoMethod<T, MG>,
        S: IntoMethodMut<T, MS>,
    {
        let setter_key = setter_name(name);
        self.entry(name, getter.into_method())
            .entry(&setter_key, setter.into_method_mut())
    }

    /// Add a read-only getter `name`
    pub fn getter<G, M>(self, name: &str, getter: G) -> Self
    where
        G: IntoMethod<T, M>,
    {
        self.entry(name, getter.into_method())
    }

    /// Add a method borrowing the receiver
    pub fn method<F, M>(self, name: &str, f: F) -> Self
    where
        F: IntoMethod<T, M>,
    {
        self.entry(name, f.into_method())
    }

    /// Add a method mutably borrowing the receiver
    pub fn method_mut<F, M>(self, name: &str, f: F) -> Self
    where
        F: IntoMethodMut<T, M>,
    {
        self.entry(name, f.into_method_mut())
    }

    /// Add a static function
    pub fn function<F, M>(self, name: &str, f: F) -> Self
    where
        F: IntoAnyFunction<M>,
    {
        self.entry(name, f.into_any_function())
    }

    /// Add a static value
    pub fn value(self, name: &str, value: impl Into<Any>) -> Self {
        self.entry(name, value)
    }

    /// Add an operator handler receiving both raw operands
    pub fn operator<F, M>(self, key: &str, f: F) -> Self
    where
        F: IntoAnyFunction<M>,
    {
        self.entry(key, f.into_any_function())
    }

    /// Add a binary operator handler over two instances
    pub fn binary<F, R>(self, key: &str, f: F) -> Self
    where
        F: Fn(&T, &T) -> R + 'static,
        R: IntoResult,
    {
        let handler = AnyFunction::new(move |args: &[Any]| {
            let empty = Any::Empty;
            let lhs = args.first().unwrap_or(&empty);
            let rhs = args.get(1).unwrap_or(&empty);
            let result = {
                let lhs = lhs.borrow::<T>()?;
                let rhs = rhs.borrow::<T>()?;
                f(&lhs, &rhs)
            };
            result.into_result()
        });
        self.entry(key, handler)
    }

    /// Add a `__tostring` handler
    pub fn tostring<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> String + 'static,
    {
        self.entry(operators::TOSTRING, IntoMethod::<T, ()>::into_method(f))
    }

    fn entry(mut self, key: &str, value: impl Into<Any>) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }

    /// Produce the descriptor map
    pub fn build(self) -> MapValue {
        let map = create_map();
        let info = ClassInfo {
            type_id: TypeId::of::<T>(),
            name: self.name,
            upcasts: self.upcasts,
        };

        if !self.constructors.is_empty() {
            let upcasts = info.upcasts.clone();
            let constructors = self.constructors;
            let constructor = AnyFunction::new(move |args: &[Any]| {
                let mut last_err = GlueError::Argument("no constructor".to_string());
                for ctor in &constructors {
                    match ctor.call(args) {
                        Ok(value) => {
                            if let Any::Object(obj) = &value {
                                obj.attach_upcasts(&upcasts);
                            }
                            return Ok(value);
                        }
                        Err(err) => last_err = err,
                    }
                }
                Err(last_err)
            });
            set_entry(&map, CONSTRUCTOR_KEY, constructor.into());
        }

        for (key, value) in self.entries {
            set_entry(&map, &key, value);
        }
        if let Some(base) = self.base {
            set_entry(&map, EXTENDS_KEY, base.into());
        }
        set_entry(&map, CLASS_KEY, Object::new(info).into());
        map
    }
}

impl<T: 'static> Default for ClassBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> From<ClassBuilder<T>> for Any {
    fn from(builder: ClassBuilder<T>) -> Self {
        Any::Map(builder.build())
    }
}

fn set_entry(map: &MapValue, key: &str, value: Any) {
    // Host maps built by `create_map` never fail on set
    let _ = map.set(key, value);
}

// ============================================================================
// EnumBuilder
// ============================================================================

/// Builder for an enum descriptor.
///
/// Constants are boxed `E` values. Each gets `value()`, `==` by integer value
/// and a `Name(value)` string form.
pub struct EnumBuilder<E: Copy + 'static> {
    name: String,
    to_int: fn(E) -> i64,
    values: Vec<(String, E)>,
}

impl<E: Copy + 'static> EnumBuilder<E> {
    /// Enum named after the Rust type
    pub fn new(to_int: fn(E) -> i64) -> Self {
        Self::named(short_type_name::<E>(), to_int)
    }

    /// Enum with an explicit name
    pub fn named(name: impl Into<String>, to_int: fn(E) -> i64) -> Self {
        Self {
            name: name.into(),
            to_int,
            values: Vec::new(),
        }
    }

    /// Add a constant
    pub fn value(mut self, name: &str, value: E) -> Self {
        self.values.push((name.to_string(), value));
        self
    }

    /// Produce the descriptor map
    pub fn build(self) -> MapValue {
        let to_int = self.to_int;
        let name = self.name.clone();

        let mut builder = ClassBuilder::<E>::named(self.name)
            .method("value", move |e: &E| to_int(*e))
            .operator(
                operators::EQ,
                AnyFunction::new(move |args: &[Any]| {
                    let as_int = |v: Option<&Any>| -> Option<i64> {
                        v.and_then(|v| v.borrow::<E>().ok()).map(|e| to_int(*e))
                    };
                    match (as_int(args.first()), as_int(args.get(1))) {
                        (Some(a), Some(b)) => Ok(Any::Bool(a == b)),
                        _ => Ok(Any::Bool(false)),
                    }
                }),
            )
            .tostring(move |e: &E| format!("{}({})", name, to_int(*e)));

        for (key, value) in self.values {
            builder = builder.value(&key, Object::new(value));
        }
        builder.build()
    }
}

impl<E: Copy + 'static> From<EnumBuilder<E>> for Any {
    fn from(builder: EnumBuilder<E>) -> Self {
        Any::Map(builder.build())
    }
}
