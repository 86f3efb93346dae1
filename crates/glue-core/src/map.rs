//! String-keyed map capability

use std::any::Any as StdAny;
use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::GlueResult;
use crate::value::Any;

/// Map capability implemented by host maps and by bridge adapters
pub trait Map {
    /// Value stored under `key`, `Empty` when absent
    fn get(&self, key: &str) -> GlueResult<Any>;

    /// Store `value` under `key`
    fn set(&self, key: &str, value: Any) -> GlueResult<()>;

    /// Visit every entry until the callback breaks
    fn for_each(&self, f: &mut dyn FnMut(&str, Any) -> ControlFlow<()>) -> GlueResult<()>;

    /// Identity of the underlying storage
    fn identity(&self) -> usize {
        self as *const Self as *const () as usize
    }

    /// Downcast seam
    fn as_any(&self) -> &dyn StdAny;
}

// ============================================================================
// MapValue
// ============================================================================

/// Shared handle to a map
#[derive(Clone)]
pub struct MapValue(Rc<dyn Map>);

impl MapValue {
    /// Share an implementation
    pub fn new<M: Map + 'static>(map: M) -> Self {
        MapValue(Rc::new(map))
    }

    /// Value under `key`
    pub fn get(&self, key: &str) -> GlueResult<Any> {
        self.0.get(key)
    }

    /// Store a value under `key`
    pub fn set(&self, key: &str, value: impl Into<Any>) -> GlueResult<()> {
        self.0.set(key, value.into())
    }

    /// Visit every entry until the callback breaks
    pub fn for_each(&self, mut f: impl FnMut(&str, Any) -> ControlFlow<()>) -> GlueResult<()> {
        self.0.for_each(&mut f)
    }

    /// All keys, in enumeration order
    pub fn keys(&self) -> GlueResult<Vec<String>> {
        let mut keys = Vec::new();
        self.0.for_each(&mut |key, _| {
            keys.push(key.to_string());
            ControlFlow::Continue(())
        })?;
        Ok(keys)
    }

    /// Every entry, in enumeration order
    pub fn entries(&self) -> GlueResult<Vec<(String, Any)>> {
        let mut entries = Vec::new();
        self.0.for_each(&mut |key, value| {
            entries.push((key.to_string(), value));
            ControlFlow::Continue(())
        })?;
        Ok(entries)
    }

    /// Identity of the underlying storage
    pub fn identity(&self) -> usize {
        self.0.identity()
    }

    /// Whether both handles share storage
    pub fn ptr_eq(&self, other: &MapValue) -> bool {
        self.identity() == other.identity()
    }

    /// Concrete implementation, if it is an `M`
    pub fn downcast_ref<M: Map + 'static>(&self) -> Option<&M> {
        self.0.as_any().downcast_ref::<M>()
    }
}

// ============================================================================
// AnyMap
// ============================================================================

/// Host-native map
#[derive(Default)]
pub struct AnyMap {
    entries: RefCell<FxHashMap<String, Any>>,
}

impl AnyMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Map for AnyMap {
    fn get(&self, key: &str) -> GlueResult<Any> {
        Ok(self.entries.borrow().get(key).cloned().unwrap_or_default())
    }

    fn set(&self, key: &str, value: Any) -> GlueResult<()> {
        let mut entries = self.entries.borrow_mut();
        if value.is_empty() {
            entries.remove(key);
        } else {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn for_each(&self, f: &mut dyn FnMut(&str, Any) -> ControlFlow<()>) -> GlueResult<()> {
        // Snapshot so the callback may write back into this map
        let snapshot: Vec<(String, Any)> = self
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in snapshot {
            if f(&key, value).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn StdAny {
        self
    }
}

/// New empty host map
pub fn create_map() -> MapValue {
    MapValue::new(AnyMap::new())
}
