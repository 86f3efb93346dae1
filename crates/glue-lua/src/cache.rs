//! Per-pass reference cache
//!
//! Maps host identities to the Lua values already produced for them during
//! one host-to-Lua conversion pass. The host handles are kept alive for the
//! lifetime of the cache so their identities cannot be reused mid-pass.

use glue_core::{AnyFunction, MapValue, Object};
use mlua::{AnyUserData, Function, Table};
use rustc_hash::FxHashMap;

/// Identity cache for one conversion pass
#[derive(Default)]
pub struct ReferenceCache {
    maps: FxHashMap<usize, (MapValue, Table)>,
    functions: FxHashMap<usize, (AnyFunction, Function)>,
    objects: FxHashMap<usize, (Object, AnyUserData)>,
}

impl ReferenceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Table already produced for `map`
    pub fn map(&self, map: &MapValue) -> Option<Table> {
        self.maps.get(&map.identity()).map(|(_, table)| table.clone())
    }

    /// Record the table produced for `map`
    pub fn insert_map(&mut self, map: &MapValue, table: &Table) {
        self.maps.insert(map.identity(), (map.clone(), table.clone()));
    }

    /// Function already produced for `func`
    pub fn function(&self, func: &AnyFunction) -> Option<Function> {
        self.functions
            .get(&func.identity())
            .map(|(_, function)| function.clone())
    }

    /// Record the function produced for `func`
    pub fn insert_function(&mut self, func: &AnyFunction, function: &Function) {
        self.functions
            .insert(func.identity(), (func.clone(), function.clone()));
    }

    /// Userdata already produced for `obj`
    pub fn object(&self, obj: &Object) -> Option<AnyUserData> {
        self.objects.get(&obj.address()).map(|(_, ud)| ud.clone())
    }

    /// Record the userdata produced for `obj`
    pub fn insert_object(&mut self, obj: &Object, ud: &AnyUserData) {
        self.objects.insert(obj.address(), (obj.clone(), ud.clone()));
    }

    /// Number of cached values
    pub fn len(&self) -> usize {
        self.maps.len() + self.functions.len() + self.objects.len()
    }

    /// Whether nothing was cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
