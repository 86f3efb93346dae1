//! Per-runtime bridge state
//!
//! Bridge state lives in the Lua instance's app data, so any code holding a
//! `Lua` can reach it and independent runtimes never share it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use mlua::Lua;

use crate::class::ClassEmulator;
use crate::lifetime::LifetimeSync;

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by every bridge operation on one runtime
pub struct RuntimeData {
    /// Identity of the runtime, used to recognize its own handles
    pub id: u64,
    /// Broadcast fired when the owning state is destroyed
    pub lifetime: LifetimeSync,
    /// Registered class tables
    pub classes: RefCell<ClassEmulator>,
    /// Live states keeping the runtime's handles valid
    pub holders: Cell<usize>,
}

impl RuntimeData {
    fn new() -> Self {
        Self {
            id: NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed),
            lifetime: LifetimeSync::new(),
            classes: RefCell::new(ClassEmulator::new()),
            holders: Cell::new(0),
        }
    }
}

/// Bridge state of `lua`, created on first use
pub fn runtime(lua: &Lua) -> Rc<RuntimeData> {
    if let Some(data) = lua.app_data_ref::<Rc<RuntimeData>>() {
        return Rc::clone(&*data);
    }

    let data = Rc::new(RuntimeData::new());
    lua.set_app_data(Rc::clone(&data));
    log::debug!("bridge state {} attached", data.id);
    data
}
