//! Runtime lifetime tracking
//!
//! Every runtime owns one [`LifetimeSync`]. Adapters holding Lua handles keep
//! them in a [`Handle`], which subscribes to the sync on creation and drops its
//! subscription with it. When the owning [`State`](crate::State) is destroyed
//! the sync fires once, synchronously, and every live handle clears its value
//! before the runtime is torn down.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glue_core::{GlueError, GlueResult};
use log::{debug, warn};

/// Observer of a lifetime broadcast
pub trait Invalidate {
    /// Drop any runtime handle held
    fn invalidate(&self);
}

#[derive(Default)]
struct SyncInner {
    fired: Cell<bool>,
    next_id: Cell<u64>,
    observers: RefCell<Vec<(u64, Weak<dyn Invalidate>)>>,
}

/// Broadcast fired once when a runtime is destroyed
#[derive(Clone, Default)]
pub struct LifetimeSync {
    inner: Rc<SyncInner>,
}

impl LifetimeSync {
    /// Create an unfired sync
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the broadcast already happened
    pub fn is_fired(&self) -> bool {
        self.inner.fired.get()
    }

    /// Number of registered observers, including dead ones not yet pruned
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Register an observer; it is invalidated at once if the sync already fired
    pub fn subscribe(&self, observer: Weak<dyn Invalidate>) -> Subscription {
        if self.is_fired() {
            if let Some(observer) = observer.upgrade() {
                observer.invalidate();
            }
            return Subscription {
                inner: Weak::new(),
                id: 0,
            };
        }

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.observers.borrow_mut().push((id, observer));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Invalidate every live observer. Returns `false` if already fired.
    pub fn fire(&self) -> bool {
        if self.inner.fired.replace(true) {
            return false;
        }

        let observers: Vec<Rc<dyn Invalidate>> = self
            .inner
            .observers
            .borrow_mut()
            .drain(..)
            .filter_map(|(_, observer)| observer.upgrade())
            .collect();
        debug!("lifetime broadcast to {} observers", observers.len());

        for observer in observers {
            observer.invalidate();
        }
        true
    }
}

/// Registration token; dropping it deregisters the observer
pub struct Subscription {
    inner: Weak<SyncInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut observers) = inner.observers.try_borrow_mut() {
                observers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

struct Slot<T>(RefCell<Option<T>>);

impl<T> Invalidate for Slot<T> {
    fn invalidate(&self) {
        let released = self.0.borrow_mut().take();
        drop(released);
    }
}

/// A value cleared by its runtime's lifetime broadcast
pub struct Handle<T: 'static> {
    slot: Rc<Slot<T>>,
    _subscription: Subscription,
}

impl<T: Clone + 'static> Handle<T> {
    /// Hold `value` until `sync` fires
    pub fn new(sync: &LifetimeSync, value: T) -> Self {
        let slot = Rc::new(Slot(RefCell::new(Some(value))));
        let weak = Rc::downgrade(&slot);
        let observer: Weak<dyn Invalidate> = weak;
        let subscription = sync.subscribe(observer);
        Self {
            slot,
            _subscription: subscription,
        }
    }

    /// The held value, or `InvalidReference` once invalidated
    pub fn get(&self) -> GlueResult<T> {
        match self.slot.0.borrow().as_ref() {
            Some(value) => Ok(value.clone()),
            None => {
                warn!("use of expired runtime handle");
                Err(GlueError::InvalidReference(
                    "runtime was destroyed".to_string(),
                ))
            }
        }
    }

    /// Whether the value is still held
    pub fn is_valid(&self) -> bool {
        self.slot.0.borrow().is_some()
    }
}
