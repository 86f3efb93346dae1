//! Boxed host references
//!
//! An [`Object`] owns any `'static` host value behind a shared, runtime
//! borrow-checked cell. Objects carry a list of [`Upcast`]s so that code
//! written against a base type can borrow a derived value.

use std::any::{Any as StdAny, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::error::{GlueError, GlueResult};

// ============================================================================
// Upcast
// ============================================================================

type CastRef = for<'a> fn(&'a (dyn StdAny + 'static)) -> Option<&'a (dyn StdAny + 'static)>;
type CastMut =
    for<'a> fn(&'a mut (dyn StdAny + 'static)) -> Option<&'a mut (dyn StdAny + 'static)>;

/// A registered conversion from a derived host type to one of its bases
#[derive(Clone, Copy)]
pub struct Upcast {
    target: TypeId,
    target_name: &'static str,
    cast: CastRef,
    cast_mut: CastMut,
}

impl Upcast {
    /// Upcast from `D` to `B` through `D`'s `AsRef`/`AsMut` impls
    pub fn of<D, B>() -> Self
    where
        D: AsRef<B> + AsMut<B> + 'static,
        B: 'static,
    {
        fn cast<'a, D: AsRef<B> + 'static, B: 'static>(
            v: &'a (dyn StdAny + 'static),
        ) -> Option<&'a (dyn StdAny + 'static)> {
            v.downcast_ref::<D>().map(|d| d.as_ref() as &dyn StdAny)
        }
        fn cast_mut<'a, D: AsMut<B> + 'static, B: 'static>(
            v: &'a mut (dyn StdAny + 'static),
        ) -> Option<&'a mut (dyn StdAny + 'static)> {
            v.downcast_mut::<D>().map(|d| d.as_mut() as &mut dyn StdAny)
        }

        Self {
            target: TypeId::of::<B>(),
            target_name: short_type_name::<B>(),
            cast: cast::<D, B>,
            cast_mut: cast_mut::<D, B>,
        }
    }

    /// Type id of the base type
    pub fn target(&self) -> TypeId {
        self.target
    }
}

impl fmt::Debug for Upcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Upcast(-> {})", self.target_name)
    }
}

/// Last path segment of a type name, without generic arguments
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ============================================================================
// Object
// ============================================================================

struct ObjectCell {
    value: RefCell<Option<Box<dyn StdAny>>>,
    type_id: TypeId,
    type_name: &'static str,
    upcasts: RefCell<Vec<Upcast>>,
}

/// Shared boxed reference to a host value
#[derive(Clone)]
pub struct Object(Rc<ObjectCell>);

impl Object {
    /// Box a host value
    pub fn new<T: 'static>(value: T) -> Self {
        Object(Rc::new(ObjectCell {
            value: RefCell::new(Some(Box::new(value))),
            type_id: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            upcasts: RefCell::new(Vec::new()),
        }))
    }

    /// Type id of the boxed value
    pub fn type_id(&self) -> TypeId {
        self.0.type_id
    }

    /// Short type name of the boxed value
    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    /// Address of the shared cell, stable for the object's lifetime
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether two handles refer to the same boxed value
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether the value was released with [`Object::reset`]
    pub fn is_released(&self) -> bool {
        match self.0.value.try_borrow() {
            Ok(slot) => slot.is_none(),
            Err(_) => false,
        }
    }

    /// Whether the object can be borrowed as `T`, directly or through an upcast
    pub fn is<T: 'static>(&self) -> bool {
        let target = TypeId::of::<T>();
        target == self.0.type_id || self.find_cast(target).is_some()
    }

    /// Register upcasts; duplicates of an already known target are ignored
    pub fn attach_upcasts(&self, upcasts: &[Upcast]) {
        let mut known = self.0.upcasts.borrow_mut();
        for upcast in upcasts {
            if !known.iter().any(|u| u.target == upcast.target) {
                known.push(*upcast);
            }
        }
    }

    /// Base types this object can be borrowed as
    pub fn upcast_targets(&self) -> Vec<TypeId> {
        self.0.upcasts.borrow().iter().map(|u| u.target).collect()
    }

    fn find_cast(&self, target: TypeId) -> Option<Upcast> {
        self.0
            .upcasts
            .borrow()
            .iter()
            .find(|u| u.target == target)
            .copied()
    }

    fn mismatch<T: 'static>(&self) -> GlueError {
        GlueError::mismatch(short_type_name::<T>(), self.0.type_name)
    }

    /// Borrow the value as `T`
    pub fn borrow<T: 'static>(&self) -> GlueResult<Ref<'_, T>> {
        let slot = self
            .0
            .value
            .try_borrow()
            .map_err(|_| GlueError::Borrowed(self.0.type_name.to_string()))?;
        if slot.is_none() {
            return Err(GlueError::Released(self.0.type_name.to_string()));
        }

        let target = TypeId::of::<T>();
        let upcast = if target == self.0.type_id {
            None
        } else {
            Some(self.find_cast(target).ok_or_else(|| self.mismatch::<T>())?)
        };

        Ref::filter_map(slot, |slot| {
            let value = slot.as_deref()?;
            match upcast {
                None => value.downcast_ref::<T>(),
                Some(upcast) => (upcast.cast)(value)?.downcast_ref::<T>(),
            }
        })
        .map_err(|_| self.mismatch::<T>())
    }

    /// Mutably borrow the value as `T`
    pub fn borrow_mut<T: 'static>(&self) -> GlueResult<RefMut<'_, T>> {
        let slot = self
            .0
            .value
            .try_borrow_mut()
            .map_err(|_| GlueError::Borrowed(self.0.type_name.to_string()))?;
        if slot.is_none() {
            return Err(GlueError::Released(self.0.type_name.to_string()));
        }

        let target = TypeId::of::<T>();
        let upcast = if target == self.0.type_id {
            None
        } else {
            Some(self.find_cast(target).ok_or_else(|| self.mismatch::<T>())?)
        };

        RefMut::filter_map(slot, |slot| {
            let value = slot.as_deref_mut()?;
            match upcast {
                None => value.downcast_mut::<T>(),
                Some(upcast) => (upcast.cast_mut)(value)?.downcast_mut::<T>(),
            }
        })
        .map_err(|_| self.mismatch::<T>())
    }

    /// Drop the boxed value now; later borrows fail with `Released`
    pub fn reset(&self) -> GlueResult<()> {
        let released = self
            .0
            .value
            .try_borrow_mut()
            .map_err(|_| GlueError::Borrowed(self.0.type_name.to_string()))?
            .take();
        drop(released);
        Ok(())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({}@{:#x})", self.0.type_name, self.address())
    }
}
