//! The process-global component type registry.
//!
//! Every component type is assigned a numeric id the first time the process
//! observes it, in observation order. Ids are stable for the remainder of the
//! process and shared by all worlds, so component masks mean the same thing
//! everywhere; component *storage* stays per-world.

use std::any::{type_name, Any, TypeId};
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ahash::AHashMap;
use once_cell::sync::Lazy;

use crate::mask::BitMask;
use crate::MAX_COMPONENTS;

/// Abstract component type.
///
/// A component is any plain record with a fixed size. It does not have to be
/// `Copy` or even `Clone`; the world takes ownership when a component is
/// attached and hands it back (or drops it) when it is detached.
///
/// ## Examples
///
/// ```
/// use sparsecs::Component;
///
/// pub struct Position {
///     pub x: f32,
///     pub y: f32,
/// }
///
/// impl Component for Position {}
/// ```
pub trait Component: Any + Sized {}

/// Registry data for one component type.
#[derive(Clone, Copy, Debug)]
pub struct ComponentInfo {
    /// The id assigned at first observation, in `[0, MAX_COMPONENTS)`.
    pub id: u32,
    /// The size of the component record in bytes.
    pub size: usize,
}

impl ComponentInfo {
    /// The single-bit mask for this component type.
    #[inline]
    pub fn mask(&self) -> BitMask {
        BitMask::from_bit(self.id)
    }
}

#[derive(Default)]
struct TypeRegistry {
    infos: AHashMap<TypeId, ComponentInfo>,
    next: u32,
}

impl TypeRegistry {
    fn register<T: Component>(&mut self) -> ComponentInfo {
        assert!(
            (self.next as usize) < MAX_COMPONENTS,
            "component type capacity exceeded: `{}` would be type number {}, \
             but at most {} distinct component types are supported",
            type_name::<T>(),
            self.next + 1,
            MAX_COMPONENTS,
        );

        let info = ComponentInfo {
            id: self.next,
            size: mem::size_of::<T>(),
        };
        self.infos.insert(TypeId::of::<T>(), info);
        self.next += 1;

        log::debug!(
            "registered component type `{}` as id {} ({} bytes)",
            type_name::<T>(),
            info.id,
            info.size
        );

        info
    }
}

static REGISTRY: Lazy<Mutex<TypeRegistry>> = Lazy::new(|| Mutex::new(TypeRegistry::default()));

fn registry() -> MutexGuard<'static, TypeRegistry> {
    // A panic while holding the lock leaves the map in a usable state, so
    // poisoning carries no information here.
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Looks up (or assigns) the registry data for `T`.
///
/// # Panics
///
/// Panics if more than [`MAX_COMPONENTS`] distinct component types are
/// observed by the process.
pub fn info_of<T: Component>() -> ComponentInfo {
    let mut reg = registry();
    match reg.infos.get(&TypeId::of::<T>()) {
        Some(info) => *info,
        None => reg.register::<T>(),
    }
}

/// The stable id of `T`.
pub fn id_of<T: Component>() -> u32 {
    info_of::<T>().id
}

/// The single-bit mask of `T`.
pub fn mask_of<T: Component>() -> BitMask {
    info_of::<T>().mask()
}

/// The record size of `T` in bytes.
pub fn size_of<T: Component>() -> usize {
    info_of::<T>().size
}
