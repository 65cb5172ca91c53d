//! Entities, components, and general world management.

use std::any::type_name;
use std::mem;

use crate::error::{Error, WrongGeneration};
use crate::mask::BitMask;
use crate::registry::{self, Component};
use crate::sparse_set::SparseSet;
use crate::storage::{AnyStorage, Components, VecStorage};
use crate::MAX_COMPONENTS;

pub use self::entity::{Entity, Generation, Index};

mod entity;

/// A boxed world-event listener.
///
/// Listeners receive `(entity, entity_mask, changed_mask)`. For additions
/// the entity mask already has the changed bits set; for removals it still
/// has them set (the bits are cleared right after dispatch), so a listener
/// can do final bookkeeping against the departing components. On bulk
/// departure (entity destruction) the changed mask equals the whole entity
/// mask.
///
/// Dispatch is synchronous and in registration order. Listeners must not
/// mutate the world they are subscribed to; the world and its listeners
/// form a single apartment.
pub type ChangeListener = Box<dyn FnMut(Entity, &BitMask, &BitMask)>;

/// A bundle of components that can be attached to an entity in one call.
///
/// Implemented for tuples of up to eight components. Attachment is
/// element-wise and in declaration order: every element is attempted even if
/// an earlier one fails, and the first error is returned. There is no
/// rollback; partial success is the documented behaviour.
pub trait ComponentSet {
    /// Attaches every component in the set to `entity`.
    fn attach(self, world: &mut World, entity: Entity) -> Result<(), Error>;
}

impl ComponentSet for () {
    fn attach(self, _: &mut World, _: Entity) -> Result<(), Error> {
        Ok(())
    }
}

macro_rules! component_set {
    ($($ty:ident . $idx:tt),*) => {
        impl<$($ty: Component),*> ComponentSet for ($($ty,)*) {
            fn attach(self, world: &mut World, entity: Entity) -> Result<(), Error> {
                let mut first = None;
                $(
                    if let Err(err) = world.add_component(entity, self.$idx) {
                        log::warn!("component {} of a batch attach failed: {}", $idx, err);
                        if first.is_none() {
                            first = Some(err);
                        }
                    }
                )*
                match first {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
        }
    };
}

component_set!(A.0);
component_set!(A.0, B.1);
component_set!(A.0, B.1, C.2);
component_set!(A.0, B.1, C.2, D.3);
component_set!(A.0, B.1, C.2, D.3, E.4);
component_set!(A.0, B.1, C.2, D.3, E.4, F.5);
component_set!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
component_set!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);

/// An independent container of entities and their components.
///
/// The world maintains four views of the fact "entity `e` has component
/// `C`": the entity's bit mask, the entity's attached-id list, the typed
/// slot in `C`'s store, and (for every subscribed system) the membership of
/// `e` in that system's matching set. Every public mutation keeps all four
/// consistent and then notifies the subscribed listeners.
///
/// Worlds never share entities; ids from one world are meaningless in
/// another. Component type *ids* are process-global (see [`crate::registry`]),
/// so masks mean the same thing across worlds, but storage is per-world.
///
/// ## Examples
///
/// ```
/// use sparsecs::{Component, World};
///
/// struct Pos {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component for Pos {}
///
/// struct Frozen;
///
/// impl Component for Frozen {}
///
/// let mut world = World::new(64);
///
/// let e = world.create_entity_with((Pos { x: 1.0, y: 2.0 }, Frozen));
/// assert!(world.is_alive(e));
/// assert_eq!(world.get_component::<Pos>(e).map(|p| p.x), Some(1.0));
///
/// world.remove_component::<Frozen>(e).unwrap();
/// assert!(world.get_component::<Frozen>(e).is_none());
///
/// world.destroy_entity(e).unwrap();
/// assert!(!world.is_alive(e));
/// ```
pub struct World {
    alloc: entity::Allocator,
    masks: Vec<BitMask>,
    attached: Vec<Vec<u32>>,
    stores: Vec<Option<Box<dyn AnyStorage>>>,
    counts: Vec<u32>,
    on_add: Vec<ChangeListener>,
    on_remove: Vec<ChangeListener>,
}

impl World {
    /// Constructs a world with per-entity tables pre-sized for
    /// `initial_entities`, so a steady-state simulation of that size never
    /// grows them.
    pub fn new(initial_entities: usize) -> World {
        let mut attached = Vec::new();
        attached.resize_with(initial_entities, Vec::new);
        let mut stores = Vec::new();
        stores.resize_with(MAX_COMPONENTS, || None);

        World {
            alloc: entity::Allocator::with_capacity(initial_entities),
            masks: vec![BitMask::EMPTY; initial_entities],
            attached,
            stores,
            counts: vec![0; MAX_COMPONENTS],
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    /// Creates a new, empty entity and returns its handle.
    ///
    /// Indices are recycled FIFO from destroyed entities before the dense
    /// counter is advanced; a recycled index comes back with a bumped
    /// generation.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.alloc.allocate();
        let idx = entity.id() as usize;

        if idx >= self.masks.len() {
            let grown = (self.masks.len() * 2).max(idx + 1);
            self.masks.resize(grown, BitMask::EMPTY);
            self.attached.resize_with(grown, Vec::new);
        }
        self.masks[idx] = BitMask::EMPTY;
        self.attached[idx].clear();

        entity
    }

    /// Creates an entity and attaches every component of `components` to it,
    /// in declaration order.
    ///
    /// Attachment failures (e.g. a duplicate type inside the bundle) are
    /// logged and skipped; the entity keeps whatever did attach.
    pub fn create_entity_with<S: ComponentSet>(&mut self, components: S) -> Entity {
        let entity = self.create_entity();
        let _ = components.attach(self, entity);
        entity
    }

    /// Attaches `value` to `entity`.
    ///
    /// On success every on-add listener is invoked with the entity's new
    /// mask and the single-bit changed mask of `T`.
    ///
    /// # Errors
    ///
    /// [`Error::WrongGeneration`] if `entity` is dead or stale,
    /// [`Error::AlreadyPresent`] if `entity` already has a `T`. Neither
    /// changes any state nor dispatches events.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), Error> {
        let info = registry::info_of::<T>();
        if !self.alloc.is_alive(entity) {
            return Err(self.wrong_gen("attach a component to", entity).into());
        }
        let idx = entity.id() as usize;
        if self.masks[idx].contains(info.id) {
            return Err(Error::AlreadyPresent {
                entity,
                component: type_name::<T>(),
            });
        }

        // SAFETY: the mask bit is clear, so the slot is dead.
        unsafe { self.typed_store_mut::<T>(info.id).insert(entity.id(), value) };
        self.attached[idx].push(info.id);
        self.counts[info.id as usize] += 1;
        self.masks[idx].insert(info.id);

        let mask = self.masks[idx];
        let changed = info.mask();
        for listener in &mut self.on_add {
            listener(entity, &mask, &changed);
        }

        Ok(())
    }

    /// Attaches every component of `components` to `entity`, in declaration
    /// order. Every element is attempted; the first error is returned.
    pub fn add_components<S: ComponentSet>(
        &mut self,
        entity: Entity,
        components: S,
    ) -> Result<(), Error> {
        components.attach(self, entity)
    }

    /// Detaches the `T` component from `entity` and returns it.
    ///
    /// On-remove listeners run *before* the mask bit is cleared, so they
    /// still observe the component as present; systems rely on this to test
    /// the departing entity against their inclusion masks.
    ///
    /// # Errors
    ///
    /// [`Error::WrongGeneration`] if `entity` is dead or stale,
    /// [`Error::NotPresent`] if `entity` has no `T`. Neither changes any
    /// state nor dispatches events.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, Error> {
        let info = registry::info_of::<T>();
        if !self.alloc.is_alive(entity) {
            return Err(self.wrong_gen("remove a component from", entity).into());
        }
        let idx = entity.id() as usize;
        if !self.masks[idx].contains(info.id) {
            return Err(Error::NotPresent {
                entity,
                component: type_name::<T>(),
            });
        }

        // SAFETY: the mask bit is set, so the slot is live; the bit is
        // cleared below and the slot is not read again.
        let value = unsafe { self.typed_store_mut::<T>(info.id).remove(entity.id()) };
        if let Some(pos) = self.attached[idx].iter().position(|&id| id == info.id) {
            self.attached[idx].remove(pos);
        }
        self.counts[info.id as usize] -= 1;

        let before = self.masks[idx];
        let changed = info.mask();
        for listener in &mut self.on_remove {
            listener(entity, &before, &changed);
        }
        self.masks[idx].remove(info.id);

        Ok(value)
    }

    /// Destroys `entity`, dropping every attached component.
    ///
    /// Components drop in reverse attach order. On-remove listeners are
    /// notified exactly once, with the changed mask equal to the entity's
    /// whole mask, signalling bulk departure. The index goes onto the
    /// recycled queue and will be handed out again with a bumped generation.
    ///
    /// # Errors
    ///
    /// [`WrongGeneration`] if `entity` is already dead or stale; no state
    /// changes and no events fire, so repeated destroys are no-ops after
    /// the first.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), WrongGeneration> {
        self.alloc.kill(entity)?;
        let idx = entity.id() as usize;

        let attached = mem::take(&mut self.attached[idx]);
        for &id in attached.iter().rev() {
            self.counts[id as usize] -= 1;
            if let Some(store) = self.stores[id as usize].as_mut() {
                // SAFETY: the mask bit is set for every attached id; the
                // whole mask is cleared below.
                unsafe { store.drop_slot(entity.id()) };
            }
        }

        let mask = self.masks[idx];
        for listener in &mut self.on_remove {
            listener(entity, &mask, &mask);
        }
        self.masks[idx] = BitMask::EMPTY;

        Ok(())
    }

    /// The `T` component of `entity`, if the entity is alive and has one.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        let info = registry::info_of::<T>();
        if !self.alloc.is_alive(entity) || !self.masks[entity.id() as usize].contains(info.id) {
            return None;
        }
        let store = self.typed_store::<T>(info.id)?;
        // SAFETY: the mask bit is set, so the slot is live.
        Some(unsafe { store.get(entity.id()) })
    }

    /// Mutable access to the `T` component of `entity`.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let info = registry::info_of::<T>();
        if !self.alloc.is_alive(entity) || !self.masks[entity.id() as usize].contains(info.id) {
            return None;
        }
        let store = self.typed_store_mut::<T>(info.id);
        // SAFETY: the mask bit is set, so the slot is live.
        Some(unsafe { store.get_mut(entity.id()) })
    }

    /// A read view over every `T` in the world, plus the live-record count.
    ///
    /// The view spans the store's whole slot array (including dead slots —
    /// filter through [`Components::get`]/[`Components::iter`] or a system's
    /// matching set) and borrows the world until the next mutation. A type
    /// with no store yet yields an empty view with count zero.
    pub fn components_of<T: Component>(&self) -> Components<'_, T> {
        let info = registry::info_of::<T>();
        let slots = match self.typed_store::<T>(info.id) {
            Some(store) => store.as_slice(),
            None => &[],
        };
        Components::new(slots, &self.masks, info.id, self.counts[info.id as usize])
    }

    /// The number of live `T` records across the world.
    pub fn valid_count<T: Component>(&self) -> u32 {
        self.counts[registry::id_of::<T>() as usize]
    }

    /// The set of live entity indices.
    pub fn entities(&self) -> &SparseSet {
        self.alloc.alive()
    }

    /// The current handle for `index`. There's no guarantee for validity,
    /// meaning the entity could be dead.
    pub fn entity(&self, index: Index) -> Entity {
        self.alloc.entity(index)
    }

    /// The per-entity component masks, indexed by entity index.
    pub fn entity_masks(&self) -> &[BitMask] {
        &self.masks
    }

    /// Returns `true` if `entity` is alive. O(1): live-set membership plus a
    /// generation comparison.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alloc.is_alive(entity)
    }

    /// Registers a listener for component additions. Listeners run in
    /// registration order.
    pub fn subscribe_on_add<F>(&mut self, listener: F)
    where
        F: FnMut(Entity, &BitMask, &BitMask) + 'static,
    {
        self.on_add.push(Box::new(listener));
    }

    /// Registers a listener for component removals and entity destruction.
    /// Listeners run in registration order.
    pub fn subscribe_on_remove<F>(&mut self, listener: F)
    where
        F: FnMut(Entity, &BitMask, &BitMask) + 'static,
    {
        self.on_remove.push(Box::new(listener));
    }

    fn wrong_gen(&self, action: &'static str, entity: Entity) -> WrongGeneration {
        WrongGeneration {
            action,
            actual_gen: self.alloc.generation_of(entity.id()),
            entity,
        }
    }

    fn typed_store<T: Component>(&self, id: u32) -> Option<&VecStorage<T>> {
        self.stores[id as usize]
            .as_ref()?
            .as_any()
            .downcast_ref::<VecStorage<T>>()
    }

    fn typed_store_mut<T: Component>(&mut self, id: u32) -> &mut VecStorage<T> {
        self.stores[id as usize]
            .get_or_insert_with(|| Box::new(VecStorage::<T>::new()) as Box<dyn AnyStorage>)
            .as_any_mut()
            .downcast_mut::<VecStorage<T>>()
            .expect("component id mapped to a storage of a different type")
    }
}

impl Default for World {
    fn default() -> Self {
        World::new(0)
    }
}

impl Drop for World {
    fn drop(&mut self) {
        // Live components go through the same store hooks a destroy would
        // use. No listeners fire during teardown.
        let live: Vec<Index> = self.alloc.alive().iter().copied().collect();
        for index in live {
            let attached = mem::take(&mut self.attached[index as usize]);
            for &id in attached.iter().rev() {
                self.counts[id as usize] -= 1;
                if let Some(store) = self.stores[id as usize].as_mut() {
                    // SAFETY: the mask bit is set for every attached id.
                    unsafe { store.drop_slot(index) };
                }
            }
            self.masks[index as usize] = BitMask::EMPTY;
        }
    }
}
