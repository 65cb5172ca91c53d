//! Systems: incrementally maintained sets of entities matching a component
//! filter.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::mask::BitMask;
use crate::registry::{self, Component};
use crate::sparse_set::SparseSet;
use crate::world::{Entity, World};

/// A declarative component filter: one inclusion mask and two exclusion
/// masks.
///
/// An entity mask `m` matches when
///
/// * `m` has no bit in common with `exclude_any`,
/// * `exclude_all` is empty or `m` is *not* a subset of `exclude_all`, and
/// * `m` contains every bit of `include`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Filter {
    include: BitMask,
    exclude_any: BitMask,
    exclude_all: BitMask,
}

impl Filter {
    /// The inclusion mask.
    pub fn include(&self) -> &BitMask {
        &self.include
    }

    /// The exclude-any mask.
    pub fn exclude_any(&self) -> &BitMask {
        &self.exclude_any
    }

    /// The exclude-all mask.
    pub fn exclude_all(&self) -> &BitMask {
        &self.exclude_all
    }

    /// Tests an entity mask against the filter.
    pub fn matches(&self, mask: &BitMask) -> bool {
        if mask.intersects(&self.exclude_any) {
            return false;
        }
        if !self.exclude_all.is_empty() && self.exclude_all.contains_all(mask) {
            return false;
        }
        mask.contains_all(&self.include)
    }
}

/// Configures and builds a [`System`].
///
/// Returned from [`System::builder`].
#[derive(Default)]
#[must_use = "call `.build(&mut world)` to subscribe the system"]
pub struct SystemBuilder {
    filter: Filter,
}

impl SystemBuilder {
    /// Requires matching entities to have a `T` component.
    pub fn with<T: Component>(mut self) -> Self {
        self.filter.include |= registry::mask_of::<T>();
        self
    }

    /// Rejects entities that have a `T` component.
    pub fn without_any<T: Component>(mut self) -> Self {
        self.filter.exclude_any |= registry::mask_of::<T>();
        self
    }

    /// Adds `T` to the exclude-all mask: entities whose whole mask is
    /// covered by that mask are rejected.
    pub fn without_all<T: Component>(mut self) -> Self {
        self.filter.exclude_all |= registry::mask_of::<T>();
        self
    }

    /// Subscribes the system's listeners to `world` and returns the system.
    ///
    /// From this point on the matching set is maintained incrementally by
    /// the world's add/remove events. The listeners live as long as the
    /// world; the returned system shares the matching set with them.
    pub fn build(self, world: &mut World) -> System {
        let filter = self.filter;
        let matching = Rc::new(RefCell::new(SparseSet::new()));

        let set = Rc::clone(&matching);
        world.subscribe_on_add(move |entity, mask_after, _changed| {
            let mut set = set.borrow_mut();
            // An arriving component can both qualify and disqualify an
            // entity (when it is an excluded type), so membership is
            // recomputed from the new mask.
            if filter.matches(mask_after) {
                set.insert(entity.id());
            } else {
                set.remove(entity.id());
            }
        });

        let set = Rc::clone(&matching);
        world.subscribe_on_remove(move |entity, mask_before, changed| {
            let mut set = set.borrow_mut();
            // The mask still shows the departing components. A changed set
            // equal to the whole mask is bulk departure (destruction, or the
            // last component leaving): one test, unconditional removal.
            if *changed == *mask_before {
                set.remove(entity.id());
                return;
            }
            let after = mask_before.and_not(changed);
            if filter.matches(&after) {
                // Removing an excluded component can re-admit the entity.
                set.insert(entity.id());
            } else {
                set.remove(entity.id());
            }
        });

        System { filter, matching }
    }
}

/// A subscriber that maintains the set of entities matching its [`Filter`].
///
/// The set is updated synchronously from the world's add/remove events, so
/// between world mutations it always equals the set of live entities whose
/// mask satisfies the filter. Iterate it instead of sweeping component
/// stores; the stores contain dead slots, the matching set does not.
///
/// ## Examples
///
/// ```
/// use sparsecs::{Component, System, World};
///
/// struct Position(f32, f32);
/// impl Component for Position {}
///
/// struct Anchored;
/// impl Component for Anchored {}
///
/// let mut world = World::new(16);
/// let movable = System::builder()
///     .with::<Position>()
///     .without_any::<Anchored>()
///     .build(&mut world);
///
/// let e = world.create_entity_with((Position(0.0, 0.0),));
/// assert!(movable.contains(e));
///
/// world.add_component(e, Anchored).unwrap();
/// assert!(!movable.contains(e));
/// ```
pub struct System {
    filter: Filter,
    matching: Rc<RefCell<SparseSet>>,
}

impl System {
    /// Starts building a system.
    pub fn builder() -> SystemBuilder {
        SystemBuilder::default()
    }

    /// The system's filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The indices of the currently matching entities.
    ///
    /// The returned borrow must be dropped before the world is mutated
    /// again; the maintenance listeners need the set back.
    pub fn matching_entities(&self) -> Ref<'_, SparseSet> {
        self.matching.borrow()
    }

    /// Returns `true` if `entity`'s index is in the matching set.
    pub fn contains(&self, entity: Entity) -> bool {
        self.matching.borrow().contains(entity.id())
    }

    /// The number of matching entities.
    pub fn len(&self) -> usize {
        self.matching.borrow().len()
    }

    /// Returns `true` if no entity matches.
    pub fn is_empty(&self) -> bool {
        self.matching.borrow().is_empty()
    }

    /// Rebuilds the matching set from the world's mask table.
    ///
    /// The result is identical to what listener maintenance produces; this
    /// exists for bootstrap (a system built after entities already exist)
    /// and recovery.
    pub fn rescan(&mut self, world: &World) {
        let masks = world.entity_masks();
        let mut set = self.matching.borrow_mut();
        set.clear();
        for &index in world.entities() {
            if self.filter.matches(&masks[index as usize]) {
                set.insert(index);
            }
        }
    }
}
