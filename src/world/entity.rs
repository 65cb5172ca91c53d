use crossbeam_queue::SegQueue;

use crate::error::WrongGeneration;
use crate::sparse_set::SparseSet;

/// An index is basically the id of an `Entity`.
///
/// Keeping it 32 bit allows for a single 64 bit word per entity handle.
/// Indices are allocated densely and recycled, so they stay usable as
/// positions into the world's per-entity tables.
pub type Index = u32;

/// `Entity` handle, as seen by the user.
///
/// A handle pairs the table index with the generation it was created under.
/// When an index is recycled the generation is bumped, so handles held
/// across a `destroy_entity` go stale instead of silently aliasing the new
/// entity at the same index.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
pub struct Entity(Index, Generation);

impl Entity {
    /// Creates a new entity (externally from the ECS).
    #[cfg(test)]
    pub fn new(index: Index, gen: Generation) -> Entity {
        Entity(index, gen)
    }

    /// Returns the index of the `Entity`.
    #[inline]
    pub fn id(&self) -> Index {
        self.0
    }

    /// Returns the `Generation` of the `Entity`.
    #[inline]
    pub fn gen(&self) -> Generation {
        self.1
    }
}

/// Index generation. When a new entity is placed at an old index, it bumps
/// the `Generation` by 1. This allows to avoid using components from the
/// entities that were deleted.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
pub struct Generation(pub(crate) i32);

impl Generation {
    #[cfg(test)]
    pub fn new(v: i32) -> Self {
        Generation(v)
    }

    /// Returns the id of the generation.
    #[inline]
    pub fn id(&self) -> i32 {
        self.0
    }

    /// Returns `true` if entities of this `Generation` are alive.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.0 > 0
    }

    /// Kills this `Generation`.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if it's not alive.
    fn die(&mut self) {
        debug_assert!(self.is_alive());
        self.0 = -self.0;
    }

    /// Revives and increments a dead `Generation`.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if it is alive.
    fn raised(self) -> Generation {
        debug_assert!(!self.is_alive());
        Generation(1 - self.0)
    }
}

/// Internally used structure for `Entity` allocation.
///
/// Indices come either from the front of the recycled queue (FIFO, so a
/// burst of destroys is replayed in order) or from the dense counter. The
/// live set and the recycled queue are disjoint at every moment.
pub(crate) struct Allocator {
    generations: Vec<Generation>,
    alive: SparseSet,
    recycled: SegQueue<Index>,
    next: Index,
}

impl Allocator {
    pub fn with_capacity(cap: usize) -> Self {
        Allocator {
            generations: Vec::with_capacity(cap),
            alive: SparseSet::with_capacity(cap),
            recycled: SegQueue::new(),
            next: 0,
        }
    }

    /// Allocate a new entity, preferring a recycled index.
    pub fn allocate(&mut self) -> Entity {
        let index = match self.recycled.pop() {
            Some(index) => index,
            None => {
                let index = self.next;
                self.next += 1;
                index
            }
        };

        while self.generations.len() <= index as usize {
            self.generations.push(Generation(0));
        }
        let gen = self.generations[index as usize].raised();
        self.generations[index as usize] = gen;
        self.alive.insert(index);

        Entity(index, gen)
    }

    /// Kills an entity, making its index available for reuse.
    pub fn kill(&mut self, e: Entity) -> Result<(), WrongGeneration> {
        if !self.is_alive(e) {
            return Err(WrongGeneration {
                action: "destroy",
                actual_gen: self.generation_of(e.id()),
                entity: e,
            });
        }

        self.alive.remove(e.id());
        self.generations[e.id() as usize].die();
        self.recycled.push(e.id());

        Ok(())
    }

    /// Return `true` if the entity is alive.
    #[inline]
    pub fn is_alive(&self, e: Entity) -> bool {
        self.alive.contains(e.id()) && self.generations[e.id() as usize] == e.gen()
    }

    /// Returns the current handle for the given index. There's no guarantee
    /// for validity, meaning the entity could be dead.
    pub fn entity(&self, index: Index) -> Entity {
        let gen = self
            .generations
            .get(index as usize)
            .copied()
            .unwrap_or(Generation(0));
        Entity(index, gen)
    }

    /// The generation currently stored for `index`.
    pub fn generation_of(&self, index: Index) -> Generation {
        self.generations
            .get(index as usize)
            .copied()
            .unwrap_or(Generation(0))
    }

    /// The set of live entity indices.
    #[inline]
    pub fn alive(&self) -> &SparseSet {
        &self.alive
    }
}
