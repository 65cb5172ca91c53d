#![warn(missing_docs)]

//! # sparsecs
//!
//! A small entity-component-system runtime meant to be embedded as
//! infrastructure for simulations: physics, rendering, networking, game
//! logic.
//!
//! A [`World`] owns entities and their components. Four representations of
//! "entity `e` has component `C`" are kept consistent across every
//! mutation:
//!
//! * a per-entity [`BitMask`] for O(1) membership tests,
//! * a per-entity list of attached component ids, driving destruction,
//! * a per-type slot array holding the component values contiguously by
//!   entity index, and
//! * per-[`System`] sparse sets of matching entities, maintained
//!   incrementally through add/remove events.
//!
//! Component types register themselves on first use (see [`registry`]);
//! worlds are single-threaded apartments with synchronous listener
//! dispatch.
//!
//! ```
//! use sparsecs::{Component, System, World};
//!
//! struct Position {
//!     x: f32,
//!     y: f32,
//! }
//!
//! impl Component for Position {}
//!
//! struct Velocity {
//!     x: f32,
//!     y: f32,
//! }
//!
//! impl Component for Velocity {}
//!
//! let mut world = World::new(1024);
//! let movers = System::builder()
//!     .with::<Position>()
//!     .with::<Velocity>()
//!     .build(&mut world);
//!
//! let e = world.create_entity_with((
//!     Position { x: 0.0, y: 0.0 },
//!     Velocity { x: 1.0, y: 0.0 },
//! ));
//!
//! let indices: Vec<_> = movers.matching_entities().iter().copied().collect();
//! for index in indices {
//!     let entity = world.entity(index);
//!     let vx = world.get_component::<Velocity>(entity).map(|v| v.x);
//!     let pos = world.get_component_mut::<Position>(entity);
//!     if let (Some(vx), Some(pos)) = (vx, pos) {
//!         pos.x += vx;
//!     }
//! }
//!
//! assert_eq!(world.get_component::<Position>(e).map(|p| p.x), Some(1.0));
//! ```

pub mod error;
pub mod prelude;
pub mod registry;

mod mask;
mod sparse_set;
mod storage;
mod system;
mod world;

pub use crate::{
    error::{Error, WrongGeneration},
    mask::BitMask,
    registry::{Component, ComponentInfo},
    sparse_set::SparseSet,
    storage::{Components, ComponentsIter},
    system::{Filter, System, SystemBuilder},
    world::{ChangeListener, ComponentSet, Entity, Generation, Index, World},
};

/// The largest number of distinct component types a process may observe.
///
/// Masks are sized to this constant, so it trades memory per entity against
/// the size of the type universe.
pub const MAX_COMPONENTS: usize = 1024;
