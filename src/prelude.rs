//! Prelude module
//!
//! Contains the most common types for building and querying worlds.

pub use crate::{
    BitMask, Component, ComponentSet, Components, Entity, Filter, Generation, Index, SparseSet,
    System, SystemBuilder, World,
};
