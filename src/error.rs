//! Error types.
//!
//! There are specific types for errors (e.g. [`WrongGeneration`]) and
//! additionally one [`Error`] type that can represent them all. Each error
//! in this module has an `Into<Error>` implementation.
//!
//! None of these conditions mutate the world: an operation that returns an
//! error has not changed any state and has dispatched no events.

use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::world::{Entity, Generation};

/// The `sparsecs` error type. This is an enum which is able to represent
/// all error types of this library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An `add_component` for a type the entity already has. The existing
    /// record is untouched.
    AlreadyPresent {
        /// The entity the component was to be attached to.
        entity: Entity,
        /// The component type name, for diagnostics.
        component: &'static str,
    },
    /// A `remove_component` for a type the entity does not have.
    NotPresent {
        /// The entity the component was to be removed from.
        entity: Entity,
        /// The component type name, for diagnostics.
        component: &'static str,
    },
    /// An operation on a dead or stale entity handle.
    WrongGeneration(WrongGeneration),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::AlreadyPresent { entity, component } => write!(
                f,
                "Entity {:?} already has a `{}` component",
                entity, component
            ),
            Error::NotPresent { entity, component } => {
                write!(f, "Entity {:?} has no `{}` component", entity, component)
            }
            Error::WrongGeneration(e) => write!(f, "Wrong generation: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::WrongGeneration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WrongGeneration> for Error {
    fn from(e: WrongGeneration) -> Self {
        Error::WrongGeneration(e)
    }
}

/// Wrong generation error.
///
/// Returned when an entity-taking operation is handed a handle whose
/// generation no longer matches the one stored for its index, i.e. the
/// entity has been destroyed (and its index possibly recycled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongGeneration {
    /// The action that failed because of the wrong generation.
    pub action: &'static str,
    /// The actual generation of this index.
    pub actual_gen: Generation,
    /// The entity that has been passed, containing the index and the
    /// invalid generation.
    pub entity: Entity,
}

impl Display for WrongGeneration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Tried to {} entity {:?}, but the generation is wrong; it should be {:?}",
            self.action, self.entity, self.actual_gen
        )
    }
}

impl StdError for WrongGeneration {}
