use crate::{EntityKind, ServiceId, UserId};
use rolegate_invocation::RolegateInvocationError;
use rolegate_relation::RolegateRelationError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Errors that can occur when working with a [`Registry`](crate::Registry).
#[derive(Error, Debug)]
pub enum RolegateRegistryError {
    /// A name was given where an identifier was expected, and no entity of
    /// that kind goes by it.
    #[error("No {kind} is named '{name}'")]
    MissingIdentifier {
        /// Kind of entity looked up.
        kind: EntityKind,
        /// The name that did not resolve.
        name: String,
    },

    /// An identifier does not name a live entity.
    #[error("{kind} {id} does not exist")]
    NotFound {
        /// Kind of entity looked up.
        kind: EntityKind,
        /// The unknown identifier.
        id: u32,
    },

    /// An entity of the same kind already goes by the name.
    #[error("A {kind} named '{name}' already exists")]
    DuplicateName {
        /// Kind of entity created.
        kind: EntityKind,
        /// The name in use.
        name: String,
    },

    /// Every identifier of a kind has been handed out.
    #[error("No {0} identifiers left to allocate")]
    IdentifiersExhausted(EntityKind),

    /// A membership or authorization change conflicts with the current
    /// relation.
    #[error(transparent)]
    Relation(#[from] RolegateRelationError),

    /// The reference monitor refused the request.
    #[error("{user} is not authorized to invoke {service}")]
    Denied {
        /// The requesting user.
        user: UserId,
        /// The requested service.
        service: ServiceId,
    },

    /// The service could not be invoked.
    #[error(transparent)]
    Invocation(#[from] RolegateInvocationError),

    /// The registry broke one of its own invariants.
    #[error("Registry is inconsistent: {0}")]
    Consistency(#[from] ConsistencyError),
}

impl RolegateRegistryError {
    /// Returns true when the error is a refused authorization, as opposed to
    /// a failure to reach a decision at all.
    pub fn is_denied(&self) -> bool {
        matches!(self, RolegateRegistryError::Denied { .. })
    }
}

/// Which index of a table a consistency check was looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    /// Relation rows keyed by their first coordinate.
    Forward,
    /// Relation rows keyed by their second coordinate.
    Backward,
    /// Directory entries keyed by identifier.
    ById,
    /// Directory entries keyed by name.
    ByName,
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Index::Forward => "forward",
            Index::Backward => "backward",
            Index::ById => "by-id",
            Index::ByName => "by-name",
        })
    }
}

/// A broken registry invariant, as found by [`verify`](crate::verify).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{table} ({index}) at {row}: {message}")]
pub struct ConsistencyError {
    /// The table that failed, e.g. `membership` or `users`.
    pub table: &'static str,
    /// The index the failing row was found in.
    pub index: Index,
    /// The failing row.
    pub row: String,
    /// What is wrong with it.
    pub message: String,
}
