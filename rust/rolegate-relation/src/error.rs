use thiserror::Error;

/// Errors that can occur when mutating a [`Relation`](crate::Relation).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolegateRelationError {
    /// The pair is already present in at least one index.
    #[error("({a}, {b}) is already linked")]
    AlreadyLinked {
        /// First coordinate of the pair.
        a: u32,
        /// Second coordinate of the pair.
        b: u32,
    },

    /// The pair is missing from at least one index.
    #[error("({a}, {b}) is not linked")]
    NotLinked {
        /// First coordinate of the pair.
        a: u32,
        /// Second coordinate of the pair.
        b: u32,
    },
}
