//! Error types for the archive graph model.

use vault_types::EntityId;

use crate::entity::EntityKind;

/// Errors that can occur while building or inspecting a package.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A referenced entity was not found.
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// An entity with this id is already present.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(EntityId),

    /// A reference points at an entity that exists neither in the package
    /// nor anywhere else the caller could see.
    #[error("dangling reference: {entity} references missing {target}")]
    DanglingReference {
        /// The entity containing the bad reference.
        entity: EntityId,
        /// The missing target.
        target: EntityId,
    },

    /// The entity exists but is of a different kind than required.
    #[error("entity {id} is not a {expected}")]
    WrongKind { id: EntityId, expected: EntityKind },
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
