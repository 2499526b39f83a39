//! Domain-level error types.

use thiserror::Error;

use crate::domain::PostId;

/// Errors surfaced by the request handler.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: PostId },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ControllerError {
    pub fn post_not_found(id: PostId) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id,
        }
    }
}

/// Repository-level errors.
///
/// A failed commit never leaves part of its change set applied.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found: {0}")]
    NotFound(PostId),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
