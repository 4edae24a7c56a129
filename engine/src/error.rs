//! Error types for the Espejo engine.

use crate::{EntityId, FieldName};
use thiserror::Error;

/// All possible errors from the Espejo engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid fields: {0}")]
    InvalidFields(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(FieldName),

    // Mutation guards
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("entity not yet synced: {0}")]
    NotSynced(EntityId),

    #[error("mutation already pending for entity: {0}")]
    AlreadyPending(EntityId),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::MissingRequiredField("nombre".into());
        assert_eq!(err.to_string(), "missing required field: nombre");

        let err = Error::NotSynced("temp_17".into());
        assert_eq!(err.to_string(), "entity not yet synced: temp_17");

        let err = Error::AlreadyPending("abc123".into());
        assert_eq!(
            err.to_string(),
            "mutation already pending for entity: abc123"
        );
    }
}
