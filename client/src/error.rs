//! Unified error handling for the client runtime.

use crate::remote::RemoteError;
use thiserror::Error;

/// Errors surfaced by a [`CollectionSession`](crate::CollectionSession).
///
/// Engine errors come back synchronously from the optimistic apply;
/// remote errors arrive later through the session's event channel, so
/// this type mostly carries the synchronous guard failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("engine error: {0}")]
    Engine(#[from] espejo_engine::Error),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_engine_errors() {
        let err: ClientError = espejo_engine::Error::NotSynced("temp_1".into()).into();
        assert_eq!(err.to_string(), "engine error: entity not yet synced: temp_1");
    }

    #[test]
    fn wraps_remote_errors() {
        let err: ClientError = RemoteError::Unavailable("connection lost".into()).into();
        assert_eq!(err.to_string(), "remote error: remote unavailable: connection lost");
    }
}
