//! The remote collection capability interface.
//!
//! The core never talks to a concrete backend: it consumes this narrow
//! trait, which any remote document store can implement. The
//! subscription is a consumed async stream rather than a registered
//! callback, so teardown is an explicit, race-free cancellation.

mod memory;

pub use memory::InMemoryRemote;

use espejo_engine::{Entity, EntityId};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the remote store.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteError {
    /// The call never reached the store (network down, timeout upstream)
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The caller is not allowed to perform the operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The store refused the operation (server-side validation, unknown id)
    #[error("rejected by remote: {0}")]
    Rejected(String),
}

/// Events delivered by a collection subscription.
///
/// The subscription observes repeated full-membership listings, not
/// deltas: every batch is the complete current membership of the
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionEvent {
    /// The full current membership of the collection
    Batch(Vec<Entity>),
    /// The subscription itself failed
    Failed(RemoteError),
}

/// The stream of subscription events for one collection.
pub type SubscriptionStream = BoxStream<'static, SubscriptionEvent>;

/// One named remote collection: a realtime change subscription plus
/// create/update/delete operations with server-assigned identifiers and
/// last-writer-wins semantics.
pub trait RemoteCollection: Send + Sync + 'static {
    /// Open a realtime subscription. Dropping the stream unsubscribes.
    fn subscribe(&self) -> SubscriptionStream;

    /// Create an entity; the store assigns and returns the canonical id.
    fn create(&self, fields: serde_json::Value)
        -> BoxFuture<'static, Result<EntityId, RemoteError>>;

    /// Replace an entity's fields.
    fn update(
        &self,
        id: EntityId,
        fields: serde_json::Value,
    ) -> BoxFuture<'static, Result<(), RemoteError>>;

    /// Delete an entity.
    fn delete(&self, id: EntityId) -> BoxFuture<'static, Result<(), RemoteError>>;
}
