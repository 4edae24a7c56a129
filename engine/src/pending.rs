//! Pending operation bookkeeping.
//!
//! Every optimistic mutation registers exactly one in-flight record
//! here, keyed by the entity id it targets. The queue performs no IO
//! and holds no timers; failures are terminal and reported upward, and
//! retry is a user-initiated repeat of the original intent.

use crate::{error::Result, Entity, EntityId, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of mutation a pending operation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    Create,
    Update,
    Delete,
}

/// Where an in-flight operation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptState {
    /// Sent to the remote store, outcome unknown
    InFlight,
    /// The remote call was rejected; set as the entry is removed so the
    /// failed record can be surfaced in logs and events
    Failed,
}

/// One in-flight, unconfirmed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    /// Entity id the operation targets (provisional for creates)
    pub local_id: EntityId,
    /// What was attempted
    pub kind: PendingKind,
    /// The entity as submitted; for deletes this is the removed copy
    /// that rollback restores
    pub submitted: Entity,
    /// Attempt lifecycle state
    pub attempt: AttemptState,
}

impl PendingOperation {
    /// Pending record for an optimistic create.
    pub fn create(submitted: Entity) -> Self {
        Self::new(PendingKind::Create, submitted)
    }

    /// Pending record for an optimistic update.
    pub fn update(submitted: Entity) -> Self {
        Self::new(PendingKind::Update, submitted)
    }

    /// Pending record for an optimistic delete, holding the removed copy.
    pub fn delete(submitted: Entity) -> Self {
        Self::new(PendingKind::Delete, submitted)
    }

    fn new(kind: PendingKind, submitted: Entity) -> Self {
        Self {
            local_id: submitted.id.clone(),
            kind,
            submitted,
            attempt: AttemptState::InFlight,
        }
    }

    /// Mark this record as failed, consuming it.
    pub fn failed(mut self) -> Self {
        self.attempt = AttemptState::Failed;
        self
    }
}

/// Map from entity id to its single outstanding operation.
///
/// Invariant: at most one [`PendingOperation`] per id. A second
/// registration is rejected with [`Error::AlreadyPending`] rather than
/// queued or overwritten, which is what stops a double-click delete from
/// racing an in-flight update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationQueue {
    entries: HashMap<EntityId, PendingOperation>,
}

impl MutationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-flight operation.
    pub fn register(&mut self, op: PendingOperation) -> Result<()> {
        if self.entries.contains_key(&op.local_id) {
            return Err(Error::AlreadyPending(op.local_id));
        }
        self.entries.insert(op.local_id.clone(), op);
        Ok(())
    }

    /// Whether an operation is outstanding for this id.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up the outstanding operation for an id.
    pub fn get(&self, id: &str) -> Option<&PendingOperation> {
        self.entries.get(id)
    }

    /// Remove and return the outstanding operation for an id.
    pub fn remove(&mut self, id: &str) -> Option<PendingOperation> {
        self.entries.remove(id)
    }

    /// Count of outstanding operations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over outstanding operations.
    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.entries.values()
    }
}
