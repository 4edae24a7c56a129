//! OptimisticStore - the single mutation and reconciliation entry point.
//!
//! The store holds one collection's snapshot, applies user mutations
//! against it immediately under provisional identifiers, and reconciles
//! authoritative remote listings against the unconfirmed local state.
//! The remote call itself is issued by the embedding runtime, which
//! reports the outcome back through the resolve/reject paths.

use crate::{
    entity::is_provisional, error::Result, CollectionName, Entity, EntityId, Error, MutationQueue,
    PendingKind, PendingOperation, ProvisionalIdSource, Snapshot, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The local mirror of one remote collection.
///
/// Every entry point takes `&mut self`; the embedding runtime serializes
/// mutation intents and ingested batches through a single critical
/// section so presentation never observes a torn intermediate state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimisticStore {
    /// Name of the mirrored collection
    collection: CollectionName,
    /// The ordered local mirror
    snapshot: Snapshot,
    /// In-flight operations keyed by entity id
    queue: MutationQueue,
    /// Source of provisional ids
    ids: ProvisionalIdSource,
}

impl OptimisticStore {
    /// Create an empty store for one collection.
    pub fn new(collection: impl Into<CollectionName>) -> Self {
        Self {
            collection: collection.into(),
            snapshot: Snapshot::new(),
            queue: MutationQueue::new(),
            ids: ProvisionalIdSource::new(),
        }
    }

    /// Name of the mirrored collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The current snapshot (read-only).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The outstanding operation for an id, if any.
    pub fn pending(&self, id: &str) -> Option<&PendingOperation> {
        self.queue.get(id)
    }

    /// Count of in-flight operations.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Apply an optimistic create.
    ///
    /// Builds an entity from `fields` under a fresh provisional id,
    /// appends it to the snapshot, registers the pending create, and
    /// returns the id synchronously so presentation can reference the
    /// entity before the remote round trip completes. Field content is
    /// the caller's to validate; the store only enforces identity rules.
    pub fn apply_optimistic_create(
        &mut self,
        fields: serde_json::Value,
        now_ms: Timestamp,
    ) -> EntityId {
        let local_id = self.ids.next(now_ms);
        let entity = Entity::new(local_id.clone(), fields);
        self.queue
            .register(PendingOperation::create(entity.clone()))
            .expect("freshly minted provisional ids never repeat");
        self.snapshot.insert(entity);
        local_id
    }

    /// Apply an optimistic update, replacing the entity's fields in
    /// place.
    ///
    /// Fails with [`Error::NotSynced`] on a provisional id (no canonical
    /// reference exists yet for the remote to target) and with
    /// [`Error::AlreadyPending`] while another operation on the id is in
    /// flight. No snapshot mutation happens on any error path.
    pub fn apply_optimistic_update(&mut self, id: &str, fields: serde_json::Value) -> Result<()> {
        self.guard_mutable(id)?;
        let current = self
            .snapshot
            .get(id)
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))?;

        let mut updated = current.clone();
        updated.replace_fields(fields);
        self.queue.register(PendingOperation::update(updated.clone()))?;
        self.snapshot.insert(updated);
        Ok(())
    }

    /// Apply an optimistic delete, removing the entity immediately.
    ///
    /// The removed copy is held by the pending entry for rollback and
    /// also returned to the caller. Guards as for updates.
    pub fn apply_optimistic_delete(&mut self, id: &str) -> Result<Entity> {
        self.guard_mutable(id)?;
        let entity = self
            .snapshot
            .get(id)
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))?
            .clone();

        self.queue.register(PendingOperation::delete(entity.clone()))?;
        self.snapshot.remove(id);
        Ok(entity)
    }

    /// Promote a confirmed create to its canonical id.
    ///
    /// Rewrites the snapshot entry in place and clears the pending
    /// create. Idempotent: a no-op when the create was already resolved
    /// or rolled back. When a remote batch has already delivered the
    /// canonical entity, the provisional entry is dropped instead of
    /// rewritten so no two entries ever share an id.
    pub fn resolve_create(&mut self, local_id: &str, canonical_id: impl Into<EntityId>) {
        if !self.has_pending(local_id, PendingKind::Create) {
            return;
        }
        self.queue.remove(local_id);

        let canonical_id = canonical_id.into();
        if self.snapshot.contains(&canonical_id) {
            self.snapshot.remove(local_id);
        } else {
            self.snapshot.rewrite_id(local_id, canonical_id);
        }
    }

    /// Roll back a rejected create, removing the provisional entity.
    ///
    /// Returns the failed pending record for reporting; `None` when the
    /// create was already resolved or rolled back.
    pub fn reject_create(&mut self, local_id: &str) -> Option<PendingOperation> {
        if !self.has_pending(local_id, PendingKind::Create) {
            return None;
        }
        let op = self.queue.remove(local_id)?;
        self.snapshot.remove(local_id);
        Some(op.failed())
    }

    /// Clear a confirmed update or delete. Idempotent.
    pub fn resolve_mutation(&mut self, id: &str) {
        if matches!(self.queue.get(id), Some(op) if op.kind != PendingKind::Create) {
            self.queue.remove(id);
        }
    }

    /// Roll back a rejected update or delete.
    ///
    /// A rejected delete re-inserts the removed copy held by the pending
    /// entry. A rejected update leaves the optimistic edit standing (the
    /// local state already reflects user intent), asymmetric with
    /// creates and deletes. Returns the failed pending record for
    /// reporting.
    pub fn reject_mutation(&mut self, id: &str) -> Option<PendingOperation> {
        let kind = self.queue.get(id).map(|op| op.kind)?;
        match kind {
            PendingKind::Create => None,
            PendingKind::Update => self.queue.remove(id).map(PendingOperation::failed),
            PendingKind::Delete => {
                let op = self.queue.remove(id)?;
                self.snapshot.insert(op.submitted.clone());
                Some(op.failed())
            }
        }
    }

    /// Reconcile an authoritative full-membership listing into the
    /// snapshot.
    ///
    /// Canonical entries follow the batch unconditionally: matching ids
    /// are replaced, unknown ids are added, and canonical ids absent
    /// from the batch are removed. Provisional entries are invisible to
    /// this step: they survive untouched, after the batch in their
    /// prior relative order, until their own create resolves. Incoming
    /// entities carrying a provisional-form id are ignored (only this
    /// store mints those), and duplicate ids within one batch resolve
    /// last-writer-wins.
    pub fn ingest_remote_batch(&mut self, batch: Vec<Entity>) {
        let mut merged: Vec<Entity> = Vec::with_capacity(batch.len());
        let mut index: HashMap<EntityId, usize> = HashMap::with_capacity(batch.len());

        for mut incoming in batch {
            if is_provisional(&incoming.id) {
                continue;
            }
            if let Some(prev) = self.snapshot.get(&incoming.id) {
                incoming.revision = prev.revision + 1;
            }
            match index.get(&incoming.id) {
                Some(&i) => merged[i] = incoming,
                None => {
                    index.insert(incoming.id.clone(), merged.len());
                    merged.push(incoming);
                }
            }
        }

        for entity in self.snapshot.iter() {
            if entity.is_provisional() {
                merged.push(entity.clone());
            }
        }

        self.snapshot = Snapshot::from_entities(merged);
    }

    /// Shared guards for update/delete: provisional ids first, then the
    /// single-outstanding-operation invariant.
    fn guard_mutable(&self, id: &str) -> Result<()> {
        if is_provisional(id) {
            return Err(Error::NotSynced(id.to_string()));
        }
        if self.queue.contains(id) {
            return Err(Error::AlreadyPending(id.to_string()));
        }
        Ok(())
    }

    fn has_pending(&self, id: &str, kind: PendingKind) -> bool {
        matches!(self.queue.get(id), Some(op) if op.kind == kind)
    }
}
