//! In-memory reference remote.
//!
//! Behaves like a hosted document store: canonical UUIDs, full
//! membership pushed to every subscriber on each write. The
//! `fail_writes`/`hold_writes` switches let tests force rejections and
//! keep operations in flight deterministically.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use espejo_engine::{Entity, EntityId};
use futures::future::BoxFuture;
use tokio::sync::{mpsc, Notify};

use super::{RemoteCollection, RemoteError, SubscriptionEvent, SubscriptionStream};

/// An in-memory [`RemoteCollection`].
///
/// Cheap to clone; all clones share the same backing store, so several
/// sessions pointed at one instance observe each other's writes the way
/// independent clients of a real remote would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemote {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Authoritative entities, keyed by canonical id
    entities: DashMap<EntityId, Entity>,
    /// Active subscriptions, keyed by registration order
    subscribers: DashMap<usize, mpsc::UnboundedSender<SubscriptionEvent>>,
    next_subscriber: AtomicUsize,
    /// When set, every write fails with `RemoteError::Unavailable`
    fail_writes: AtomicBool,
    /// When set, writes park until released
    hold_writes: AtomicBool,
    release: Notify,
}

impl InMemoryRemote {
    /// Create an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, or restore success.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Park subsequent writes in flight, or release all parked ones.
    pub fn hold_writes(&self, hold: bool) {
        self.inner.hold_writes.store(hold, Ordering::SeqCst);
        if !hold {
            self.inner.release.notify_waiters();
        }
    }

    /// Number of entities the remote currently holds.
    pub fn len(&self) -> usize {
        self.inner.entities.len()
    }

    /// Whether the remote holds no entities.
    pub fn is_empty(&self) -> bool {
        self.inner.entities.is_empty()
    }
}

impl Inner {
    /// The full current membership, ordered by id for determinism.
    fn listing(&self) -> Vec<Entity> {
        let mut all: Vec<Entity> = self.entities.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Push the current membership to every live subscriber.
    fn broadcast(&self) {
        let batch = self.listing();
        self.subscribers
            .retain(|_, tx| tx.send(SubscriptionEvent::Batch(batch.clone())).is_ok());
    }

    /// Park while writes are held, then report the configured outcome.
    async fn gate(&self) -> Result<(), RemoteError> {
        loop {
            let released = self.release.notified();
            if !self.hold_writes.load(Ordering::SeqCst) {
                break;
            }
            released.await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection lost".into()));
        }
        Ok(())
    }
}

impl RemoteCollection for InMemoryRemote {
    fn subscribe(&self) -> SubscriptionStream {
        let (tx, rx) = mpsc::unbounded_channel();

        // New listeners are primed with the current membership.
        let _ = tx.send(SubscriptionEvent::Batch(self.inner.listing()));
        let key = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.insert(key, tx);

        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        }))
    }

    fn create(
        &self,
        fields: serde_json::Value,
    ) -> BoxFuture<'static, Result<EntityId, RemoteError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.gate().await?;
            let id = uuid::Uuid::new_v4().to_string();
            inner.entities.insert(id.clone(), Entity::new(id.clone(), fields));
            inner.broadcast();
            Ok(id)
        })
    }

    fn update(
        &self,
        id: EntityId,
        fields: serde_json::Value,
    ) -> BoxFuture<'static, Result<(), RemoteError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.gate().await?;
            match inner.entities.get_mut(&id) {
                Some(mut entity) => entity.replace_fields(fields),
                None => return Err(RemoteError::Rejected(format!("no document {id}"))),
            }
            inner.broadcast();
            Ok(())
        })
    }

    fn delete(&self, id: EntityId) -> BoxFuture<'static, Result<(), RemoteError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.gate().await?;
            // Deleting an absent document is a no-op, as in hosted stores.
            inner.entities.remove(&id);
            inner.broadcast();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn create_assigns_canonical_id() {
        let remote = InMemoryRemote::new();

        let id = remote.create(json!({"nombre": "Rosa"})).await.unwrap();

        assert!(!id.starts_with("temp_"));
        assert_eq!(remote.len(), 1);
    }

    #[tokio::test]
    async fn subscribe_primes_with_current_listing() {
        let remote = InMemoryRemote::new();
        let id = remote.create(json!({"nombre": "Rosa"})).await.unwrap();

        let mut stream = remote.subscribe();
        let event = stream.next().await.unwrap();

        match event {
            SubscriptionEvent::Batch(batch) => {
                assert_eq!(batch.len(), 1);
                assert_eq!(batch[0].id, id);
            }
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn writes_broadcast_to_subscribers() {
        let remote = InMemoryRemote::new();
        let mut stream = remote.subscribe();
        // Drain the priming batch.
        stream.next().await.unwrap();

        let id = remote.create(json!({"nombre": "Rosa"})).await.unwrap();
        let SubscriptionEvent::Batch(after_create) = stream.next().await.unwrap() else {
            panic!("expected batch");
        };
        assert_eq!(after_create.len(), 1);

        remote.delete(id).await.unwrap();
        let SubscriptionEvent::Batch(after_delete) = stream.next().await.unwrap() else {
            panic!("expected batch");
        };
        assert!(after_delete.is_empty());
    }

    #[tokio::test]
    async fn fail_writes_rejects_everything() {
        let remote = InMemoryRemote::new();
        let id = remote.create(json!({"nombre": "Rosa"})).await.unwrap();

        remote.fail_writes(true);

        assert!(remote.create(json!({"nombre": "Lirio"})).await.is_err());
        assert!(remote.update(id.clone(), json!({"nombre": "Tulipán"})).await.is_err());
        assert!(remote.delete(id.clone()).await.is_err());
        // Nothing changed.
        assert_eq!(remote.len(), 1);

        remote.fail_writes(false);
        assert!(remote.update(id, json!({"nombre": "Tulipán"})).await.is_ok());
    }

    #[tokio::test]
    async fn update_unknown_document_rejected() {
        let remote = InMemoryRemote::new();
        let result = remote.update("missing".into(), json!({"nombre": "Rosa"})).await;
        assert!(matches!(result, Err(RemoteError::Rejected(_))));
    }

    #[tokio::test]
    async fn delete_unknown_document_is_noop() {
        let remote = InMemoryRemote::new();
        assert!(remote.delete("missing".into()).await.is_ok());
    }

    #[tokio::test]
    async fn hold_writes_parks_operations() {
        let remote = InMemoryRemote::new();
        remote.hold_writes(true);

        let pending = tokio::spawn({
            let remote = remote.clone();
            async move { remote.create(json!({"nombre": "Rosa"})).await }
        });

        // The operation stays in flight while held.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!pending.is_finished());
        assert!(remote.is_empty());

        remote.hold_writes(false);
        let id = pending.await.unwrap().unwrap();
        assert!(!id.is_empty());
        assert_eq!(remote.len(), 1);
    }
}
