//! The per-collection session.
//!
//! A [`CollectionSession`] is the generic form of the flow every
//! record-managing view needs: validate, apply optimistically, issue the
//! remote call off the calling path, and feed the outcome back into the
//! store. All store access, mutation intents and subscription batches
//! alike, is serialized through one mutex, which is never held across
//! an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use espejo_engine::{
    projection::{project, Projection, ProjectionQuery},
    Entity, EntityId, OptimisticStore, Timestamp,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::remote::{RemoteCollection, RemoteError, SubscriptionEvent, SubscriptionStream};

/// Outcomes the session surfaces to presentation.
///
/// Failures carry the connectivity flag observed at failure time so the
/// UI can phrase "offline, retry when back online" versus a hard error.
/// The flag changes phrasing only; rollback behavior is identical
/// either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A create was confirmed and promoted to its canonical id
    CreateConfirmed {
        local_id: EntityId,
        canonical_id: EntityId,
    },
    /// A create was rejected; the optimistic entry was rolled back
    CreateFailed {
        local_id: EntityId,
        error: RemoteError,
        offline: bool,
    },
    /// An update was rejected; the optimistic edit is left standing
    UpdateFailed {
        id: EntityId,
        error: RemoteError,
        offline: bool,
    },
    /// A delete was rejected; the entity was restored
    DeleteFailed {
        id: EntityId,
        error: RemoteError,
        offline: bool,
    },
    /// A remote batch was reconciled into the snapshot
    BatchApplied { entities: usize },
    /// The change subscription reported an error
    SubscriptionLost { error: RemoteError },
}

/// One client's optimistic mirror of one remote collection.
pub struct CollectionSession<R: RemoteCollection> {
    remote: Arc<R>,
    store: Arc<Mutex<OptimisticStore>>,
    config: SessionConfig,
    connectivity: ConnectivityMonitor,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    pump: JoinHandle<()>,
}

impl<R: RemoteCollection> CollectionSession<R> {
    /// Open a session: subscribes to the remote collection and starts
    /// the pump that reconciles its batches. Must be called within a
    /// tokio runtime.
    pub fn new(remote: Arc<R>, config: SessionConfig, connectivity: ConnectivityMonitor) -> Self {
        let store = Arc::new(Mutex::new(OptimisticStore::new(config.collection())));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let pump = tokio::spawn(run_subscription_pump(
            remote.subscribe(),
            Arc::clone(&store),
            connectivity.clone(),
            events_tx.clone(),
        ));

        Self {
            remote,
            store,
            config,
            connectivity,
            events_tx,
            events_rx: Some(events_rx),
            pump,
        }
    }

    /// Take the event receiver. Yields `Some` exactly once.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events_rx.take()
    }

    /// Create an entity optimistically.
    ///
    /// Validates required fields, applies the create, and returns the
    /// provisional id before the remote round trip completes. The
    /// confirmation or rollback arrives later as a [`SessionEvent`].
    pub fn create(&self, fields: serde_json::Value) -> Result<EntityId> {
        self.config.schema.validate(&fields)?;

        let local_id =
            lock_store(&self.store).apply_optimistic_create(fields.clone(), now_ms());
        tracing::debug!(
            collection = %self.config.collection(),
            local_id = %local_id,
            "optimistic create applied"
        );

        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);
        let connectivity = self.connectivity.clone();
        let sink = self.events_tx.clone();
        let id = local_id.clone();
        tokio::spawn(async move {
            match remote.create(fields).await {
                Ok(canonical_id) => {
                    lock_store(&store).resolve_create(&id, canonical_id.clone());
                    tracing::info!(local_id = %id, canonical_id = %canonical_id, "create confirmed");
                    let _ = sink.send(SessionEvent::CreateConfirmed {
                        local_id: id,
                        canonical_id,
                    });
                }
                Err(error) => {
                    lock_store(&store).reject_create(&id);
                    let offline = connectivity.is_offline();
                    if offline {
                        tracing::warn!(
                            local_id = %id, %error,
                            "create failed while offline; entry rolled back, repeat once back online"
                        );
                    } else {
                        tracing::error!(local_id = %id, %error, "create rejected; entry rolled back");
                    }
                    let _ = sink.send(SessionEvent::CreateFailed {
                        local_id: id,
                        error,
                        offline,
                    });
                }
            }
        });

        Ok(local_id)
    }

    /// Update an entity optimistically, replacing its fields in place.
    ///
    /// Fails synchronously with `NotSynced` on a provisional id and
    /// `AlreadyPending` while another operation is in flight. A remote
    /// rejection leaves the edit standing and arrives as
    /// [`SessionEvent::UpdateFailed`].
    pub fn update(&self, id: &str, fields: serde_json::Value) -> Result<()> {
        self.config.schema.validate(&fields)?;
        lock_store(&self.store).apply_optimistic_update(id, fields.clone())?;
        tracing::debug!(
            collection = %self.config.collection(),
            id = %id,
            "optimistic update applied"
        );

        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);
        let connectivity = self.connectivity.clone();
        let sink = self.events_tx.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            match remote.update(id.clone(), fields).await {
                Ok(()) => lock_store(&store).resolve_mutation(&id),
                Err(error) => {
                    lock_store(&store).reject_mutation(&id);
                    let offline = connectivity.is_offline();
                    if offline {
                        tracing::warn!(id = %id, %error, "update failed while offline; local edit kept");
                    } else {
                        tracing::error!(id = %id, %error, "update rejected; local edit kept");
                    }
                    let _ = sink.send(SessionEvent::UpdateFailed { id, error, offline });
                }
            }
        });

        Ok(())
    }

    /// Delete an entity optimistically, removing it immediately.
    ///
    /// Returns the removed copy. A remote rejection restores the entity
    /// and arrives as [`SessionEvent::DeleteFailed`].
    pub fn delete(&self, id: &str) -> Result<Entity> {
        let removed = lock_store(&self.store).apply_optimistic_delete(id)?;
        tracing::debug!(
            collection = %self.config.collection(),
            id = %id,
            "optimistic delete applied"
        );

        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);
        let connectivity = self.connectivity.clone();
        let sink = self.events_tx.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            match remote.delete(id.clone()).await {
                Ok(()) => lock_store(&store).resolve_mutation(&id),
                Err(error) => {
                    lock_store(&store).reject_mutation(&id);
                    let offline = connectivity.is_offline();
                    if offline {
                        tracing::warn!(id = %id, %error, "delete failed while offline; entity restored");
                    } else {
                        tracing::error!(id = %id, %error, "delete rejected; entity restored");
                    }
                    let _ = sink.send(SessionEvent::DeleteFailed { id, error, offline });
                }
            }
        });

        Ok(removed)
    }

    /// Owned copy of the current snapshot.
    pub fn snapshot(&self) -> Vec<Entity> {
        lock_store(&self.store).snapshot().to_vec()
    }

    /// Count of in-flight operations.
    pub fn pending_count(&self) -> usize {
        lock_store(&self.store).pending_count()
    }

    /// Derive the page a view should render. `category: None` is the
    /// "all categories" sentinel.
    pub fn projection(&self, search: &str, category: Option<&str>, page: usize) -> Projection {
        let mut query = ProjectionQuery::new(self.config.display_field.clone())
            .with_search(search)
            .with_page(page)
            .with_page_size(self.config.page_size);
        if let (Some(field), Some(value)) = (&self.config.category_field, category) {
            query = query.with_category(field.clone(), value);
        }

        project(lock_store(&self.store).snapshot(), &query)
    }

    /// Tear the session down, cancelling the subscription pump.
    ///
    /// Mutations already sent to the remote are not cancelled; their
    /// resolve/reject callbacks settle against the shared store and are
    /// safe no-ops with nobody left to observe them.
    pub fn shutdown(self) {
        self.pump.abort();
    }
}

impl<R: RemoteCollection> Drop for CollectionSession<R> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Consume the subscription stream, reconciling every batch.
async fn run_subscription_pump(
    mut events: SubscriptionStream,
    store: Arc<Mutex<OptimisticStore>>,
    connectivity: ConnectivityMonitor,
    sink: mpsc::UnboundedSender<SessionEvent>,
) {
    while let Some(event) = events.next().await {
        match event {
            SubscriptionEvent::Batch(entities) => {
                let count = entities.len();
                lock_store(&store).ingest_remote_batch(entities);
                tracing::debug!(
                    entities = count,
                    offline = connectivity.is_offline(),
                    "remote batch reconciled"
                );
                let _ = sink.send(SessionEvent::BatchApplied { entities: count });
            }
            SubscriptionEvent::Failed(error) => {
                if connectivity.is_offline() {
                    tracing::warn!(%error, "subscription interrupted while offline");
                } else {
                    tracing::error!(%error, "subscription failed");
                }
                let _ = sink.send(SessionEvent::SubscriptionLost { error });
            }
        }
    }
}

/// The engine never panics while holding the lock, so a poisoned mutex
/// still carries a consistent store.
fn lock_store(store: &Mutex<OptimisticStore>) -> MutexGuard<'_, OptimisticStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}
