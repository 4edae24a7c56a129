//! # Espejo Engine
//!
//! The deterministic core of an optimistic local/remote collection mirror.
//!
//! This crate holds the local in-memory view of one remote collection,
//! applies user mutations against it immediately under provisional
//! identifiers, and reconciles authoritative remote listings against the
//! unconfirmed local state. It is the part of the system that must be
//! exactly right while the network is unreliable.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or clocks.
//!   Wall-clock timestamps are passed in by the caller.
//! - **Deterministic**: same inputs always produce same outputs.
//! - **Testable**: pure logic, no mocks needed.
//! - **One writer**: every entry point takes `&mut self`; the embedding
//!   runtime serializes calls through a single critical section.
//!
//! ## Core Concepts
//!
//! ### Entities and the snapshot
//!
//! Data is mirrored as [`Entity`] values: an id, an opaque JSON field
//! map, and an internal revision marker. The [`Snapshot`] is the ordered
//! sequence of all currently-known entities for one collection, with the
//! invariant that no two entries share an id.
//!
//! ### Provisional and canonical ids
//!
//! A locally created entity carries a provisional `temp_<stamp>` id until
//! the remote store confirms the create and issues the canonical id. An
//! entity is immutable for update/delete while its id is provisional,
//! because no canonical reference exists yet for the remote to target.
//!
//! ### Pending operations
//!
//! Every optimistic mutation registers a [`PendingOperation`] in the
//! [`MutationQueue`], at most one per entity id. Entries are cleared
//! only when the caller reports the remote outcome back through the
//! resolve/reject paths. There is no automatic retry: a failure rolls
//! state back (create/delete) or stands as attempted (update) and is
//! surfaced upward.
//!
//! ### Reconciliation
//!
//! [`OptimisticStore::ingest_remote_batch`] merges an authoritative
//! full-membership listing into the snapshot. Canonical entries follow
//! the batch unconditionally; provisional entries are invisible to
//! reconciliation and survive untouched until their own create resolves.
//!
//! ## Quick Start
//!
//! ```rust
//! use espejo_engine::{entity::is_provisional, OptimisticStore, ProjectionQuery};
//! use serde_json::json;
//!
//! // One store per remote collection.
//! let mut store = OptimisticStore::new("productos");
//!
//! // Apply a mutation optimistically; the provisional id is usable
//! // before the remote round trip completes.
//! let local_id = store.apply_optimistic_create(
//!     json!({"nombre": "Rosa", "precio": "10", "categoria": "Flores"}),
//!     1_706_745_600_000,
//! );
//! assert!(is_provisional(&local_id));
//!
//! // The remote confirmed the create - promote to the canonical id.
//! store.resolve_create(&local_id, "abc123");
//! assert!(store.snapshot().get("abc123").is_some());
//!
//! // Derive what presentation should render.
//! let query = ProjectionQuery::new("nombre").with_search("ros");
//! let page = espejo_engine::projection::project(store.snapshot(), &query);
//! assert_eq!(page.total_matches, 1);
//! ```

pub mod entity;
pub mod error;
pub mod ids;
pub mod pending;
pub mod projection;
pub mod schema;
pub mod snapshot;
pub mod store;

// Re-export main types at crate root
pub use entity::{Entity, PROVISIONAL_PREFIX};
pub use error::Error;
pub use ids::ProvisionalIdSource;
pub use pending::{AttemptState, MutationQueue, PendingKind, PendingOperation};
pub use projection::{CategoryFilter, Projection, ProjectionQuery};
pub use schema::CollectionSchema;
pub use snapshot::Snapshot;
pub use store::OptimisticStore;

/// Type aliases for clarity
pub type EntityId = String;
pub type CollectionName = String;
pub type FieldName = String;
pub type Timestamp = u64;
pub type Revision = u64;
