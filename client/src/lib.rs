//! # Espejo Client
//!
//! The asynchronous runtime around [`espejo_engine`]: it wires the
//! deterministic optimistic core to a remote collection and to the host
//! process's connectivity signal.
//!
//! One [`CollectionSession`] mirrors one remote collection. Mutation
//! intents are applied optimistically and return before the network
//! round trip; the session performs the remote call on a spawned task
//! and feeds the outcome back into the store. A subscription pump
//! consumes the remote's push stream and reconciles every batch against
//! the unconfirmed local state. Independent collections run as
//! independent sessions with no cross-session coordination.
//!
//! The remote itself is abstract: anything implementing
//! [`RemoteCollection`] works. [`InMemoryRemote`] is the bundled
//! reference implementation, used by the test suite and handy for
//! demos.
//!
//! ```no_run
//! use espejo_client::{CollectionSession, ConnectivitySource, InMemoryRemote, SessionConfig};
//! use espejo_engine::CollectionSchema;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let remote = Arc::new(InMemoryRemote::new());
//! let (_connectivity, monitor) = ConnectivitySource::new(false);
//!
//! let config = SessionConfig::new(
//!     CollectionSchema::new("productos", ["nombre", "precio", "categoria"]),
//!     "nombre",
//! );
//! let session = CollectionSession::new(remote, config, monitor);
//!
//! // Usable immediately - the provisional id is returned before the
//! // remote confirms.
//! let local_id = session
//!     .create(json!({"nombre": "Rosa", "precio": "10", "categoria": "Flores"}))
//!     .unwrap();
//! assert!(local_id.starts_with("temp_"));
//! # }
//! ```

pub mod config;
pub mod connectivity;
pub mod error;
pub mod remote;
pub mod session;
pub mod telemetry;

pub use config::SessionConfig;
pub use connectivity::{ConnectivityMonitor, ConnectivitySource};
pub use error::ClientError;
pub use remote::{InMemoryRemote, RemoteCollection, RemoteError, SubscriptionEvent};
pub use session::{CollectionSession, SessionEvent};
