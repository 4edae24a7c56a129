//! Tracing setup for embedding applications.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, defaulting to debug-level output for
/// this crate. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "espejo_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
