//! Provisional id generation.
//!
//! Provisional ids must be pairwise distinct within a collection
//! instance even when several creates land inside the same wall-clock
//! millisecond, so the source clamps each stamp to be strictly greater
//! than the last one it handed out.

use crate::{entity::PROVISIONAL_PREFIX, EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// Monotonic source of `temp_<stamp>` identifiers.
///
/// The caller supplies the current wall-clock time in milliseconds; the
/// engine itself never reads a clock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionalIdSource {
    /// Stamp of the last id handed out
    last: Timestamp,
}

impl ProvisionalIdSource {
    /// Create a fresh source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next provisional id.
    pub fn next(&mut self, now_ms: Timestamp) -> EntityId {
        let stamp = now_ms.max(self.last + 1);
        self.last = stamp;
        format!("{PROVISIONAL_PREFIX}{stamp}")
    }
}
