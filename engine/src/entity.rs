//! Entity types for the mirrored collection.

use crate::{EntityId, Revision};
use serde::{Deserialize, Serialize};

/// Prefix of every locally minted provisional id.
pub const PROVISIONAL_PREFIX: &str = "temp_";

/// Check whether an id is a provisional (locally minted) one.
///
/// Canonical ids are issued by the remote store and never carry this
/// prefix.
pub fn is_provisional(id: &str) -> bool {
    id.starts_with(PROVISIONAL_PREFIX)
}

/// A record within a mirrored collection.
///
/// The field map is opaque to the engine: its schema varies per
/// collection and is only interpreted by validation and projection,
/// both driven by field names the embedding application designates.
/// Entities are value-like: nothing outside the store edits one in
/// place; the store replaces whole entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Provisional or canonical identifier
    pub id: EntityId,
    /// Field name → value mapping (insertion-ordered JSON object)
    pub fields: serde_json::Value,
    /// Internal marker, bumped on every in-place replacement
    pub revision: Revision,
}

impl Entity {
    /// Create a new entity at revision 1.
    pub fn new(id: impl Into<EntityId>, fields: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            fields,
            revision: 1,
        }
    }

    /// Whether this entity still carries a provisional id.
    pub fn is_provisional(&self) -> bool {
        is_provisional(&self.id)
    }

    /// Look up one field by name.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Replace the whole field map, bumping the revision.
    pub fn replace_fields(&mut self, fields: serde_json::Value) {
        self.fields = fields;
        self.revision += 1;
    }
}
