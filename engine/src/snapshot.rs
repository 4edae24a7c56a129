//! The snapshot - the ordered local mirror of one collection.

use crate::{Entity, EntityId};
use serde::{Deserialize, Serialize};

/// The ordered sequence of all currently-known entities for one
/// collection, as exposed to presentation.
///
/// Invariant: no two entities share an id. Insertion order is preserved
/// (optimistic creates append, remote batches keep their listing order)
/// but carries no semantic meaning; presentation re-sorts and paginates
/// through the projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    entities: Vec<Entity>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from entities whose ids are already unique.
    pub(crate) fn from_entities(entities: Vec<Entity>) -> Self {
        debug_assert!(
            {
                let mut ids: Vec<_> = entities.iter().map(|e| e.id.as_str()).collect();
                ids.sort_unstable();
                ids.windows(2).all(|w| w[0] != w[1])
            },
            "snapshot entities must have unique ids"
        );
        Self { entities }
    }

    /// Get an entity by id.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Check whether an entity with this id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Insert an entity: appends, or replaces in place when the id is
    /// already present (keeping its position).
    pub fn insert(&mut self, entity: Entity) {
        match self.position(&entity.id) {
            Some(i) => self.entities[i] = entity,
            None => self.entities.push(entity),
        }
    }

    /// Remove and return the entity with this id.
    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        let i = self.position(id)?;
        Some(self.entities.remove(i))
    }

    /// Rewrite an entity's id in place, keeping position and fields.
    ///
    /// Returns false when no entity carries `old_id`. The caller must
    /// ensure `new_id` is not already present.
    pub(crate) fn rewrite_id(&mut self, old_id: &str, new_id: EntityId) -> bool {
        debug_assert!(!self.contains(&new_id), "rewrite target id already present");
        match self.position(old_id) {
            Some(i) => {
                let entity = &mut self.entities[i];
                entity.id = new_id;
                entity.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Number of entities in the snapshot.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the snapshot holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over entities in snapshot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// The entities as a slice, in snapshot order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Owned copy of the entities, in snapshot order.
    pub fn to_vec(&self) -> Vec<Entity> {
        self.entities.clone()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(id: &str, nombre: &str) -> Entity {
        Entity::new(id, json!({"nombre": nombre}))
    }

    #[test]
    fn insert_appends_in_order() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(entity("a", "Rosa"));
        snapshot.insert(entity("b", "Tulipán"));

        let ids: Vec<_> = snapshot.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn insert_same_id_replaces_in_place() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(entity("a", "Rosa"));
        snapshot.insert(entity("b", "Tulipán"));
        snapshot.insert(entity("a", "Orquídea"));

        // Position kept, content replaced, no duplicate.
        let ids: Vec<_> = snapshot.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.get("a").unwrap().field("nombre"), Some(&json!("Orquídea")));
    }

    #[test]
    fn remove_returns_the_entity() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(entity("a", "Rosa"));

        let removed = snapshot.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(snapshot.is_empty());
        assert!(snapshot.remove("a").is_none());
    }

    #[test]
    fn rewrite_id_keeps_position_and_fields() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(entity("temp_1", "Rosa"));
        snapshot.insert(entity("b", "Tulipán"));

        assert!(snapshot.rewrite_id("temp_1", "abc123".to_string()));

        let ids: Vec<_> = snapshot.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["abc123", "b"]);
        let promoted = snapshot.get("abc123").unwrap();
        assert_eq!(promoted.field("nombre"), Some(&json!("Rosa")));
        assert!(!snapshot.contains("temp_1"));
    }

    #[test]
    fn rewrite_unknown_id_is_false() {
        let mut snapshot = Snapshot::new();
        assert!(!snapshot.rewrite_id("temp_1", "abc123".to_string()));
    }

    #[test]
    fn serialization_roundtrip() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(entity("a", "Rosa"));

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, parsed);
    }
}
