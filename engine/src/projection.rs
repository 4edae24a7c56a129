//! View projection - what presentation should render.
//!
//! A projection is a pure function of the snapshot and the query: it
//! never mutates the snapshot and is re-derived on every change.

use crate::{Entity, FieldName, Snapshot};
use serde::{Deserialize, Serialize};

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Category constraint applied before the text search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CategoryFilter {
    /// The "all categories" sentinel: no constraint
    #[default]
    All,
    /// Exact match on a designated categorical field
    Only { field: FieldName, value: String },
}

/// Arguments for deriving one rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionQuery {
    /// Field the text search runs against
    pub display_field: FieldName,
    /// Case-insensitive substring; empty matches everything
    pub search: String,
    /// Category constraint
    pub category: CategoryFilter,
    /// 1-based page number
    pub page: usize,
    /// Entities per page
    pub page_size: usize,
}

impl ProjectionQuery {
    /// Query over a display field: no search, all categories, first page.
    pub fn new(display_field: impl Into<FieldName>) -> Self {
        Self {
            display_field: display_field.into(),
            search: String::new(),
            category: CategoryFilter::All,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the search text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Constrain to one category value of a categorical field.
    pub fn with_category(mut self, field: impl Into<FieldName>, value: impl Into<String>) -> Self {
        self.category = CategoryFilter::Only {
            field: field.into(),
            value: value.into(),
        };
        self
    }

    /// Select a 1-based page.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Override the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// One derived page plus the total match count for pagination controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Entities to render, in snapshot order
    pub items: Vec<Entity>,
    /// Matches across all pages
    pub total_matches: usize,
}

/// Derive the page of entities a view should render.
pub fn project(snapshot: &Snapshot, query: &ProjectionQuery) -> Projection {
    let needle = query.search.to_lowercase();

    let matches: Vec<&Entity> = snapshot
        .iter()
        .filter(|entity| matches_category(entity, &query.category))
        .filter(|entity| matches_search(entity, &query.display_field, &needle))
        .collect();

    let total_matches = matches.len();
    let page = query.page.max(1);
    let start = (page - 1).saturating_mul(query.page_size);
    let items = matches
        .into_iter()
        .skip(start)
        .take(query.page_size)
        .cloned()
        .collect();

    Projection {
        items,
        total_matches,
    }
}

fn matches_category(entity: &Entity, filter: &CategoryFilter) -> bool {
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::Only { field, value } => entity
            .field(field)
            .and_then(|v| v.as_str())
            .is_some_and(|v| v == value),
    }
}

fn matches_search(entity: &Entity, display_field: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    entity
        .field(display_field)
        .and_then(|v| v.as_str())
        .is_some_and(|v| v.to_lowercase().contains(needle_lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flower_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new();
        for (id, nombre, categoria) in [
            ("a", "Rosa", "Flores"),
            ("b", "Rosal enano", "Arbustos"),
            ("c", "Tulipán", "Flores"),
            ("d", "Cactus", "Suculentas"),
            ("e", "Orquídea", "Flores"),
            ("f", "Lirio", "Flores"),
            ("g", "Margarita", "Flores"),
        ] {
            snapshot.insert(Entity::new(
                id,
                json!({"nombre": nombre, "categoria": categoria}),
            ));
        }
        snapshot
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let snapshot = flower_snapshot();
        let query = ProjectionQuery::new("nombre").with_search("ROS");

        let result = project(&snapshot, &query);

        assert_eq!(result.total_matches, 2);
        let ids: Vec<_> = result.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn empty_search_matches_everything() {
        let snapshot = flower_snapshot();
        let query = ProjectionQuery::new("nombre").with_page_size(100);

        let result = project(&snapshot, &query);
        assert_eq!(result.total_matches, 7);
        assert_eq!(result.items.len(), 7);
    }

    #[test]
    fn category_filter_is_exact_match() {
        let snapshot = flower_snapshot();
        let query = ProjectionQuery::new("nombre")
            .with_category("categoria", "Flores")
            .with_page_size(100);

        let result = project(&snapshot, &query);

        assert_eq!(result.total_matches, 5);
        assert!(result
            .items
            .iter()
            .all(|e| e.field("categoria") == Some(&json!("Flores"))));
    }

    #[test]
    fn all_sentinel_bypasses_category_filter() {
        let snapshot = flower_snapshot();
        let query = ProjectionQuery::new("nombre").with_page_size(100);
        assert_eq!(query.category, CategoryFilter::All);

        let result = project(&snapshot, &query);
        assert_eq!(result.total_matches, 7);
    }

    #[test]
    fn category_and_search_compose() {
        let snapshot = flower_snapshot();
        let query = ProjectionQuery::new("nombre")
            .with_category("categoria", "Flores")
            .with_search("r");

        let result = project(&snapshot, &query);

        // Rosa, Orquídea, Lirio, Margarita - not Rosal (wrong category).
        assert_eq!(result.total_matches, 4);
    }

    #[test]
    fn pagination_slices_with_total_count() {
        let snapshot = flower_snapshot();
        let base = ProjectionQuery::new("nombre").with_page_size(3);

        let page1 = project(&snapshot, &base.clone().with_page(1));
        let page2 = project(&snapshot, &base.clone().with_page(2));
        let page3 = project(&snapshot, &base.with_page(3));

        assert_eq!(page1.items.len(), 3);
        assert_eq!(page2.items.len(), 3);
        assert_eq!(page3.items.len(), 1);
        // The total is for all pages, so controls can size themselves.
        assert_eq!(page1.total_matches, 7);
        assert_eq!(page3.total_matches, 7);
    }

    #[test]
    fn page_beyond_range_is_empty() {
        let snapshot = flower_snapshot();
        let query = ProjectionQuery::new("nombre").with_page(9);

        let result = project(&snapshot, &query);
        assert!(result.items.is_empty());
        assert_eq!(result.total_matches, 7);
    }

    #[test]
    fn non_string_display_field_excluded_from_search() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(Entity::new("a", json!({"nombre": 42})));
        snapshot.insert(Entity::new("b", json!({"nombre": "Rosa"})));

        let searched = project(&snapshot, &ProjectionQuery::new("nombre").with_search("ros"));
        assert_eq!(searched.total_matches, 1);

        // With no search text, field types are irrelevant.
        let all = project(&snapshot, &ProjectionQuery::new("nombre"));
        assert_eq!(all.total_matches, 2);
    }

    #[test]
    fn projection_is_idempotent() {
        let snapshot = flower_snapshot();
        let query = ProjectionQuery::new("nombre")
            .with_search("a")
            .with_page(2)
            .with_page_size(2);

        let first = project(&snapshot, &query);
        let second = project(&snapshot, &query);

        assert_eq!(first, second);
    }
}
