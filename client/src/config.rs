//! Per-collection session configuration.

use espejo_engine::{projection::DEFAULT_PAGE_SIZE, CollectionSchema, FieldName};

/// What a [`CollectionSession`](crate::CollectionSession) needs to know
/// about its collection: the required-field schema, which field the text
/// search runs against, the optional categorical field, and the page
/// size for projections.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Required-field schema, validated before every optimistic apply
    pub schema: CollectionSchema,
    /// Field the projection's text search runs against
    pub display_field: FieldName,
    /// Categorical field for exact-match filtering, if the collection
    /// has one
    pub category_field: Option<FieldName>,
    /// Entities per projected page
    pub page_size: usize,
}

impl SessionConfig {
    /// Configuration with no category field and the default page size.
    pub fn new(schema: CollectionSchema, display_field: impl Into<FieldName>) -> Self {
        Self {
            schema,
            display_field: display_field.into(),
            category_field: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Designate the categorical field.
    pub fn with_category_field(mut self, field: impl Into<FieldName>) -> Self {
        self.category_field = Some(field.into());
        self
    }

    /// Override the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Name of the mirrored collection.
    pub fn collection(&self) -> &str {
        &self.schema.name
    }
}
