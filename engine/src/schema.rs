//! Required-field validation.
//!
//! Field content is opaque to the store; what a collection does require
//! is that its mandatory fields are present before a mutation is
//! attempted. Callers run this check ahead of the optimistic apply, so
//! a validation failure never touches the snapshot.

use crate::{error::Result, CollectionName, Error, FieldName};
use serde::{Deserialize, Serialize};

/// Names a collection and the fields every entity in it must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    /// Collection name
    pub name: CollectionName,
    /// Fields that must be present and non-empty
    pub required: Vec<FieldName>,
}

impl CollectionSchema {
    /// Create a new collection schema.
    pub fn new(
        name: impl Into<CollectionName>,
        required: impl IntoIterator<Item = impl Into<FieldName>>,
    ) -> Self {
        Self {
            name: name.into(),
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate a field map against this schema.
    ///
    /// A required field that is absent, null, or an empty string fails
    /// with [`Error::MissingRequiredField`].
    pub fn validate(&self, fields: &serde_json::Value) -> Result<()> {
        let obj = fields
            .as_object()
            .ok_or_else(|| Error::InvalidFields("fields must be an object".into()))?;

        for name in &self.required {
            match obj.get(name) {
                None | Some(serde_json::Value::Null) => {
                    return Err(Error::MissingRequiredField(name.clone()));
                }
                Some(serde_json::Value::String(s)) if s.is_empty() => {
                    return Err(Error::MissingRequiredField(name.clone()));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}
