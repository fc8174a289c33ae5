//! Schema lookup by model ID

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::protocol::{Error, Result};

use super::Model;
use super::common::common_model;

/// Source of immutable model schemas.
pub trait SchemaProvider: Send + Sync {
    /// Resolve the schema for `model_id`.
    ///
    /// Fails with [`Error::SchemaNotFound`] for unknown IDs.
    fn model_schema(&self, model_id: u16) -> Result<Arc<Model>>;
}

/// In-memory schema provider.
///
/// Schemas are loaded once and shared read-only; a registry is never mutated
/// after it has been handed to a client.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    models: BTreeMap<u16, Arc<Model>>,
}

impl SchemaRegistry {
    /// Registry holding only the common model
    #[must_use]
    pub fn new() -> Self {
        Self::empty().with_model(common_model())
    }

    /// Registry holding no schemas at all
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Add a schema, replacing any schema with the same ID
    #[must_use]
    pub fn with_model(mut self, model: Model) -> Self {
        self.insert(model);
        self
    }

    /// Add a schema, replacing any schema with the same ID
    pub fn insert(&mut self, model: Model) {
        self.models.insert(model.id, Arc::new(model));
    }

    /// Known model IDs in ascending order
    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.models.keys().copied()
    }

    /// Number of known schemas
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Model> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = Model>>(iter: I) -> Self {
        let mut registry = Self::new();
        for model in iter {
            registry.insert(model);
        }
        registry
    }
}

impl SchemaProvider for SchemaRegistry {
    fn model_schema(&self, model_id: u16) -> Result<Arc<Model>> {
        self.models
            .get(&model_id)
            .cloned()
            .ok_or(Error::SchemaNotFound { model_id })
    }
}
