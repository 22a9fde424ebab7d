//! Fill backend trait and registry

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{FillPdfError, Result};
use crate::mapping::{FieldMapping, FillContext, FormTemplate};
use crate::transport::FieldDescriptor;

/// A PDF fill backend
#[async_trait]
pub trait FillBackend: Send + Sync {
    /// Id the backend is selected by in configuration
    fn id(&self) -> &'static str;

    fn label(&self) -> &'static str;

    /// Fillable fields of the template's PDF. Empty when it has none.
    async fn parse(&self, template: &FormTemplate) -> Result<Vec<FieldDescriptor>>;

    /// Fill the template's PDF and return the resulting document
    async fn populate(
        &self,
        template: &FormTemplate,
        mapping: &FieldMapping,
        context: &FillContext,
    ) -> Result<Vec<u8>>;
}

/// Backends keyed by id
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn FillBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend, replacing any previous one with the same id
    pub fn register(&mut self, backend: Arc<dyn FillBackend>) -> &mut Self {
        tracing::debug!(backend = backend.id(), "Registered fill backend");
        self.backends.insert(backend.id().to_string(), backend);
        self
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn FillBackend>> {
        self.backends
            .get(id)
            .cloned()
            .ok_or_else(|| FillPdfError::BackendNotFound(id.to_string()))
    }

    /// `(id, label)` of every registered backend, sorted by id
    pub fn available(&self) -> Vec<(&'static str, &'static str)> {
        let mut available: Vec<_> = self
            .backends
            .values()
            .map(|b| (b.id(), b.label()))
            .collect();
        available.sort();
        available
    }
}
