//! Process-wide registry of models, repositories and record loaders.

use crate::error::FinderError;
use crate::model::ModelDescriptor;
use crate::record::{DefaultRecordLoader, RecordLoader};
use crate::repository::Repository;
use std::collections::HashMap;
use std::sync::Arc;

/// Models, repositories and per-model record loaders, resolved by name
pub struct Registry {
    models: HashMap<String, Arc<ModelDescriptor>>,
    repositories: HashMap<String, Arc<dyn Repository>>,
    loaders: HashMap<String, Arc<dyn RecordLoader>>,
    default_loader: Arc<dyn RecordLoader>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
            repositories: HashMap::new(),
            loaders: HashMap::new(),
            default_loader: Arc::new(DefaultRecordLoader),
        }
    }

    /// Register a model under its name, replacing any earlier declaration
    pub fn register_model(&mut self, model: ModelDescriptor) -> Arc<ModelDescriptor> {
        let model = Arc::new(model);
        if self
            .models
            .insert(model.name().to_string(), Arc::clone(&model))
            .is_some()
        {
            log::warn!("model {} registered twice; keeping the latest declaration", model.name());
        }
        model
    }

    /// Register a repository under its own name
    pub fn register_repository(&mut self, repository: Arc<dyn Repository>) {
        let name = repository.name().to_string();
        log::debug!(
            "registered repository `{name}` (raw queries: {})",
            repository.supports_raw_query()
        );
        self.repositories.insert(name, repository);
    }

    /// Use a custom record loader for one model
    pub fn register_loader(&mut self, model: impl Into<String>, loader: Arc<dyn RecordLoader>) {
        self.loaders.insert(model.into(), loader);
    }

    /// # Errors
    ///
    /// Returns `UnknownModel` if no model is registered under `name`.
    pub fn model(&self, name: &str) -> Result<Arc<ModelDescriptor>, FinderError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| FinderError::UnknownModel(name.to_string()))
    }

    /// # Errors
    ///
    /// Returns `UnknownRepository` if no repository is registered under `name`.
    pub fn repository(&self, name: &str) -> Result<Arc<dyn Repository>, FinderError> {
        self.repositories
            .get(name)
            .cloned()
            .ok_or_else(|| FinderError::UnknownRepository(name.to_string()))
    }

    /// Loader registered for the model, or the default field-mapping loader
    pub fn loader_for(&self, model: &str) -> Arc<dyn RecordLoader> {
        self.loaders
            .get(model)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_loader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockRepository;

    #[test]
    fn test_resolves_registered_items() {
        let mut registry = Registry::new();
        registry.register_model(
            ModelDescriptor::builder("User", "users")
                .attributes(["id", "name"])
                .build()
                .unwrap(),
        );
        registry.register_repository(Arc::new(MockRepository::new("default")));

        assert_eq!(registry.model("User").unwrap().table(), "users");
        assert_eq!(registry.repository("default").unwrap().name(), "default");
    }

    #[test]
    fn test_missing_items_are_errors() {
        let registry = Registry::new();
        assert!(matches!(registry.model("Ghost"), Err(FinderError::UnknownModel(_))));
        assert!(matches!(
            registry.repository("nowhere"),
            Err(FinderError::UnknownRepository(_))
        ));
    }
}
