//! Central preload registry

use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::task::{LoadTask, ModuleImporter, ModuleLoadError, RetryConfig};

/// Outcome of a best-effort batch preload.
#[derive(Debug, Default)]
pub struct BatchPreloadOutcome {
    /// Modules that resolved
    pub loaded: Vec<String>,
    /// Modules that failed, with their terminal error
    pub failed: Vec<(String, ModuleLoadError)>,
}

impl BatchPreloadOutcome {
    /// Whether every requested module resolved.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Maps logical module names to their load tasks.
///
/// Registration is idempotent per name: re-registering returns the
/// existing task so every consumer shares the same memoized pipeline.
pub struct PreloadRegistry<T: Clone + Send + Sync + 'static> {
    tasks: DashMap<String, Arc<LoadTask<T>>>,
}

impl<T: Clone + Send + Sync + 'static> PreloadRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// Register a module, or fetch the task already registered under the name.
    pub fn register(
        &self,
        name: impl Into<String>,
        importer: Arc<dyn ModuleImporter<T>>,
        config: RetryConfig,
    ) -> Arc<LoadTask<T>> {
        let name = name.into();
        self.tasks
            .entry(name.clone())
            .or_insert_with(|| {
                debug!(module = %name, "module registered for preloading");
                Arc::new(LoadTask::new(name.clone(), importer, config))
            })
            .clone()
    }

    /// Fetch the task for a registered module.
    pub fn get(&self, name: &str) -> Option<Arc<LoadTask<T>>> {
        self.tasks.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Registered module names.
    pub fn names(&self) -> Vec<String> {
        self.tasks.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no modules are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Preload one registered module.
    pub async fn preload(&self, name: &str) -> Result<(), ModuleLoadError> {
        let task = self.get(name).ok_or_else(|| ModuleLoadError::NotRegistered {
            module: name.to_string(),
        })?;
        task.preload().await
    }

    /// Preload a batch of modules, settling each independently.
    ///
    /// A failing module never blocks the rest; failures are collected and
    /// logged, not propagated.
    pub async fn preload_all(&self, names: &[&str]) -> BatchPreloadOutcome {
        let results = join_all(names.iter().map(|name| {
            let name = name.to_string();
            async move {
                let result = self.preload(&name).await;
                (name, result)
            }
        }))
        .await;

        let mut outcome = BatchPreloadOutcome::default();
        for (name, result) in results {
            match result {
                Ok(()) => outcome.loaded.push(name),
                Err(err) => {
                    warn!(module = %name, error = %err, "batch preload entry failed");
                    outcome.failed.push((name, err));
                }
            }
        }
        outcome
    }
}

impl<T: Clone + Send + Sync + 'static> Default for PreloadRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
