use crate::di::{ProviderHandle, ServiceProvider};
use crate::error::{PaperframeError, Result};
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe table of initialized service providers, keyed by dependency name.
///
/// The router keeps one as its singleton cache; every controller receives its
/// own `Container` holding just the dependencies it declared.
#[derive(Debug)]
pub struct Container {
    services: DashMap<String, ProviderHandle>,
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
        }
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, handle: ProviderHandle) -> &mut Self {
        self.services.insert(name.into(), handle);
        self
    }

    pub fn get(&self, name: &str) -> Option<ProviderHandle> {
        self.services.get(name).map(|entry| entry.value().clone())
    }

    pub fn resolve<T: ServiceProvider>(&self, name: &str) -> Result<Arc<T>> {
        let entry = self
            .services
            .get(name)
            .ok_or_else(|| PaperframeError::DependencyNotFound {
                name: name.to_string(),
            })?;
        entry
            .downcast::<T>()
            .ok_or_else(|| PaperframeError::DowncastFailed {
                name: name.to_string(),
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
