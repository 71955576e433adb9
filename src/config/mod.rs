use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// Prefix used for package names and client headers when `SERVICE_PREFIX` is unset.
pub const DEFAULT_PREFIX: &str = "paperframe";

pub const SERVER_COLLECTIONS: &str = "SERVER_COLLECTIONS";
pub const SERVER_MODULES: &str = "SERVER_MODULES";
pub const SERVICE_PREFIX: &str = "SERVICE_PREFIX";
pub const SERVICE_DIRNAME: &str = "SERVICE_DIRNAME";
pub const DATABASE_DRIVER: &str = "DATABASE_DRIVER";

/// Configuration service
///
/// A snapshot of the process environment taken at construction. Values can be
/// overridden with [`ConfigService::set`], which is how tests and embedders
/// configure a router without touching the real environment.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Snapshot the process environment.
    pub fn new() -> Self {
        let service = Self::empty();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// A configuration with no values at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Builder-style [`ConfigService::set`].
    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }
}

/// The startup settings a router reads from its [`ConfigService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// `None` when `SERVER_COLLECTIONS` is unset, which `initialize` rejects.
    pub collections: Option<Vec<String>>,
    /// `None` when `SERVER_MODULES` is unset, which `initialize` rejects.
    pub modules: Option<Vec<String>>,
    pub prefix: String,
    pub dirname: String,
    pub database_driver: Option<String>,
}

impl RouterConfig {
    pub fn from_config(config: &ConfigService) -> Self {
        Self {
            collections: config.get(SERVER_COLLECTIONS).map(|v| split_list(&v)),
            modules: config.get(SERVER_MODULES).map(|v| split_list(&v)),
            prefix: config
                .get(SERVICE_PREFIX)
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            dirname: config.get(SERVICE_DIRNAME).unwrap_or_else(|| ".".to_string()),
            database_driver: config.get(DATABASE_DRIVER),
        }
    }
}

/// Split a comma separated list. Entries are kept verbatim (including empty
/// ones) so the loaders can report what they skip.
fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}
