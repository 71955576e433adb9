use async_trait::async_trait;
use paperframe::database::{Driver, DriverClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-process key/value storage, shared by every collection.
#[derive(Default)]
pub struct MemoryStore {
    // Key: format!("{}:{}", table, id)
    storage: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn insert(&self, table: &str, id: &str, data: String) {
        let mut storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
        storage.insert(format!("{}:{}", table, id), data);
    }

    pub fn get(&self, table: &str, id: &str) -> Option<String> {
        let storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
        storage.get(&format!("{}:{}", table, id)).cloned()
    }

    pub fn remove(&self, table: &str, id: &str) -> Option<String> {
        let mut storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
        storage.remove(&format!("{}:{}", table, id))
    }

    pub fn scan(&self, table: &str) -> Vec<String> {
        let storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
        let prefix = format!("{}:", table);
        storage
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.clone())
            .collect()
    }
}

/// The `memory` database driver.
#[derive(Default)]
pub struct MemoryDriver {
    store: Arc<MemoryStore>,
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn initialize(&mut self) -> anyhow::Result<()> {
        tracing::info!("memory driver ready");
        Ok(())
    }

    fn client(&self) -> DriverClient {
        self.store.clone()
    }
}
