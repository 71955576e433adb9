//! Collections: per-resource data-access handles built on top of whichever
//! database driver is active.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::database::{DriverClient, DriverHandle};

type CollectionDriverFactory = Arc<dyn Fn(DriverClient) -> Arc<dyn Any + Send + Sync> + Send + Sync>;

/// How to build a collection for each supported driver.
///
/// ```
/// use paperframe::collection::CollectionBlueprint;
///
/// struct MemoryWidgets;
///
/// let widgets = CollectionBlueprint::auto("widget").driver("memory", |_client| MemoryWidgets);
/// assert!(widgets.supports("memory"));
/// ```
#[derive(Clone)]
pub struct CollectionBlueprint {
    name: String,
    drivers: HashMap<String, CollectionDriverFactory>,
}

impl CollectionBlueprint {
    pub fn auto(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            drivers: HashMap::new(),
        }
    }

    /// Add the implementation used when the database driver `id` is active.
    pub fn driver<D, F>(mut self, id: impl Into<String>, make: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(DriverClient) -> D + Send + Sync + 'static,
    {
        self.drivers
            .insert(id.into(), Arc::new(move |client| Arc::new(make(client))));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supports(&self, driver_id: &str) -> bool {
        self.drivers.contains_key(driver_id)
    }

    /// Instantiate the collection against an initialized driver.
    pub fn open(&self, driver: &DriverHandle) -> anyhow::Result<Collection> {
        let make = self.drivers.get(&driver.id).ok_or_else(|| {
            anyhow::anyhow!(
                "Collection: Error loading driver {} for collection {}!",
                driver.id,
                self.name
            )
        })?;

        Ok(Collection {
            name: self.name.clone(),
            driver: make(driver.client.clone()),
        })
    }
}

impl fmt::Debug for CollectionBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut drivers: Vec<&String> = self.drivers.keys().collect();
        drivers.sort();
        f.debug_struct("CollectionBlueprint")
            .field("name", &self.name)
            .field("drivers", &drivers)
            .finish()
    }
}

/// An opened collection.
#[derive(Clone)]
pub struct Collection {
    name: String,
    driver: Arc<dyn Any + Send + Sync>,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver<D: Send + Sync + 'static>(&self) -> Option<Arc<D>> {
        self.driver.clone().downcast::<D>().ok()
    }
}

/// The collections table shared by every controller.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    table: Arc<BTreeMap<String, CollectionBlueprint>>,
}

impl Collections {
    pub fn new(table: BTreeMap<String, CollectionBlueprint>) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CollectionBlueprint> {
        self.table.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
