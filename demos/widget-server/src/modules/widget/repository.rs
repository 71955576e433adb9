use paperframe::collection::CollectionBlueprint;
use paperframe::database::DriverClient;
use std::sync::Arc;

use super::model::Widget;
use crate::infrastructure::memory::MemoryStore;

const TABLE: &str = "widgets";

/// The `widget` collection on top of the memory driver.
pub struct WidgetRepository {
    store: Arc<MemoryStore>,
}

impl WidgetRepository {
    pub fn blueprint() -> CollectionBlueprint {
        CollectionBlueprint::auto("widget").driver("memory", |client: DriverClient| WidgetRepository {
            store: client.downcast::<MemoryStore>().unwrap_or_default(),
        })
    }

    pub fn find_by_id(&self, id: &str) -> Option<Widget> {
        self.store
            .get(TABLE, id)
            .and_then(|data| serde_json::from_str(&data).ok())
    }

    pub fn save(&self, widget: &Widget) {
        if let Ok(data) = serde_json::to_string(widget) {
            self.store.insert(TABLE, &widget.id, data);
        }
    }

    pub fn delete(&self, id: &str) -> bool {
        self.store.remove(TABLE, id).is_some()
    }

    pub fn find_all(&self) -> Vec<Widget> {
        self.store
            .scan(TABLE)
            .into_iter()
            .filter_map(|json| serde_json::from_str(&json).ok())
            .collect()
    }
}
