//! In-memory item store
//!
//! Maps integer ids to item names. Ids are allocated from a monotonic counter
//! starting at 1 and are never reused, even after a delete.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// Item id type
pub type ItemId = i64;

pub struct ItemStore {
    items: RwLock<HashMap<ItemId, String>>,
    next_id: AtomicI64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Insert a new item and return its id
    pub async fn create(&self, name: String) -> ItemId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.items.write().await.insert(id, name);
        tracing::debug!(item_id = id, "Created item");
        id
    }

    pub async fn read(&self, id: ItemId) -> Option<String> {
        self.items.read().await.get(&id).cloned()
    }

    /// Replace the name of an existing item
    ///
    /// Returns `false` without inserting anything if `id` is unknown.
    pub async fn update(&self, id: ItemId, name: String) -> bool {
        match self.items.write().await.get_mut(&id) {
            Some(existing) => {
                *existing = name;
                true
            }
            None => false,
        }
    }

    /// Remove an item, returning `false` if `id` is unknown
    pub async fn delete(&self, id: ItemId) -> bool {
        self.items.write().await.remove(&id).is_some()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}
