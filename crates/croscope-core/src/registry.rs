//! Registry of named components.
//!
//! Adapters are registered once at startup and looked up by name when the
//! Vision Manager is built.

use dashmap::DashMap;
use std::sync::Arc;

use croscope_protocols::error::RegistryError;
use croscope_protocols::VisionAdapter;

/// Items that can be stored in a registry under a unique ID.
pub trait Registerable: Send + Sync {
    fn registry_id(&self) -> &str;
}

impl Registerable for dyn VisionAdapter {
    fn registry_id(&self) -> &str {
        self.name()
    }
}

/// Thread-safe registry keyed by [`Registerable::registry_id`].
pub struct BaseRegistry<T: ?Sized + Registerable> {
    items: DashMap<String, Arc<T>>,
}

/// Registry of every constructed vision adapter, enabled or not.
pub type AdapterRegistry = BaseRegistry<dyn VisionAdapter>;

impl<T: ?Sized + Registerable> BaseRegistry<T> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Register an item. Fails if the ID is taken.
    pub fn register(&self, item: Arc<T>) -> Result<(), RegistryError> {
        let id = item.registry_id().to_string();

        if self.items.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }

        self.items.insert(id, item);
        Ok(())
    }

    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        self.items
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.items.get(id).map(|item| item.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Registered IDs, sorted.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.iter().map(|item| item.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: ?Sized + Registerable> Default for BaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
