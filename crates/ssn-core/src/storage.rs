//! Session-scoped key/value storage used for the search snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Browser-session-like string storage. Values live only as long as the
/// owning session.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
    fn remove_item(&self, key: &str);
}

/// In-process [`SessionStorage`]. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_items<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> T {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut items)
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.with_items(|items| items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) {
        self.with_items(|items| {
            items.insert(key.to_owned(), value);
        });
    }

    fn remove_item(&self, key: &str) {
        self.with_items(|items| {
            items.remove(key);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_slots() {
        let storage = MemorySessionStorage::new();
        let other = storage.clone();
        storage.set_item("k", "v".to_owned());
        assert_eq!(other.get_item("k").as_deref(), Some("v"));
        other.remove_item("k");
        assert!(storage.get_item("k").is_none());
    }
}
