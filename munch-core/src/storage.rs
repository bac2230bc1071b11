//! In-memory key-value storage
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::KeyValueStore;
use crate::error::StorageError;

/// Shared in-memory store; clones observe the same entries.
///
/// Writes can be switched off to simulate a full or unavailable browser store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    reject_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing write rejection.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }
}

impl KeyValueStore for MemoryStore {
    type Error = StorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.reject_writes.get() {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set_item("cart", "[]").unwrap();
        assert_eq!(other.get_item("cart").unwrap().as_deref(), Some("[]"));
        other.remove_item("cart").unwrap();
        assert!(store.get_item("cart").unwrap().is_none());
    }

    #[test]
    fn rejected_writes_leave_entries_untouched() {
        let store = MemoryStore::new();
        store.insert_raw("cart", "[1]");
        store.set_reject_writes(true);
        let err = store.set_item("cart", "[]").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.raw("cart").as_deref(), Some("[1]"));
    }
}
