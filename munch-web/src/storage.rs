//! `localStorage`-backed key-value store
use munch_core::KeyValueStore;

use crate::dom::{js_error_message, local_storage};

/// Web-specific storage using `localStorage`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage write failed for {key}: {message}")]
    Write { key: String, message: String },
}

impl KeyValueStore for LocalStore {
    type Error = WebStorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let storage =
            local_storage().map_err(|e| WebStorageError::Unavailable(js_error_message(&e)))?;
        storage
            .get_item(key)
            .map_err(|e| WebStorageError::Unavailable(js_error_message(&e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let storage =
            local_storage().map_err(|e| WebStorageError::Unavailable(js_error_message(&e)))?;
        storage
            .set_item(key, value)
            .map_err(|e| WebStorageError::Write {
                key: key.to_string(),
                message: js_error_message(&e),
            })
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        let storage =
            local_storage().map_err(|e| WebStorageError::Unavailable(js_error_message(&e)))?;
        storage
            .remove_item(key)
            .map_err(|e| WebStorageError::Unavailable(js_error_message(&e)))
    }
}
