//! Key-value persistence for the cart.
//!
//! The storefront keeps its cart under a single key in a string-to-string
//! store (the browser's local storage on the live site). [`KeyValueStore`]
//! abstracts that capability so tests can use [`MemoryStore`] and the CLI
//! can use [`FileStore`]. [`CartStorage`] layers the cart's JSON encoding on
//! top of a store.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fftraders_core::LineItem;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from a key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A string key-value store.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file.
///
/// The file is re-read on every access, so several processes sharing a path
/// see each other's writes, with the same last-writer-wins behavior as
/// browser storage shared between tabs.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;

        // Write to a sibling file and rename so readers never see a torn file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Cart persistence under a fixed key.
#[derive(Debug, Clone)]
pub struct CartStorage<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> CartStorage<S> {
    /// Wrap `store`, keeping the cart under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load the stored line items.
    ///
    /// Returns an empty list when nothing is stored or the stored value is
    /// unreadable. Entries that are not valid line items are skipped; the
    /// rest of the cart survives.
    pub fn load(&self) -> Vec<LineItem> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read cart, treating as empty");
                return Vec::new();
            }
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored cart is not a JSON array, treating as empty");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<LineItem>(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Skipping malformed cart entry");
                    None
                }
            })
            .collect()
    }

    /// Serialize `items` and overwrite the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the store write fails.
    pub fn save(&mut self, items: &[LineItem]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items)?;
        self.store.set(&self.key, &json)?;
        debug!(key = %self.key, items = items.len(), "Cart saved");
        Ok(())
    }

    /// Delete the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.delete(&self.key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn storage_with(raw: &str) -> CartStorage<MemoryStore> {
        let mut store = MemoryStore::new();
        store.set("cart", raw).unwrap();
        CartStorage::new(store, "cart")
    }

    #[test]
    fn test_load_absent_is_empty() {
        let storage = CartStorage::new(MemoryStore::new(), "cart");
        assert!(storage.load().is_empty());
    }

    #[test]
    fn test_load_garbage_is_empty() {
        assert!(storage_with("{not json").load().is_empty());
        assert!(storage_with(r#"{"id":"a"}"#).load().is_empty());
    }

    #[test]
    fn test_load_skips_malformed_entries() {
        let storage = storage_with(r#"[{"id":"a","name":"A","price":"1.5","qty":2}, 42, {"name":"no id"}]"#);
        let items = storage.load();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_str(), "a");
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = CartStorage::new(MemoryStore::new(), "cart");
        let items = vec![
            LineItem::new("a", "A", Decimal::new(150, 2), 2),
            LineItem::new("b", "B", Decimal::new(3, 0), 1).with_image("/img/b.jpg"),
        ];
        storage.save(&items).unwrap();
        assert_eq!(storage.load(), items);
    }

    #[test]
    fn test_save_of_load_is_idempotent() {
        let mut storage = storage_with(r#"[{"id":"a","name":"A","price":12.5,"qty":1,"image":""}]"#);
        let first = storage.load();
        storage.save(&first).unwrap();
        let raw_once = storage.store().get("cart").unwrap();

        let second = storage.load();
        storage.save(&second).unwrap();
        let raw_twice = storage.store().get("cart").unwrap();

        assert_eq!(first, second);
        assert_eq!(raw_once, raw_twice);
    }

    #[test]
    fn test_clear_removes_key() {
        let mut storage = storage_with("[]");
        storage.clear().unwrap();
        assert_eq!(storage.store().get("cart").unwrap(), None);
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let mut store = FileStore::new(&path);

        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("other", "x").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));

        // A second handle on the same path sees the writes
        let mut reopened = FileStore::new(&path);
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("x"));
        reopened.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.get("k"),
            Err(StorageError::Serialization(_))
        ));

        // The cart layer absorbs the failure
        let storage = CartStorage::new(store, "k");
        assert!(storage.load().is_empty());
    }
}
