//! Key-Value store abstraction with automatic serialization.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{de::DeserializeOwned, Serialize};

use crate::{StoreError, StoreResult};

/// A raw key-value backend keyed by string.
///
/// Values are opaque bytes. Implementations decide where they live; the
/// cart never assumes anything beyond "what was set under a key is what
/// comes back from it".
pub trait KvStore {
    /// Check if a key exists.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Get the bytes stored under a key, or `None` if absent.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store bytes under a key, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// List all keys.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        (**self).exists(key)
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        (**self).exists(key)
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        (**self).keys()
    }
}

/// Process-local backend holding values in a map.
///
/// Suitable for request-scoped sessions and tests. Share one instance
/// between carts with `Arc<MemoryStore>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

impl KvStore for MemoryStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.read().map_err(poisoned)?.contains_key(key))
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .read()
            .map_err(poisoned)?
            .keys()
            .cloned()
            .collect())
    }
}

/// Type-safe cache over any [`KvStore`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`.
///
/// # Example
///
/// ```rust,ignore
/// let cache = Cache::new(MemoryStore::new());
/// cache.set("cart.shop", &contents)?;
/// let contents: Option<CartContents> = cache.get("cart.shop")?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cache<S> {
    store: S,
}

impl<S: KvStore> Cache<S> {
    /// Wrap a backend.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the cache and return the backend.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        tracing::trace!(key, bytes = bytes.len(), "store set");
        self.store.set(key, &bytes)
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        tracing::trace!(key, "store delete");
        self.store.delete(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> StoreResult<bool> {
        self.store.exists(key)
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        self.store.keys()
    }
}

/// Helper to build store keys with dotted namespacing.
///
/// # Example
///
/// ```
/// let key = cartkit_store::store_key!("cart", "wishlist");
/// assert_eq!(key, "cart.wishlist");
/// ```
#[macro_export]
macro_rules! store_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push('.');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
