//! Session-scoped view over a shared Key-Value store.

use serde::{Deserialize, Serialize};

use crate::{KvStore, StoreResult};

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new cryptographically secure session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A store restricted to one user session.
///
/// Every key is prefixed with `session:<id>:` before it reaches the shared
/// backend, so carts of different sessions never see each other's data even
/// when they use the same instance name.
///
/// # Example
///
/// ```rust,ignore
/// let backend = Arc::new(MemoryStore::new());
/// let session = SessionStore::new(Arc::clone(&backend), SessionId::generate());
/// let mut cart = Cart::new(session);
/// ```
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    backend: S,
    id: SessionId,
    prefix: String,
}

impl<S: KvStore> SessionStore<S> {
    /// Scope `backend` to the session `id`.
    pub fn new(backend: S, id: SessionId) -> Self {
        let prefix = format!("session:{}:", id);
        Self {
            backend,
            id,
            prefix,
        }
    }

    /// The session this store is scoped to.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Remove every key belonging to this session.
    pub fn clear(&self) -> StoreResult<()> {
        for key in self.backend.keys()? {
            if key.starts_with(&self.prefix) {
                self.backend.delete(&key)?;
            }
        }
        tracing::debug!(session = %self.id, "session cleared");
        Ok(())
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl<S: KvStore> KvStore for SessionStore<S> {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        self.backend.exists(&self.scoped(key))
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.backend.get(&self.scoped(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.backend.set(&self.scoped(key), value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.backend.delete(&self.scoped(key))
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }
}
