//! Type-safe Key-Value session store for cartkit.
//!
//! Provides a small backend trait, an in-memory backend, a typed JSON
//! cache over any backend, and a session-scoped view that namespaces keys
//! per user session.
//!
//! # Example
//!
//! ```rust,ignore
//! use cartkit_store::{Cache, MemoryStore};
//!
//! let cache = Cache::new(MemoryStore::new());
//!
//! // Store a value
//! cache.set("cart.shop", &contents)?;
//!
//! // Retrieve a value
//! let contents: Option<CartContents> = cache.get("cart.shop")?;
//!
//! // Delete a value
//! cache.delete("cart.shop")?;
//! ```

mod error;
mod kv;
mod session;

pub use error::{StoreError, StoreResult};
pub use kv::{Cache, KvStore, MemoryStore};
pub use session::{SessionId, SessionStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, KvStore, MemoryStore, SessionId, SessionStore, StoreError};
}
