//! Request-scoped transaction cache
//!
//! Callbacks invoked for different nodes of the same request use this cache
//! to memoize expensive lookups and pass side-channel data to each other.
//! It is created when the request starts, shared by reference with every
//! Call Context of that request, and dropped when the request ends.
//!
//! Values are stored type-erased as `Arc<dyn Any + Send + Sync>` and handed
//! back as `Arc<T>`; reading a value under the wrong type is reported, never
//! silently treated as a miss.
//!
//! # Thread Safety
//!
//! Backed by `DashMap`, so concurrent sub-invocations of one request may read
//! and write it at the same time.

use dashmap::DashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use xfmr_core::{XfmrError, XfmrResult};

type CacheValue = Arc<dyn Any + Send + Sync>;

/// Concurrency-safe cache shared by all callbacks of one request
#[derive(Default)]
pub struct TxCache {
    entries: DashMap<String, CacheValue>,
}

impl TxCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning true if a previous value was replaced
    pub fn insert<T>(&self, key: impl Into<String>, value: T) -> bool
    where
        T: Any + Send + Sync,
    {
        self.entries
            .insert(key.into(), Arc::new(value) as CacheValue)
            .is_some()
    }

    /// Typed lookup
    ///
    /// Returns `Ok(None)` on a miss.
    ///
    /// # Errors
    ///
    /// Returns `ParamMismatch` when the key holds a value of another type.
    pub fn get<T>(&self, key: &str) -> XfmrResult<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        let Some(value) = self.entries.get(key).map(|v| Arc::clone(v.value())) else {
            return Ok(None);
        };
        value.downcast::<T>().map(Some).map_err(|_| XfmrError::ParamMismatch {
            expected: type_name::<T>(),
        })
    }

    /// Memoize: return the cached value or compute and store it
    ///
    /// `init` runs while the key's shard is locked and must not touch this
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns `ParamMismatch` when the key already holds a value of another
    /// type.
    pub fn get_or_insert_with<T, F>(&self, key: &str, init: F) -> XfmrResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let value = Arc::clone(
            self.entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(init()) as CacheValue)
                .value(),
        );
        value.downcast::<T>().map_err(|_| XfmrError::ParamMismatch {
            expected: type_name::<T>(),
        })
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, returning true if it was present
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl fmt::Debug for TxCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
