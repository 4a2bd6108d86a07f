//! Per-request scope
//!
//! A [`RequestContext`] lives exactly as long as one logical request. It owns
//! the request's [`TxCache`]; every Call Context built for the request borrows
//! the cache from here, so no cache outlives its request.

use uuid::Uuid;

use crate::tx_cache::TxCache;

/// State shared by every callback of one request
#[derive(Debug)]
pub struct RequestContext {
    id: Uuid,
    cache: TxCache,
}

impl RequestContext {
    /// Start a new request with an empty cache
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(request_id = %id, "request started");
        Self {
            id,
            cache: TxCache::new(),
        }
    }

    /// Unique request identifier, used to correlate log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The request's transaction cache
    pub fn cache(&self) -> &TxCache {
        &self.cache
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        tracing::debug!(
            request_id = %self.id,
            cached_entries = self.cache.len(),
            "request finished"
        );
    }
}
