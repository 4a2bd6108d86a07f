//! Concurrency layer for the translation core
//!
//! This crate holds the request-scoped state shared by callbacks that may run
//! in parallel for different nodes of the same request:
//! - TxCache: concurrency-safe typed cache
//! - RequestContext: owns the cache for the lifetime of one request

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod request;
pub mod tx_cache;

pub use request::RequestContext;
pub use tx_cache::TxCache;
