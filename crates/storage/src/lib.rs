//! Storage layer for the translation core
//!
//! This crate implements the reference partition backend:
//! - MemDb: BTreeMap-based partition with RwLock
//! - mem_db_set: a DbSet with one MemDb per partition
//!
//! Persistence is out of scope; MemDb exists so that callbacks and the
//! dispatcher can be exercised against a real [`Db`](xfmr_core::Db).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mem_db;

pub use mem_db::MemDb;

use std::sync::Arc;
use xfmr_core::{DbNum, DbSet};

/// Build a handle array with an empty [`MemDb`] for every partition
///
/// Returns the set together with the concrete handles (index = partition
/// number) so tests can inspect partition contents directly.
pub fn mem_db_set() -> (DbSet, Vec<Arc<MemDb>>) {
    let mut set = DbSet::new();
    let mut handles = Vec::with_capacity(DbNum::COUNT);
    for db in DbNum::ALL {
        let handle = Arc::new(MemDb::new(db));
        set.insert(handle.clone());
        handles.push(handle);
    }
    (set, handles)
}
