//! Partition handle abstraction
//!
//! This module defines the [`Db`] trait consumed by the translation core and
//! [`DbSet`], the fixed array of per-partition handles handed to every
//! callback. Storage engines implement [`Db`]; the core never assumes a
//! particular backend.
//!
//! Thread safety: handles are shared between callbacks (`Send + Sync`), but a
//! callback must not assume exclusive access to a handle beyond its own call.

use std::fmt;
use std::sync::Arc;

use crate::data_map::KeyMap;
use crate::error::{XfmrError, XfmrResult};
use crate::types::DbNum;
use crate::value::DbValue;

/// Handle onto one backend partition
pub trait Db: Send + Sync + fmt::Debug {
    /// Partition this handle addresses
    fn db_num(&self) -> DbNum;

    /// Read one record
    ///
    /// Returns None if the key doesn't exist.
    fn get_entry(&self, table: &str, key: &str) -> XfmrResult<Option<DbValue>>;

    /// List keys of a table, sorted
    fn get_keys(&self, table: &str) -> XfmrResult<Vec<String>>;

    /// Read every record of a table
    fn get_table(&self, table: &str) -> XfmrResult<KeyMap>;

    /// Write a record, replacing any existing fields
    fn set_entry(&self, table: &str, key: &str, value: DbValue) -> XfmrResult<()>;

    /// Merge fields into a record, creating it if absent
    fn mod_entry(&self, table: &str, key: &str, value: &DbValue) -> XfmrResult<()>;

    /// Delete a record
    ///
    /// Returns true if the record existed.
    fn delete_entry(&self, table: &str, key: &str) -> XfmrResult<bool>;

    /// Delete the named fields of a record; the record itself is kept
    fn delete_fields(&self, table: &str, key: &str, fields: &DbValue) -> XfmrResult<()>;

    /// Delete every record of a table
    ///
    /// Returns the number of records removed.
    fn delete_table(&self, table: &str) -> XfmrResult<usize>;

    /// Separator used to join composite keys in this partition
    fn key_separator(&self) -> char {
        self.db_num().key_separator()
    }
}

/// Per-partition handle array, indexed by [`DbNum`]
#[derive(Clone, Default)]
pub struct DbSet {
    handles: [Option<Arc<dyn Db>>; DbNum::COUNT],
}

impl DbSet {
    /// Create a set with no handles
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle under its own partition number (builder style)
    pub fn with(mut self, handle: Arc<dyn Db>) -> Self {
        self.insert(handle);
        self
    }

    /// Add a handle under its own partition number
    ///
    /// Returns the handle previously held for that partition.
    pub fn insert(&mut self, handle: Arc<dyn Db>) -> Option<Arc<dyn Db>> {
        let idx = handle.db_num().index();
        self.handles[idx].replace(handle)
    }

    /// Handle for a partition
    pub fn get(&self, db: DbNum) -> Option<&Arc<dyn Db>> {
        self.handles[db.index()].as_ref()
    }

    /// Handle for a partition, or a storage error naming it
    pub fn require(&self, db: DbNum) -> XfmrResult<&dyn Db> {
        self.get(db)
            .map(|h| &**h)
            .ok_or_else(|| XfmrError::storage(format!("no handle for {}", db)))
    }

    /// Partitions with a handle
    pub fn available(&self) -> impl Iterator<Item = DbNum> + '_ {
        DbNum::ALL
            .iter()
            .copied()
            .filter(move |db| self.handles[db.index()].is_some())
    }
}

impl fmt::Debug for DbSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSet")
            .field("available", &self.available().collect::<Vec<_>>())
            .finish()
    }
}

/// Join composite key components with a partition's separator
pub fn join_key<S: AsRef<str>>(db: DbNum, parts: &[S]) -> String {
    let sep = db.key_separator().to_string();
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(&sep)
}

/// Split a composite key with a partition's separator
pub fn split_key(db: DbNum, key: &str) -> Vec<&str> {
    key.split(db.key_separator()).collect()
}
