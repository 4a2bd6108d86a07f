//! MemDb: in-memory partition backend
//!
//! This module implements the [`Db`] trait using:
//! - `BTreeMap<String, KeyMap>` for ordered table → key → record storage
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **No persistence**: contents live as long as the handle
//! - **Whole-call locking**: each trait call takes the lock once, so a
//!   single call is atomic but a sequence of calls is not
//! - **Empty tables are pruned**: deleting the last key drops the table

use std::collections::BTreeMap;

use parking_lot::RwLock;

use xfmr_core::{Db, DbNum, DbValue, KeyMap, TableMap, XfmrResult};

/// In-memory handle onto one partition
#[derive(Debug)]
pub struct MemDb {
    db_num: DbNum,
    tables: RwLock<BTreeMap<String, KeyMap>>,
}

impl MemDb {
    /// Create an empty partition
    pub fn new(db_num: DbNum) -> Self {
        Self {
            db_num,
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a partition pre-loaded with tables
    pub fn with_tables(db_num: DbNum, tables: TableMap) -> Self {
        Self {
            db_num,
            tables: RwLock::new(tables),
        }
    }

    /// Copy of the whole partition
    pub fn dump(&self) -> TableMap {
        self.tables.read().clone()
    }

    /// Number of records across all tables
    pub fn record_count(&self) -> usize {
        self.tables.read().values().map(|keys| keys.len()).sum()
    }

    /// Names of tables holding at least one record
    pub fn table_names(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }
}

impl Db for MemDb {
    fn db_num(&self) -> DbNum {
        self.db_num
    }

    fn get_entry(&self, table: &str, key: &str) -> XfmrResult<Option<DbValue>> {
        Ok(self
            .tables
            .read()
            .get(table)
            .and_then(|keys| keys.get(key))
            .cloned())
    }

    fn get_keys(&self, table: &str) -> XfmrResult<Vec<String>> {
        Ok(self
            .tables
            .read()
            .get(table)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn get_table(&self, table: &str) -> XfmrResult<KeyMap> {
        Ok(self.tables.read().get(table).cloned().unwrap_or_default())
    }

    fn set_entry(&self, table: &str, key: &str, value: DbValue) -> XfmrResult<()> {
        tracing::trace!(db = %self.db_num, table, key, "set entry");
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn mod_entry(&self, table: &str, key: &str, value: &DbValue) -> XfmrResult<()> {
        tracing::trace!(db = %self.db_num, table, key, fields = value.len(), "mod entry");
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .merge_fields(value);
        Ok(())
    }

    fn delete_entry(&self, table: &str, key: &str) -> XfmrResult<bool> {
        tracing::trace!(db = %self.db_num, table, key, "delete entry");
        let mut tables = self.tables.write();
        let Some(keys) = tables.get_mut(table) else {
            return Ok(false);
        };
        let existed = keys.remove(key).is_some();
        if keys.is_empty() {
            tables.remove(table);
        }
        Ok(existed)
    }

    fn delete_fields(&self, table: &str, key: &str, fields: &DbValue) -> XfmrResult<()> {
        tracing::trace!(db = %self.db_num, table, key, fields = fields.len(), "delete fields");
        let mut tables = self.tables.write();
        if let Some(record) = tables.get_mut(table).and_then(|keys| keys.get_mut(key)) {
            for (field, _) in fields.iter() {
                record.remove(field);
            }
        }
        Ok(())
    }

    fn delete_table(&self, table: &str) -> XfmrResult<usize> {
        tracing::trace!(db = %self.db_num, table, "delete table");
        Ok(self
            .tables
            .write()
            .remove(table)
            .map(|keys| keys.len())
            .unwrap_or(0))
    }
}
