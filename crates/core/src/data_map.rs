//! Backend Data Snapshot
//!
//! Nested mapping partition → table → key → [`DbValue`] used to stage
//! writes and to hand backend content to callbacks. Nearly every callback
//! consumes or produces one of these.
//!
//! # Merge semantics
//!
//! A (partition, table, key) triple addresses at most one record.
//! [`DbDataMap::merge`] is record-level last-write-wins; callers that need
//! a field-level union must ask for it explicitly with [`DbDataMap::union`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{DbNum, Operation};
use crate::value::DbValue;

/// key → record
pub type KeyMap = BTreeMap<String, DbValue>;

/// table → key → record, for a single partition
pub type TableMap = BTreeMap<String, KeyMap>;

/// Snapshots staged under an operation other than the executing one
pub type SubOpDataMap = BTreeMap<Operation, DbDataMap>;

/// partition → table → key → record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbDataMap {
    partitions: BTreeMap<DbNum, TableMap>,
}

impl DbDataMap {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot holding one partition's tables
    pub fn from_tables(db: DbNum, tables: TableMap) -> Self {
        let mut map = Self::new();
        map.insert_tables(db, tables);
        map
    }

    /// Look up a record
    pub fn get(&self, db: DbNum, table: &str, key: &str) -> Option<&DbValue> {
        self.partitions.get(&db)?.get(table)?.get(key)
    }

    /// Tables of a partition
    pub fn tables(&self, db: DbNum) -> Option<&TableMap> {
        self.partitions.get(&db)
    }

    /// Keys of one table
    pub fn table(&self, db: DbNum, table: &str) -> Option<&KeyMap> {
        self.partitions.get(&db)?.get(table)
    }

    /// Insert a record, replacing any previous one (last write wins)
    pub fn insert(
        &mut self,
        db: DbNum,
        table: impl Into<String>,
        key: impl Into<String>,
        value: DbValue,
    ) -> Option<DbValue> {
        self.partitions
            .entry(db)
            .or_default()
            .entry(table.into())
            .or_default()
            .insert(key.into(), value)
    }

    /// Mutable access to a record, creating an empty one when absent
    pub fn entry_mut(
        &mut self,
        db: DbNum,
        table: impl Into<String>,
        key: impl Into<String>,
    ) -> &mut DbValue {
        self.partitions
            .entry(db)
            .or_default()
            .entry(table.into())
            .or_default()
            .entry(key.into())
            .or_default()
    }

    /// Insert every record of a table map (last write wins per record)
    ///
    /// Tables present with no keys are kept so that a table-level intent
    /// (e.g. "delete everything in T") survives.
    pub fn insert_tables(&mut self, db: DbNum, tables: TableMap) {
        let partition = self.partitions.entry(db).or_default();
        for (table, keys) in tables {
            let target = partition.entry(table).or_default();
            for (key, value) in keys {
                target.insert(key, value);
            }
        }
    }

    /// Remove a record
    pub fn remove(&mut self, db: DbNum, table: &str, key: &str) -> Option<DbValue> {
        let partition = self.partitions.get_mut(&db)?;
        let keys = partition.get_mut(table)?;
        let removed = keys.remove(key);
        if keys.is_empty() {
            partition.remove(table);
        }
        if partition.is_empty() {
            self.partitions.remove(&db);
        }
        removed
    }

    /// Record-level merge; records of `other` replace ours
    pub fn merge(&mut self, other: DbDataMap) {
        for (db, tables) in other.partitions {
            self.insert_tables(db, tables);
        }
    }

    /// Field-level union; overlapping fields take `other`'s value
    pub fn union(&mut self, other: &DbDataMap) {
        for (db, table, key, value) in other.iter() {
            self.entry_mut(db, table, key).merge_fields(value);
        }
    }

    /// Partitions with at least one table
    pub fn partitions(&self) -> impl Iterator<Item = DbNum> + '_ {
        self.partitions.keys().copied()
    }

    /// Iterate over every (partition, table, key, record)
    pub fn iter(&self) -> impl Iterator<Item = (DbNum, &str, &str, &DbValue)> {
        self.partitions.iter().flat_map(|(db, tables)| {
            tables.iter().flat_map(move |(table, keys)| {
                keys.iter()
                    .map(move |(key, value)| (*db, table.as_str(), key.as_str(), value))
            })
        })
    }

    /// Number of records across all partitions
    pub fn record_count(&self) -> usize {
        self.partitions
            .values()
            .flat_map(|tables| tables.values())
            .map(|keys| keys.len())
            .sum()
    }

    /// True when no partition holds any table
    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(|tables| tables.is_empty())
    }
}
