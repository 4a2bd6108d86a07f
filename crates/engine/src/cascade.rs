//! Cascade delete accumulation
//!
//! While a DELETE walks a subtree, every subtree callback may declare tables
//! whose records for the node's key must go too. Declarations from parent
//! and children overlap, so the set keeps each (partition, table, key) once,
//! in first-declaration order.

use std::collections::HashSet;

use xfmr_core::DbNum;

/// One record scheduled for deletion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CascadeDelete {
    /// Partition holding the record
    pub db: DbNum,
    /// Table holding the record
    pub table: String,
    /// Record key
    pub key: String,
}

/// Insertion-ordered set of cascade deletes
#[derive(Debug, Clone, Default)]
pub struct CascadeDeleteSet {
    entries: Vec<CascadeDelete>,
    seen: HashSet<CascadeDelete>,
}

impl CascadeDeleteSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; returns false when it was already present
    pub fn insert(&mut self, entry: CascadeDelete) -> bool {
        if self.seen.contains(&entry) {
            return false;
        }
        self.seen.insert(entry.clone());
        self.entries.push(entry);
        true
    }

    /// Schedule `key` for deletion from every table
    pub fn extend_tables<I, S>(&mut self, db: DbNum, key: &str, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for table in tables {
            self.insert(CascadeDelete {
                db,
                table: table.into(),
                key: key.to_string(),
            });
        }
    }

    /// Distinct table names, first-declaration order
    pub fn tables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.table.as_str()))
            .map(|e| e.table.as_str())
            .collect()
    }

    /// Check if a table is scheduled
    pub fn contains_table(&self, table: &str) -> bool {
        self.entries.iter().any(|e| e.table == table)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CascadeDelete> {
        self.entries.iter()
    }

    /// Number of scheduled deletes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is scheduled
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for CascadeDeleteSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
