//! Core types for the translation core
//!
//! This module defines the foundational enumerations:
//! - DbNum: Backend partition identifier
//! - Operation: Request operation attached to every callback invocation
//! - SubscProcType: Phase of the subscription protocol
//! - NotificationType: Preferred notification style for a subscribed path

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::XfmrError;

/// Backend partition identifier
///
/// The backend datastore is split into a small fixed set of numbered
/// logical databases. The discriminant is the partition number and the
/// index into a [`DbSet`](crate::db::DbSet).
///
/// ## Partition numbers
///
/// These values mirror the datastore's numbering and MUST NOT change:
/// - ApplDb = 0
/// - AsicDb = 1
/// - CountersDb = 2
/// - LogLevelDb = 3
/// - ConfigDb = 4
/// - FlexCounterDb = 5
/// - StateDb = 6
/// - SnmpOverlayDb = 7
/// - ErrorDb = 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DbNum {
    /// Application state pushed to the forwarding agents
    ApplDb = 0,
    /// ASIC objects
    AsicDb = 1,
    /// Counters
    CountersDb = 2,
    /// Log levels
    LogLevelDb = 3,
    /// Persisted configuration
    ConfigDb = 4,
    /// Counter polling configuration
    FlexCounterDb = 5,
    /// Operational state
    StateDb = 6,
    /// SNMP overlay
    SnmpOverlayDb = 7,
    /// Errors reported by the forwarding agents
    ErrorDb = 8,
}

impl DbNum {
    /// Number of partitions
    pub const COUNT: usize = 9;

    /// Every partition in index order
    pub const ALL: [DbNum; DbNum::COUNT] = [
        DbNum::ApplDb,
        DbNum::AsicDb,
        DbNum::CountersDb,
        DbNum::LogLevelDb,
        DbNum::ConfigDb,
        DbNum::FlexCounterDb,
        DbNum::StateDb,
        DbNum::SnmpOverlayDb,
        DbNum::ErrorDb,
    ];

    /// Index into a handle array
    pub fn index(self) -> usize {
        self as usize
    }

    /// Partition for an index, if in range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Canonical partition name
    pub fn name(self) -> &'static str {
        match self {
            DbNum::ApplDb => "APPL_DB",
            DbNum::AsicDb => "ASIC_DB",
            DbNum::CountersDb => "COUNTERS_DB",
            DbNum::LogLevelDb => "LOGLEVEL_DB",
            DbNum::ConfigDb => "CONFIG_DB",
            DbNum::FlexCounterDb => "FLEX_COUNTER_DB",
            DbNum::StateDb => "STATE_DB",
            DbNum::SnmpOverlayDb => "SNMP_OVERLAY_DB",
            DbNum::ErrorDb => "ERROR_DB",
        }
    }

    /// Separator between the components of a composite key
    pub fn key_separator(self) -> char {
        match self {
            DbNum::ConfigDb | DbNum::StateDb => '|',
            _ => ':',
        }
    }
}

impl fmt::Display for DbNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DbNum {
    type Err = XfmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DbNum::ALL
            .iter()
            .copied()
            .find(|db| db.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| XfmrError::config(format!("unknown partition name '{}'", s)))
    }
}

/// Request operation
///
/// Immutable for the duration of a callback invocation. The ordering of
/// the variants is the order in which staged sub-operations are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    /// Read
    Get,
    /// Create a new node
    Create,
    /// Replace a node and everything below it
    Replace,
    /// Merge into an existing node
    Update,
    /// Remove a node
    Delete,
}

impl Operation {
    /// True for every operation except `Get`
    pub fn is_write(self) -> bool {
        !matches!(self, Operation::Get)
    }

    /// Upper-case operation name
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Create => "CREATE",
            Operation::Replace => "REPLACE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of the subscription protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscProcType {
    /// Compute what to watch
    TranslateSubscribe,
    /// Compute the current value after a backend change
    ProcessSubscribe,
}

/// Preferred notification style for a subscribed path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NotificationType {
    /// Let the target decide
    #[default]
    TargetDefined,
    /// Periodic sampling
    Sample,
    /// Notify on every visible change
    OnChange,
}
