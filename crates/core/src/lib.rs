//! Core types and traits for the translation core
//!
//! This crate defines the foundational types used throughout the system:
//! - DbNum: Backend partition identifier
//! - Operation: Request operation carried by every callback invocation
//! - DbValue: Field/value record
//! - DbDataMap: Backend Data Snapshot (partition → table → key → record)
//! - SchemaPath: Parsed request path with list key predicates
//! - Db / DbSet: Partition handle abstraction and per-partition handle array
//! - Error: Error taxonomy
//! - schema: helpers resolving paths against the JSON schema tree

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data_map;
pub mod db;
pub mod error;
pub mod path;
pub mod schema;
pub mod types;
pub mod value;

pub use data_map::{DbDataMap, KeyMap, SubOpDataMap, TableMap};
pub use db::{join_key, split_key, Db, DbSet};
pub use error::{ErrorKind, XfmrError, XfmrResult};
pub use path::{PathSegment, SchemaPath};
pub use types::{DbNum, NotificationType, Operation, SubscProcType};
pub use value::DbValue;

/// JSON document type used for the schema tree
pub use serde_json::Value as JsonValue;
