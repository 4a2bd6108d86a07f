//! xfmr - callback core for translating a schema tree to and from a
//! table/key/field datastore
//!
//! A schema-modeled request (a JSON tree addressed by paths such as
//! `/interfaces/interface[name=Ethernet0]`) is translated into records of a
//! partitioned key/field datastore, and back. Per-node callbacks registered
//! in an [`XfmrRegistry`] customise every step; nodes without callbacks use
//! default mapping.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use xfmr::{mem_db_set, DbNum, Dispatcher, EnumValueXfmr, Operation, XfmrRegistry};
//!
//! let mut registry = XfmrRegistry::new();
//! registry.annotate("/interfaces/interface", DbNum::ConfigDb, Some("PORT"))?;
//! registry.register(
//!     "/interfaces/interface/admin_status",
//!     EnumValueXfmr::new([("UP", "up"), ("DOWN", "down")]).into_xfmr(),
//! )?;
//!
//! let (dbs, _) = mem_db_set();
//! let dispatcher = Dispatcher::new(Arc::new(registry), dbs);
//!
//! let req = dispatcher.begin_request();
//! let payload = serde_json::json!({"interfaces": {"interface": [
//!     {"name": "Ethernet0", "admin_status": "UP"}
//! ]}});
//! let t = dispatcher.translate_to_db(
//!     &req,
//!     Operation::Update,
//!     "/interfaces/interface[name=Ethernet0]",
//!     &payload,
//! )?;
//! dispatcher.apply(&t)?;
//! ```
//!
//! # Architecture
//!
//! - `xfmr-core`: partitions, operations, snapshots, paths, errors, `Db`
//! - `xfmr-concurrency`: request scope and transaction cache
//! - `xfmr-storage`: in-memory partition backend
//! - `xfmr-engine`: Call Context, callback kinds, registry, dispatcher

pub use xfmr_concurrency::{RequestContext, TxCache};
pub use xfmr_core::*;
pub use xfmr_engine::*;
pub use xfmr_storage::{mem_db_set, MemDb};
