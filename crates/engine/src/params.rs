//! Call Context passed to every contextual callback
//!
//! [`XfmrParams`] is built once per dispatch by [`XfmrParamsBuilder`] and
//! handed to the callback by mutable reference. Everything the dispatcher
//! decides (operation, paths, table/key, partition handles, schema root,
//! snapshot, defaults, opaque parameter) is private and exposed through
//! getters. Only the fields a callback is allowed to change have mutators:
//!
//! - staged sub-operations ([`XfmrParams::stage_sub_op`])
//! - cascade delete tables, append-only ([`XfmrParams::add_cascade_delete_table`])
//! - the tri-state flags ([`XfmrParams::set_skip_ordering_check`],
//!   [`XfmrParams::set_virtual_table`])
//! - the transaction cache (interior mutability)
//!
//! After the call the dispatcher consumes the context with
//! [`XfmrParams::into_outputs`]. Every borrowed field is bounded by `'a`, so
//! no callback can keep the context past its invocation.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;

use xfmr_concurrency::TxCache;
use xfmr_core::{
    Db, DbDataMap, DbNum, DbSet, DbValue, JsonValue, Operation, SchemaPath, SubOpDataMap,
    XfmrError, XfmrResult,
};

/// Access mode to the schema tree for one call
///
/// DB→schema callbacks write the tree and get it exclusively; schema→DB
/// callbacks only read it.
#[derive(Debug, Default)]
pub enum YgRoot<'a> {
    /// No schema tree for this call
    #[default]
    Absent,
    /// Read-only access
    Shared(&'a JsonValue),
    /// Exclusive write access
    Exclusive(&'a mut JsonValue),
}

/// Mutable results of one call, collected by the dispatcher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XfmrOutputs {
    /// Snapshots staged under other operations
    pub sub_op_data_map: SubOpDataMap,
    /// Tri-state ordering-check flag
    pub skip_ord_tbl_chk: Option<bool>,
    /// Tri-state virtual-table flag
    pub is_virtual_tbl: Option<bool>,
    /// Tables to delete as a side effect, in declaration order
    pub cascade_del_tbl: Vec<String>,
}

impl XfmrOutputs {
    /// Fold a later call's outputs into these
    ///
    /// Staged snapshots merge per operation, a set flag overrides an earlier
    /// value and cascade tables keep declaration order.
    pub fn merge(&mut self, other: XfmrOutputs) {
        for (oper, data) in other.sub_op_data_map {
            self.sub_op_data_map.entry(oper).or_default().merge(data);
        }
        if other.skip_ord_tbl_chk.is_some() {
            self.skip_ord_tbl_chk = other.skip_ord_tbl_chk;
        }
        if other.is_virtual_tbl.is_some() {
            self.is_virtual_tbl = other.is_virtual_tbl;
        }
        self.cascade_del_tbl.extend(other.cascade_del_tbl);
    }

    /// True when no call changed anything
    pub fn is_empty(&self) -> bool {
        self.sub_op_data_map.is_empty()
            && self.skip_ord_tbl_chk.is_none()
            && self.is_virtual_tbl.is_none()
            && self.cascade_del_tbl.is_empty()
    }
}

/// Parameter bundle for one callback invocation
pub struct XfmrParams<'a> {
    db: Option<&'a dyn Db>,
    dbs: &'a DbSet,
    cur_db: DbNum,
    yg_root: YgRoot<'a>,
    uri: String,
    request_uri: String,
    path: SchemaPath,
    oper: Operation,
    table: Option<String>,
    key: Option<String>,
    db_data_map: Option<&'a DbDataMap>,
    sub_op_data_map: SubOpDataMap,
    param: Option<&'a (dyn Any + Send + Sync)>,
    tx_cache: &'a TxCache,
    skip_ord_tbl_chk: Option<bool>,
    is_virtual_tbl: Option<bool>,
    cascade_del_tbl: Vec<String>,
    yang_def_val_map: Option<&'a BTreeMap<String, DbValue>>,
}

impl<'a> XfmrParams<'a> {
    /// Start building a context
    pub fn builder(
        oper: Operation,
        uri: impl Into<String>,
        dbs: &'a DbSet,
        tx_cache: &'a TxCache,
    ) -> XfmrParamsBuilder<'a> {
        XfmrParamsBuilder {
            oper,
            uri: uri.into(),
            request_uri: None,
            dbs,
            tx_cache,
            db: None,
            cur_db: DbNum::ConfigDb,
            yg_root: YgRoot::Absent,
            table: None,
            key: None,
            db_data_map: None,
            param: None,
            yang_def_val_map: None,
        }
    }

    // ------------------------------------------------------------------
    // Read-only view
    // ------------------------------------------------------------------

    /// Operation being executed
    pub fn oper(&self) -> Operation {
        self.oper
    }

    /// Resolved node path
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Path as supplied by the caller
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    /// Parsed form of [`uri`](Self::uri)
    pub fn path(&self) -> &SchemaPath {
        &self.path
    }

    /// Statically known table
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Statically known key
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Selected partition
    pub fn cur_db(&self) -> DbNum {
        self.cur_db
    }

    /// Primary partition handle
    pub fn db(&self) -> Option<&'a dyn Db> {
        self.db
    }

    /// Handle for any partition, independent of [`cur_db`](Self::cur_db)
    pub fn db_for(&self, db: DbNum) -> Option<&'a dyn Db> {
        self.dbs.get(db).map(|h| &**h)
    }

    /// The whole handle array
    pub fn dbs(&self) -> &'a DbSet {
        self.dbs
    }

    /// Schema tree, read-only (available in both access modes)
    pub fn yg_root(&self) -> Option<&JsonValue> {
        match &self.yg_root {
            YgRoot::Absent => None,
            YgRoot::Shared(root) => Some(root),
            YgRoot::Exclusive(root) => Some(root),
        }
    }

    /// Schema tree for writing
    ///
    /// # Errors
    ///
    /// Returns a translation error unless the dispatcher granted exclusive
    /// access for this call.
    pub fn yg_root_mut(&mut self) -> XfmrResult<&mut JsonValue> {
        match &mut self.yg_root {
            YgRoot::Exclusive(root) => Ok(&mut **root),
            _ => Err(XfmrError::translation(
                self.uri.clone(),
                "schema tree is not writable in this call",
            )),
        }
    }

    /// Backend snapshot relevant to this path
    pub fn db_data_map(&self) -> Option<&'a DbDataMap> {
        self.db_data_map
    }

    /// Request-scoped cache
    pub fn tx_cache(&self) -> &'a TxCache {
        self.tx_cache
    }

    /// Declared defaults for a table
    pub fn yang_defaults(&self, table: &str) -> Option<&'a DbValue> {
        self.yang_def_val_map.and_then(|m| m.get(table))
    }

    /// Opaque dispatcher parameter, downcast to the expected type
    ///
    /// # Errors
    ///
    /// Returns `ParamMismatch` when no parameter was supplied or it has a
    /// different type.
    pub fn param_as<T: Any>(&self) -> XfmrResult<&'a T> {
        self.param
            .and_then(|p| p.downcast_ref::<T>())
            .ok_or(XfmrError::ParamMismatch {
                expected: type_name::<T>(),
            })
    }

    // ------------------------------------------------------------------
    // Mutable fields
    // ------------------------------------------------------------------

    /// Staged snapshot for another operation, created on first use
    pub fn sub_op_data_mut(&mut self, oper: Operation) -> &mut DbDataMap {
        self.sub_op_data_map.entry(oper).or_default()
    }

    /// Stage one record under another operation
    pub fn stage_sub_op(
        &mut self,
        oper: Operation,
        db: DbNum,
        table: impl Into<String>,
        key: impl Into<String>,
        value: DbValue,
    ) {
        self.sub_op_data_mut(oper).insert(db, table, key, value);
    }

    /// Everything staged so far
    pub fn sub_op_data_map(&self) -> &SubOpDataMap {
        &self.sub_op_data_map
    }

    /// Set the ordering-check flag
    pub fn set_skip_ordering_check(&mut self, skip: bool) {
        self.skip_ord_tbl_chk = Some(skip);
    }

    /// Ordering-check flag, `None` when unset
    pub fn skip_ordering_check(&self) -> Option<bool> {
        self.skip_ord_tbl_chk
    }

    /// Set the virtual-table flag
    pub fn set_virtual_table(&mut self, is_virtual: bool) {
        self.is_virtual_tbl = Some(is_virtual);
    }

    /// Virtual-table flag, `None` when unset
    pub fn is_virtual_table(&self) -> Option<bool> {
        self.is_virtual_tbl
    }

    /// Declare a table to delete as a side effect of this node's deletion
    pub fn add_cascade_delete_table(&mut self, table: impl Into<String>) {
        self.cascade_del_tbl.push(table.into());
    }

    /// Tables declared so far
    pub fn cascade_delete_tables(&self) -> &[String] {
        &self.cascade_del_tbl
    }

    /// Consume the context, returning what the callback changed
    pub fn into_outputs(self) -> XfmrOutputs {
        XfmrOutputs {
            sub_op_data_map: self.sub_op_data_map,
            skip_ord_tbl_chk: self.skip_ord_tbl_chk,
            is_virtual_tbl: self.is_virtual_tbl,
            cascade_del_tbl: self.cascade_del_tbl,
        }
    }
}

impl fmt::Debug for XfmrParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XfmrParams")
            .field("oper", &self.oper)
            .field("uri", &self.uri)
            .field("request_uri", &self.request_uri)
            .field("cur_db", &self.cur_db)
            .field("table", &self.table)
            .field("key", &self.key)
            .field("has_param", &self.param.is_some())
            .field("skip_ord_tbl_chk", &self.skip_ord_tbl_chk)
            .field("is_virtual_tbl", &self.is_virtual_tbl)
            .field("cascade_del_tbl", &self.cascade_del_tbl)
            .finish()
    }
}

/// Builder for [`XfmrParams`]
pub struct XfmrParamsBuilder<'a> {
    oper: Operation,
    uri: String,
    request_uri: Option<String>,
    dbs: &'a DbSet,
    tx_cache: &'a TxCache,
    db: Option<&'a dyn Db>,
    cur_db: DbNum,
    yg_root: YgRoot<'a>,
    table: Option<String>,
    key: Option<String>,
    db_data_map: Option<&'a DbDataMap>,
    param: Option<&'a (dyn Any + Send + Sync)>,
    yang_def_val_map: Option<&'a BTreeMap<String, DbValue>>,
}

impl<'a> XfmrParamsBuilder<'a> {
    /// Original caller path (defaults to the resolved path)
    pub fn request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    /// Selected partition (defaults to CONFIG_DB)
    pub fn cur_db(mut self, db: DbNum) -> Self {
        self.cur_db = db;
        self
    }

    /// Primary handle (defaults to the handle of the selected partition)
    pub fn primary(mut self, db: &'a dyn Db) -> Self {
        self.db = Some(db);
        self
    }

    /// Read-only schema tree
    pub fn yg_root_shared(mut self, root: &'a JsonValue) -> Self {
        self.yg_root = YgRoot::Shared(root);
        self
    }

    /// Writable schema tree
    pub fn yg_root_exclusive(mut self, root: &'a mut JsonValue) -> Self {
        self.yg_root = YgRoot::Exclusive(root);
        self
    }

    /// Schema tree in an explicit access mode
    pub fn yg_root(mut self, root: YgRoot<'a>) -> Self {
        self.yg_root = root;
        self
    }

    /// Statically known table
    pub fn table(mut self, table: Option<impl Into<String>>) -> Self {
        self.table = table.map(Into::into);
        self
    }

    /// Statically known key
    pub fn key(mut self, key: Option<impl Into<String>>) -> Self {
        self.key = key.map(Into::into);
        self
    }

    /// Backend snapshot relevant to the path
    pub fn db_data_map(mut self, data: &'a DbDataMap) -> Self {
        self.db_data_map = Some(data);
        self
    }

    /// Opaque, kind-specific parameter
    pub fn param(mut self, param: &'a (dyn Any + Send + Sync)) -> Self {
        self.param = Some(param);
        self
    }

    /// Declared defaults, table → record
    pub fn yang_defaults(mut self, defaults: &'a BTreeMap<String, DbValue>) -> Self {
        self.yang_def_val_map = Some(defaults);
        self
    }

    /// Finish the context
    ///
    /// # Errors
    ///
    /// Returns a translation error if the path is malformed.
    pub fn build(self) -> XfmrResult<XfmrParams<'a>> {
        let path = SchemaPath::parse(&self.uri)?;
        let db = self
            .db
            .or_else(|| self.dbs.get(self.cur_db).map(|h| &**h));
        Ok(XfmrParams {
            db,
            dbs: self.dbs,
            cur_db: self.cur_db,
            yg_root: self.yg_root,
            request_uri: self.request_uri.unwrap_or_else(|| self.uri.clone()),
            uri: self.uri,
            path,
            oper: self.oper,
            table: self.table,
            key: self.key,
            db_data_map: self.db_data_map,
            sub_op_data_map: SubOpDataMap::new(),
            param: self.param,
            tx_cache: self.tx_cache,
            skip_ord_tbl_chk: None,
            is_virtual_tbl: None,
            cascade_del_tbl: Vec::new(),
            yang_def_val_map: self.yang_def_val_map,
        })
    }
}
