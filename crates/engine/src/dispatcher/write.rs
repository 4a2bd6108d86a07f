//! Write path: schema tree → backend snapshot → partitions
//!
//! `translate_to_db` is pure with respect to the partitions: it only
//! collects what the callbacks produce. `apply` then folds a translation
//! into the partitions in a fixed order: primary snapshot, staged
//! sub-operations (Create, Replace, Update, Delete), cascade deletes, post
//! snapshot.

use tracing::{debug, info, warn};
use xfmr_concurrency::RequestContext;
use xfmr_core::{
    schema, DbDataMap, DbNum, JsonValue, KeyMap, Operation, SchemaPath, SubOpDataMap,
    XfmrError, XfmrResult,
};

use super::{Dispatcher, Node};
use crate::callbacks::{SubTreeXfmrYangToDb, Xfmr, XfmrKind};
use crate::cascade::CascadeDeleteSet;
use crate::params::XfmrOutputs;

/// Everything a write request translated to
#[derive(Debug, Clone, PartialEq)]
pub struct WriteTranslation {
    /// Request operation
    pub oper: Operation,
    /// Request path
    pub uri: String,
    /// Primary snapshot
    pub data: DbDataMap,
    /// Snapshots staged under other operations
    pub sub_ops: SubOpDataMap,
    /// Snapshot returned by post-hooks
    pub post: DbDataMap,
    /// Records deleted as a side effect
    pub cascade: CascadeDeleteSet,
    /// Last value set by any callback, `None` when unset
    pub skip_ordering_check: Option<bool>,
    /// Last value set by any callback, `None` when unset
    pub is_virtual_table: Option<bool>,
}

impl WriteTranslation {
    fn new(oper: Operation, uri: &str) -> Self {
        Self {
            oper,
            uri: uri.to_string(),
            data: DbDataMap::new(),
            sub_ops: SubOpDataMap::new(),
            post: DbDataMap::new(),
            cascade: CascadeDeleteSet::new(),
            skip_ordering_check: None,
            is_virtual_table: None,
        }
    }

    /// Fold the mutable results of one callback into the translation
    fn absorb(&mut self, node: &Node, key: Option<&str>, outputs: XfmrOutputs) -> XfmrResult<()> {
        for (oper, data) in outputs.sub_op_data_map {
            self.sub_ops.entry(oper).or_default().merge(data);
        }
        if outputs.skip_ord_tbl_chk.is_some() {
            self.skip_ordering_check = outputs.skip_ord_tbl_chk;
        }
        if outputs.is_virtual_tbl.is_some() {
            self.is_virtual_table = outputs.is_virtual_tbl;
        }
        if outputs.cascade_del_tbl.is_empty() {
            return Ok(());
        }
        if self.oper != Operation::Delete {
            debug!(path = %node.uri, oper = %self.oper, "ignoring cascade tables outside DELETE");
            return Ok(());
        }
        match key {
            Some(key) => self.cascade.extend_tables(node.db, key, outputs.cascade_del_tbl),
            None => {
                // No instance to name: the declared tables go as a whole
                debug!(
                    path = %node.uri,
                    tables = ?outputs.cascade_del_tbl,
                    "table-level cascade delete"
                );
                for table in outputs.cascade_del_tbl {
                    self.data
                        .insert_tables(node.db, [(table, KeyMap::new())].into_iter().collect());
                }
            }
        }
        Ok(())
    }

    /// Total records across every snapshot and the cascade set
    pub fn record_count(&self) -> usize {
        self.data.record_count()
            + self.sub_ops.values().map(DbDataMap::record_count).sum::<usize>()
            + self.post.record_count()
            + self.cascade.len()
    }
}

/// Counters returned by [`Dispatcher::apply`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Records created, replaced or merged
    pub written: usize,
    /// Records or field sets deleted
    pub deleted: usize,
    /// Whole tables deleted
    pub tables_deleted: usize,
    /// Cascade deletes that removed an existing record
    pub cascade_deleted: usize,
}

impl Dispatcher {
    /// Translate a write request into backend snapshots
    ///
    /// `root` is the request payload rooted at the schema root. Nothing is
    /// written to the partitions; see [`apply`](Self::apply).
    ///
    /// # Errors
    ///
    /// The first callback error aborts the whole translation; the error
    /// carries the request path and everything staged so far is dropped.
    pub fn translate_to_db(
        &self,
        req: &RequestContext,
        oper: Operation,
        uri: &str,
        root: &JsonValue,
    ) -> XfmrResult<WriteTranslation> {
        if !oper.is_write() {
            return Err(XfmrError::translation(uri, "GET is not a write operation"));
        }
        let path = SchemaPath::parse(uri)?;
        let mut out = WriteTranslation::new(oper, uri);
        if let Err(e) = self.translate_node(req, path, uri, root, &mut out) {
            warn!(path = uri, %oper, error = %e, "write aborted");
            return Err(e.at_path(uri));
        }
        debug!(
            path = uri,
            %oper,
            records = out.record_count(),
            request_id = %req.id(),
            "write translated"
        );
        Ok(out)
    }

    fn translate_node(
        &self,
        req: &RequestContext,
        path: SchemaPath,
        request_uri: &str,
        root: &JsonValue,
        out: &mut WriteTranslation,
    ) -> XfmrResult<()> {
        let oper = out.oper;
        let node = self.node(path);
        let (key, key_outputs) = self.resolve_key(req, oper, &node, request_uri, Some(root))?;
        out.absorb(&node, key.as_deref(), key_outputs)?;
        let mut mapped = false;

        if let Some(Xfmr::Pre(f)) = self.registry.get(&node.template, XfmrKind::Pre) {
            let mut p = self
                .params(req, oper, &node, request_uri, key.as_deref())
                .yg_root_shared(root)
                .build()?;
            debug!(path = %node.uri, tag = XfmrKind::Pre.tag(), %oper, "invoke");
            f(&mut p)?;
            out.absorb(&node, key.as_deref(), p.into_outputs())?;
            mapped = true;
        }

        if let Some(Xfmr::SubtreeToDb(f)) = self.registry.get(&node.template, XfmrKind::SubtreeToDb)
        {
            self.run_subtree_to_db(req, &node, request_uri, key.as_deref(), root, f, out)?;
            mapped = true;
        } else {
            mapped |= self.map_fields(req, &node, request_uri, key.as_deref(), root, out)?;
        }

        for desc in self.registry.descendants(&node.template, XfmrKind::SubtreeToDb) {
            let Some(desc_uri) = node.path.descendant_uri(desc) else {
                continue;
            };
            let desc_path = SchemaPath::parse(&desc_uri)?;
            if oper != Operation::Delete && schema::node(root, &desc_path).is_none() {
                continue;
            }
            let Some(Xfmr::SubtreeToDb(f)) = self.registry.get(desc, XfmrKind::SubtreeToDb) else {
                continue;
            };
            let desc_node = self.node(desc_path);
            let (desc_key, key_outputs) =
                self.resolve_key(req, oper, &desc_node, request_uri, Some(root))?;
            out.absorb(&desc_node, desc_key.as_deref(), key_outputs)?;
            let keys = match (desc_key, &desc_node.table) {
                (Some(key), _) => vec![Some(key)],
                // A parent DELETE reaches every stored instance of a keyed child
                (None, Some(table)) if oper == Operation::Delete => self
                    .dbs
                    .require(desc_node.db)?
                    .get_keys(table)?
                    .into_iter()
                    .map(Some)
                    .collect(),
                (None, _) => vec![None],
            };
            for desc_key in keys {
                self.run_subtree_to_db(
                    req,
                    &desc_node,
                    request_uri,
                    desc_key.as_deref(),
                    root,
                    f,
                    out,
                )?;
            }
            mapped = true;
        }

        if let Some(Xfmr::Post(f)) = self.registry.get(&node.template, XfmrKind::Post) {
            let mut p = self
                .params(req, oper, &node, request_uri, key.as_deref())
                .yg_root_shared(root)
                .build()?;
            debug!(path = %node.uri, tag = XfmrKind::Post.tag(), %oper, "invoke");
            let tables = f(&mut p)?;
            out.post.insert_tables(node.db, tables);
            out.absorb(&node, key.as_deref(), p.into_outputs())?;
            mapped = true;
        }

        if !mapped && out.is_virtual_table != Some(true) {
            return Err(XfmrError::translation(
                node.uri,
                "no table mapping or callback for node",
            ));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_subtree_to_db(
        &self,
        req: &RequestContext,
        node: &Node,
        request_uri: &str,
        key: Option<&str>,
        root: &JsonValue,
        f: &SubTreeXfmrYangToDb,
        out: &mut WriteTranslation,
    ) -> XfmrResult<()> {
        let mut p = self
            .params(req, out.oper, node, request_uri, key)
            .yg_root_shared(root)
            .build()?;
        debug!(path = %node.uri, tag = XfmrKind::SubtreeToDb.tag(), oper = %out.oper, "invoke");
        let tables = f(&mut p)?;
        out.data.insert_tables(node.db, tables);
        out.absorb(node, key, p.into_outputs())
    }

    /// Default and field-level mapping; returns false when the node maps to
    /// no table
    fn map_fields(
        &self,
        req: &RequestContext,
        node: &Node,
        request_uri: &str,
        key: Option<&str>,
        root: &JsonValue,
        out: &mut WriteTranslation,
    ) -> XfmrResult<bool> {
        let oper = out.oper;
        let (tables, outputs) =
            self.resolve_tables(req, oper, node, request_uri, key, Some(root))?;
        out.absorb(node, key, outputs)?;
        if tables.is_empty() {
            return Ok(false);
        }
        let Some(key) = key else {
            if oper == Operation::Delete {
                for table in tables {
                    out.data
                        .insert_tables(node.db, [(table, KeyMap::new())].into_iter().collect());
                }
                return Ok(true);
            }
            return Err(XfmrError::translation(
                node.uri.clone(),
                "no key for table-mapped node",
            ));
        };

        let fields = if let Some(Xfmr::FieldToDb(f)) =
            self.registry.get(&node.template, XfmrKind::FieldToDb)
        {
            let mut p = self
                .params(req, oper, node, request_uri, Some(key))
                .yg_root_shared(root)
                .build()?;
            debug!(path = %node.uri, tag = XfmrKind::FieldToDb.tag(), %oper, "invoke");
            let fields = f(&mut p)?;
            out.absorb(node, Some(key), p.into_outputs())?;
            fields
        } else if oper == Operation::Delete {
            // An empty record deletes the whole entry
            Default::default()
        } else {
            let key_leaves: Vec<&str> = node
                .path
                .last()
                .map(|seg| seg.keys.iter().map(|(k, _)| k.as_str()).collect())
                .unwrap_or_default();
            let mut leaves = schema::node(root, &node.path)
                .map(schema::leaves)
                .unwrap_or_default();
            leaves.retain(|name, _| !key_leaves.contains(&name.as_str()));
            leaves
        };

        for table in &tables {
            let record = out.data.entry_mut(node.db, table.as_str(), key);
            for (field, value) in &fields {
                let value = self.convert_field(node, oper, table, key, field, value)?;
                record.set(field.as_str(), value);
            }
            if matches!(oper, Operation::Create | Operation::Replace) {
                if let Some(defaults) = self.registry.defaults().get(table) {
                    for (field, value) in defaults.iter() {
                        if !record.has(field) {
                            record.set(field, value);
                        }
                    }
                }
            }
        }
        Ok(true)
    }

    /// Fold a translation into the partitions
    ///
    /// # Errors
    ///
    /// Fails on a missing partition handle, a handle error, or a staged
    /// `Get` snapshot. Writes made before the failure stay applied.
    pub fn apply(&self, t: &WriteTranslation) -> XfmrResult<ApplyStats> {
        let mut stats = ApplyStats::default();
        self.apply_data(t.oper, &t.data, &mut stats)?;
        for (oper, data) in &t.sub_ops {
            self.apply_data(*oper, data, &mut stats)?;
        }
        for c in t.cascade.iter() {
            let db = self.dbs.require(c.db)?;
            if db.delete_entry(&c.table, &c.key)? {
                stats.cascade_deleted += 1;
            }
            info!(db = %c.db, table = %c.table, key = %c.key, "cascade delete");
        }
        self.apply_data(t.oper, &t.post, &mut stats)?;
        debug!(path = %t.uri, oper = %t.oper, ?stats, "write applied");
        Ok(stats)
    }

    fn apply_data(
        &self,
        oper: Operation,
        data: &DbDataMap,
        stats: &mut ApplyStats,
    ) -> XfmrResult<()> {
        let partitions: Vec<DbNum> = data.partitions().collect();
        for db_num in partitions {
            let Some(tables) = data.tables(db_num) else {
                continue;
            };
            let db = self.dbs.require(db_num)?;
            for (table, keys) in tables {
                if keys.is_empty() {
                    if oper == Operation::Delete {
                        db.delete_table(table)?;
                        stats.tables_deleted += 1;
                    }
                    continue;
                }
                for (key, value) in keys {
                    match oper {
                        Operation::Create | Operation::Update => {
                            db.mod_entry(table, key, value)?;
                            stats.written += 1;
                        }
                        Operation::Replace => {
                            db.set_entry(table, key, value.clone())?;
                            stats.written += 1;
                        }
                        Operation::Delete if value.is_empty() => {
                            db.delete_entry(table, key)?;
                            stats.deleted += 1;
                        }
                        Operation::Delete => {
                            db.delete_fields(table, key, value)?;
                            stats.deleted += 1;
                        }
                        Operation::Get => {
                            return Err(XfmrError::translation(
                                format!("{}|{}", table, key),
                                "GET snapshot cannot be applied",
                            ))
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
