//! Read path: partitions → schema tree
//!
//! Each requested path is translated on its own and reports a
//! [`NodeStatus`]. A validate callpoint returning false filters the node
//! without an error. Under the partial read policy a failing node does not
//! affect its siblings, and leaves the schema tree as it was before the node
//! was attempted.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use xfmr_concurrency::RequestContext;
use xfmr_core::{
    schema, DbDataMap, JsonValue, Operation, PathSegment, SchemaPath, XfmrError, XfmrResult,
};

use super::{Dispatcher, Node};
use crate::callbacks::{Xfmr, XfmrKind};
use crate::config::ReadPolicy;
use crate::params::XfmrOutputs;

/// Outcome of reading one path
#[derive(Debug)]
pub enum NodeStatus {
    /// Data written into the schema tree
    Populated,
    /// Dropped by a validate callpoint
    Filtered,
    /// Translation failed for this node only
    Failed(XfmrError),
}

impl NodeStatus {
    /// True for [`NodeStatus::Populated`]
    pub fn is_populated(&self) -> bool {
        matches!(self, NodeStatus::Populated)
    }

    /// True for [`NodeStatus::Filtered`]
    pub fn is_filtered(&self) -> bool {
        matches!(self, NodeStatus::Filtered)
    }

    /// Error of a failed node
    pub fn error(&self) -> Option<&XfmrError> {
        match self {
            NodeStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Per-path outcome of a read, in request order
#[derive(Debug, Default)]
pub struct ReadResult {
    /// `(path, status)` pairs
    pub nodes: Vec<(String, NodeStatus)>,
    /// Staged sub-operations, flags and cascade tables set by the callbacks
    /// of every node that did not fail. A read applies none of them.
    pub outputs: XfmrOutputs,
}

impl ReadResult {
    /// Status of one requested path
    pub fn status(&self, uri: &str) -> Option<&NodeStatus> {
        self.nodes.iter().find(|(u, _)| u == uri).map(|(_, s)| s)
    }

    /// Paths written into the schema tree
    pub fn populated(&self) -> Vec<&str> {
        self.select(NodeStatus::is_populated)
    }

    /// Paths dropped by validation
    pub fn filtered(&self) -> Vec<&str> {
        self.select(NodeStatus::is_filtered)
    }

    /// Failed paths with their errors
    pub fn failures(&self) -> Vec<(&str, &XfmrError)> {
        self.nodes
            .iter()
            .filter_map(|(u, s)| s.error().map(|e| (u.as_str(), e)))
            .collect()
    }

    /// True when no node failed
    pub fn is_complete(&self) -> bool {
        self.nodes.iter().all(|(_, s)| s.error().is_none())
    }

    fn select(&self, pred: fn(&NodeStatus) -> bool) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, s)| pred(s))
            .map(|(u, _)| u.as_str())
            .collect()
    }
}

impl Dispatcher {
    /// Populate `root` from the partitions for each requested path
    ///
    /// # Errors
    ///
    /// Only under the all-or-nothing read policy, with the first node
    /// failure. Otherwise failures are reported per node in the result.
    pub fn translate_from_db(
        &self,
        req: &RequestContext,
        uris: &[&str],
        root: &mut JsonValue,
    ) -> XfmrResult<ReadResult> {
        let mut result = ReadResult::default();
        for uri in uris {
            let before = root.clone();
            let mut outputs = XfmrOutputs::default();
            let status = match self.read_node(req, uri, root, &mut outputs) {
                Ok(status) => {
                    result.outputs.merge(outputs);
                    status
                }
                Err(e) => {
                    *root = before;
                    let e = e.at_path(*uri);
                    warn!(path = %uri, error = %e, "read failed");
                    if self.read_policy == ReadPolicy::AllOrNothing {
                        return Err(e);
                    }
                    NodeStatus::Failed(e)
                }
            };
            result.nodes.push((uri.to_string(), status));
        }
        Ok(result)
    }

    fn read_node(
        &self,
        req: &RequestContext,
        uri: &str,
        root: &mut JsonValue,
        outputs: &mut XfmrOutputs,
    ) -> XfmrResult<NodeStatus> {
        let oper = Operation::Get;
        let node = self.node(SchemaPath::parse(uri)?);

        if let Some(Xfmr::Validate(f)) = self.registry.get(&node.template, XfmrKind::Validate) {
            let keep = {
                let mut p = self
                    .params(req, oper, &node, uri, None)
                    .yg_root_shared(root)
                    .build()?;
                debug!(path = %node.uri, tag = XfmrKind::Validate.tag(), "invoke");
                let keep = f(&mut p);
                outputs.merge(p.into_outputs());
                keep
            };
            if !keep {
                schema::remove_node(root, &node.path);
                debug!(path = %node.uri, "node filtered");
                return Ok(NodeStatus::Filtered);
            }
        }

        let (key, key_outputs) = self.resolve_key(req, oper, &node, uri, Some(&*root))?;
        outputs.merge(key_outputs);

        if let Some(Xfmr::SubtreeToYang(f)) =
            self.registry.get(&node.template, XfmrKind::SubtreeToYang)
        {
            let snapshot = self.fetch_snapshot(&node, key.as_deref())?;
            let mut p = self
                .params(req, oper, &node, uri, key.as_deref())
                .yg_root_exclusive(root)
                .db_data_map(&snapshot)
                .build()?;
            debug!(path = %node.uri, tag = XfmrKind::SubtreeToYang.tag(), "invoke");
            f(&mut p)?;
            outputs.merge(p.into_outputs());
            return Ok(NodeStatus::Populated);
        }

        let (tables, table_outputs) =
            self.resolve_tables(req, oper, &node, uri, key.as_deref(), Some(&*root))?;
        outputs.merge(table_outputs);
        if tables.is_empty() {
            if outputs.is_virtual_tbl == Some(true) {
                return Ok(NodeStatus::Populated);
            }
            return Err(XfmrError::translation(node.uri, "no table mapping for node"));
        }

        let db = self.dbs.require(node.db)?;
        for table in &tables {
            let keys = match &key {
                Some(k) => vec![k.clone()],
                None => db.get_keys(table)?,
            };
            for k in keys {
                let record = db
                    .get_entry(table, &k)?
                    .ok_or_else(|| XfmrError::backend_mismatch(node.db, table.as_str(), k.as_str()))?;
                let mut snapshot = DbDataMap::new();
                snapshot.insert(node.db, table.as_str(), k.as_str(), record.clone());

                let instance = if key.is_some() {
                    node.path.clone()
                } else {
                    let (instance, key_outputs) =
                        self.instance_path(req, &node, uri, table, &k, &snapshot)?;
                    outputs.merge(key_outputs);
                    instance
                };

                let leaves = if let Some(Xfmr::FieldToYang(f)) =
                    self.registry.get(&node.template, XfmrKind::FieldToYang)
                {
                    let mut p = self
                        .params(req, oper, &node, uri, Some(&k))
                        .table(Some(table.as_str()))
                        .yg_root_shared(root)
                        .db_data_map(&snapshot)
                        .build()?;
                    debug!(path = %node.uri, tag = XfmrKind::FieldToYang.tag(), "invoke");
                    let leaves = f(&mut p)?;
                    outputs.merge(p.into_outputs());
                    leaves
                } else {
                    let mut leaves = BTreeMap::new();
                    for (field, value) in record.iter() {
                        let value = self.convert_field(&node, oper, table, &k, field, value)?;
                        leaves.insert(field.to_string(), JsonValue::String(value));
                    }
                    leaves
                };
                schema::set_leaves(root, &instance, leaves)?;
            }
        }
        Ok(NodeStatus::Populated)
    }

    /// The record at the node's static table and key, when both are known
    fn fetch_snapshot(&self, node: &Node, key: Option<&str>) -> XfmrResult<DbDataMap> {
        let mut snapshot = DbDataMap::new();
        let (Some(table), Some(key)) = (node.table.as_deref(), key) else {
            return Ok(snapshot);
        };
        if let Some(record) = self.dbs.require(node.db)?.get_entry(table, key)? {
            snapshot.insert(node.db, table, key, record);
        }
        Ok(snapshot)
    }

    /// Concrete list entry path for a backend key found by enumeration,
    /// with what the key callback staged or flagged
    fn instance_path(
        &self,
        req: &RequestContext,
        node: &Node,
        uri: &str,
        table: &str,
        key: &str,
        snapshot: &DbDataMap,
    ) -> XfmrResult<(SchemaPath, XfmrOutputs)> {
        let Some(Xfmr::KeyToYang(f)) = self.registry.get(&node.template, XfmrKind::KeyToYang)
        else {
            return Err(XfmrError::translation(
                node.uri.clone(),
                "cannot enumerate entries without a key-to-schema callback",
            ));
        };
        let Some(last) = node.path.last() else {
            return Err(XfmrError::translation(node.uri.clone(), "cannot enumerate the root"));
        };
        let mut p = self
            .params(req, Operation::Get, node, uri, Some(key))
            .table(Some(table))
            .db_data_map(snapshot)
            .build()?;
        debug!(path = %node.uri, tag = XfmrKind::KeyToYang.tag(), key, "invoke");
        let key_leaves = f(&mut p)?;
        let key_outputs = p.into_outputs();

        let mut segment = PathSegment::new(last.name.clone());
        segment.module = last.module.clone();
        segment.keys = key_leaves
            .iter()
            .map(|(name, value)| {
                let value = schema::scalar_to_string(value).unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        let instance = node.path.parent().unwrap_or_else(SchemaPath::root).child(segment);
        Ok((instance, key_outputs))
    }
}
