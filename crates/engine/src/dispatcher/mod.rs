//! Reference dispatcher
//!
//! The dispatcher walks a request path, looks up the callbacks registered
//! for each node and invokes them with a freshly built Call Context:
//! - Write path: `translate_to_db` then `apply`
//! - Read path: `translate_from_db`
//! - Subscriptions: `subscription_session`
//! - Actions: `invoke_rpc`
//! - Single values: `transform_value`
//!
//! Nodes without a callback of a given kind fall back to default mapping:
//! the annotated table, a composite key built from the path predicates
//! joined with the partition's separator, and leaves mapped one-to-one to
//! fields.

mod read;
mod session;
mod write;

pub use read::{NodeStatus, ReadResult};
pub use session::{ProcessOutcome, SubscribeFailure, SubscriptionSession, WatchEntry};
pub use write::{ApplyStats, WriteTranslation};

use std::sync::Arc;

use tracing::{debug, warn};
use xfmr_concurrency::RequestContext;
use xfmr_core::{join_key, DbNum, DbSet, JsonValue, Operation, SchemaPath, XfmrError, XfmrResult};

use crate::callbacks::{Xfmr, XfmrKind};
use crate::config::{ReadPolicy, XfmrConfig};
use crate::params::{XfmrOutputs, XfmrParams, XfmrParamsBuilder};
use crate::registry::XfmrRegistry;
use crate::value_xfmr::XfmrDbParams;

/// Resolved view of one schema node
#[derive(Debug, Clone)]
struct Node {
    path: SchemaPath,
    uri: String,
    template: String,
    db: DbNum,
    table: Option<String>,
}

/// Translation dispatcher over a registry and a set of partitions
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<XfmrRegistry>,
    dbs: DbSet,
    config: XfmrConfig,
    default_db: DbNum,
    read_policy: ReadPolicy,
}

impl Dispatcher {
    /// Create a dispatcher with the default configuration
    pub fn new(registry: Arc<XfmrRegistry>, dbs: DbSet) -> Self {
        Self {
            registry,
            dbs,
            config: XfmrConfig::default(),
            default_db: DbNum::ConfigDb,
            read_policy: ReadPolicy::Partial,
        }
    }

    /// Create a dispatcher from a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns a config error if the configuration holds invalid values.
    pub fn with_config(
        registry: Arc<XfmrRegistry>,
        dbs: DbSet,
        config: XfmrConfig,
    ) -> XfmrResult<Self> {
        let default_db = config.default_db_num()?;
        let read_policy = config.read_policy()?;
        Ok(Self {
            registry,
            dbs,
            config,
            default_db,
            read_policy,
        })
    }

    /// Registered callbacks
    pub fn registry(&self) -> &XfmrRegistry {
        &self.registry
    }

    /// Partition handles
    pub fn dbs(&self) -> &DbSet {
        &self.dbs
    }

    /// Active configuration
    pub fn config(&self) -> &XfmrConfig {
        &self.config
    }

    /// Start a request with a fresh transaction cache
    pub fn begin_request(&self) -> RequestContext {
        RequestContext::new()
    }

    /// Run the action registered at `uri`
    ///
    /// # Errors
    ///
    /// Every failure is reported as an action error, except cancellation
    /// which is passed through unchanged.
    pub fn invoke_rpc(&self, uri: &str, body: &[u8]) -> XfmrResult<Vec<u8>> {
        let path = SchemaPath::parse(uri).map_err(|e| XfmrError::action(uri, e.to_string()))?;
        let Some(Xfmr::Rpc(rpc)) = self.registry.lookup(&path, XfmrKind::Rpc) else {
            return Err(XfmrError::action(uri, "no callpoint registered"));
        };
        debug!(path = uri, tag = XfmrKind::Rpc.tag(), "invoke");
        rpc(body, &self.dbs).map_err(|e| match e {
            XfmrError::Action { .. } | XfmrError::Cancelled { .. } => e,
            other => {
                warn!(path = uri, error = %other, "action failed");
                XfmrError::action(uri, other.to_string())
            }
        })
    }

    /// Convert one field value with the value transformer registered at
    /// `path` (the field's own path), or return it unchanged
    pub fn transform_value(&self, path: &str, params: &XfmrDbParams) -> XfmrResult<String> {
        let path = SchemaPath::parse(path)?;
        match self.registry.lookup(&path, XfmrKind::Value) {
            Some(Xfmr::Value(v)) => v.call(params),
            _ => Ok(params.value.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Shared resolution helpers
    // ------------------------------------------------------------------

    fn node(&self, path: SchemaPath) -> Node {
        let template = path.template();
        let annotation = self.registry.annotation(&template);
        Node {
            uri: path.to_string(),
            db: annotation.map_or(self.default_db, |a| a.db),
            table: annotation.and_then(|a| a.table.clone()),
            template,
            path,
        }
    }

    /// Call Context for one node
    ///
    /// The opaque slot carries the node's
    /// [`NodeAnnotation`](crate::registry::NodeAnnotation) when the
    /// registry has one for its template.
    fn params<'a>(
        &'a self,
        req: &'a RequestContext,
        oper: Operation,
        node: &Node,
        request_uri: &str,
        key: Option<&str>,
    ) -> XfmrParamsBuilder<'a> {
        let builder = XfmrParams::builder(oper, node.uri.clone(), &self.dbs, req.cache())
            .request_uri(request_uri)
            .cur_db(node.db)
            .table(node.table.as_deref())
            .key(key)
            .yang_defaults(self.registry.defaults());
        match self.registry.annotation(&node.template) {
            Some(annotation) => builder.param(annotation),
            None => builder,
        }
    }

    /// Backend key of a node: the key callback, else the path predicates
    ///
    /// An empty key from the callback means the node addresses a whole table.
    /// The second value holds what the key callback staged or flagged.
    fn resolve_key(
        &self,
        req: &RequestContext,
        oper: Operation,
        node: &Node,
        request_uri: &str,
        root: Option<&JsonValue>,
    ) -> XfmrResult<(Option<String>, XfmrOutputs)> {
        if let Some(Xfmr::KeyToDb(f)) = self.registry.get(&node.template, XfmrKind::KeyToDb) {
            let mut builder = self.params(req, oper, node, request_uri, None);
            if let Some(root) = root {
                builder = builder.yg_root_shared(root);
            }
            let mut p = builder.build()?;
            debug!(path = %node.uri, tag = XfmrKind::KeyToDb.tag(), %oper, "invoke");
            let key = f(&mut p)?;
            return Ok(((!key.is_empty()).then_some(key), p.into_outputs()));
        }
        let values = node.path.key_values();
        if values.is_empty() {
            return Ok((None, XfmrOutputs::default()));
        }
        let parts: Vec<&str> = values.iter().map(|(_, v)| v.as_str()).collect();
        Ok((Some(join_key(node.db, &parts)), XfmrOutputs::default()))
    }

    /// Tables a node maps to: the table callback, else the annotation
    fn resolve_tables(
        &self,
        req: &RequestContext,
        oper: Operation,
        node: &Node,
        request_uri: &str,
        key: Option<&str>,
        root: Option<&JsonValue>,
    ) -> XfmrResult<(Vec<String>, XfmrOutputs)> {
        if let Some(Xfmr::Table(f)) = self.registry.get(&node.template, XfmrKind::Table) {
            let mut builder = self.params(req, oper, node, request_uri, key);
            if let Some(root) = root {
                builder = builder.yg_root_shared(root);
            }
            let mut p = builder.build()?;
            debug!(path = %node.uri, tag = XfmrKind::Table.tag(), %oper, "invoke");
            let tables = f(&mut p)?;
            return Ok((tables, p.into_outputs()));
        }
        Ok((node.table.iter().cloned().collect(), XfmrOutputs::default()))
    }

    /// Run the value transformer registered for a field, if any
    fn convert_field(
        &self,
        node: &Node,
        oper: Operation,
        table: &str,
        key: &str,
        field: &str,
        value: &str,
    ) -> XfmrResult<String> {
        let field_template = format!("{}/{}", node.template, field);
        match self.registry.get(&field_template, XfmrKind::Value) {
            Some(Xfmr::Value(v)) => {
                v.call(&XfmrDbParams::new(oper, node.db, table, key, field, value))
            }
            _ => Ok(value.to_string()),
        }
    }
}
