//! Callback registry
//!
//! Callbacks are keyed by (template path, kind). Template paths carry no
//! module prefixes or list predicates, so `/interfaces/interface` covers
//! every `interface[name=...]` entry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = XfmrRegistry::new();
//!
//! registry.annotate("/interfaces/interface", DbNum::ConfigDb, Some("PORT"))?;
//! registry.register_as(
//!     "/interfaces/interface",
//!     XfmrKind::KeyToDb,
//!     Xfmr::key_to_db(|p| Ok(p.path().key_values()[0].1.clone())),
//! )?;
//!
//! let key_xfmr = registry.get("/interfaces/interface", XfmrKind::KeyToDb);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};
use xfmr_core::{path::is_descendant_template, DbNum, DbValue, SchemaPath, XfmrError, XfmrResult};

use crate::callbacks::{Xfmr, XfmrKind};
use crate::config::XfmrConfig;

/// Statically known backend location of a schema node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAnnotation {
    /// Partition the node maps to
    pub db: DbNum,
    /// Table the node maps to, when fixed
    pub table: Option<String>,
}

/// Registry of callbacks and node annotations
///
/// Maintains mappings from:
/// - (template path, kind) -> callback
/// - template path -> partition/table annotation
/// - table -> declared default record
pub struct XfmrRegistry {
    callbacks: BTreeMap<(String, XfmrKind), Xfmr>,
    annotations: BTreeMap<String, NodeAnnotation>,
    defaults: BTreeMap<String, DbValue>,
    strict: bool,
}

fn template_of(path: &str) -> XfmrResult<String> {
    Ok(SchemaPath::parse(path)?.template())
}

impl XfmrRegistry {
    /// Create an empty registry that rejects kind mismatches
    pub fn new() -> Self {
        XfmrRegistry {
            callbacks: BTreeMap::new(),
            annotations: BTreeMap::new(),
            defaults: BTreeMap::new(),
            strict: true,
        }
    }

    /// Create an empty registry honouring `strict_registration`
    pub fn from_config(config: &XfmrConfig) -> Self {
        XfmrRegistry {
            strict: config.strict_registration,
            ..Self::new()
        }
    }

    /// Register a callback under its own kind
    ///
    /// # Errors
    ///
    /// Returns a registration error if the path is malformed or a callback
    /// of the same kind is already registered there.
    pub fn register(&mut self, path: &str, xfmr: Xfmr) -> XfmrResult<()> {
        let template = template_of(path)
            .map_err(|e| XfmrError::registration(format!("bad path '{}': {}", path, e)))?;
        let kind = xfmr.kind();
        let slot = (template, kind);
        if self.callbacks.contains_key(&slot) {
            return Err(XfmrError::registration(format!(
                "duplicate {} registration at {}",
                kind.tag(),
                slot.0
            )));
        }
        debug!(path = %slot.0, tag = kind.tag(), "registered xfmr");
        self.callbacks.insert(slot, xfmr);
        Ok(())
    }

    /// Register a callback that must implement `expected`
    ///
    /// A mismatch is a registration error. With `strict_registration`
    /// disabled it is logged and the callback is registered under the kind
    /// it actually implements.
    pub fn register_as(&mut self, path: &str, expected: XfmrKind, xfmr: Xfmr) -> XfmrResult<()> {
        if let Err(e) = xfmr.validate_kind(expected) {
            if self.strict {
                return Err(e);
            }
            warn!(path, expected = expected.tag(), actual = xfmr.tag(), "xfmr kind mismatch");
        }
        self.register(path, xfmr)
    }

    /// Remove a callback
    pub fn unregister(&mut self, path: &str, kind: XfmrKind) -> Option<Xfmr> {
        let template = template_of(path).ok()?;
        self.callbacks.remove(&(template, kind))
    }

    /// Callback registered at a template path
    pub fn get(&self, template: &str, kind: XfmrKind) -> Option<&Xfmr> {
        self.callbacks.get(&(template.to_string(), kind))
    }

    /// Callback for a concrete path
    pub fn lookup(&self, path: &SchemaPath, kind: XfmrKind) -> Option<&Xfmr> {
        self.get(&path.template(), kind)
    }

    /// Check if a callback is registered
    pub fn contains(&self, template: &str, kind: XfmrKind) -> bool {
        self.get(template, kind).is_some()
    }

    /// Kinds registered at a template path
    pub fn kinds_at(&self, template: &str) -> Vec<XfmrKind> {
        self.callbacks
            .keys()
            .filter(|(t, _)| t == template)
            .map(|(_, k)| *k)
            .collect()
    }

    /// Templates strictly below `template` carrying a callback of `kind`,
    /// shallowest first
    pub fn descendants(&self, template: &str, kind: XfmrKind) -> Vec<&str> {
        let mut found: Vec<&str> = self
            .callbacks
            .keys()
            .filter(|(t, k)| *k == kind && is_descendant_template(template, t))
            .map(|(t, _)| t.as_str())
            .collect();
        found.sort_by_key(|t| (t.matches('/').count(), *t));
        found
    }

    /// Record the partition and table a node maps to
    ///
    /// # Errors
    ///
    /// Returns a registration error if the path is malformed.
    pub fn annotate(&mut self, path: &str, db: DbNum, table: Option<&str>) -> XfmrResult<()> {
        let template = template_of(path)
            .map_err(|e| XfmrError::registration(format!("bad path '{}': {}", path, e)))?;
        self.annotations.insert(
            template,
            NodeAnnotation {
                db,
                table: table.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Annotation of a template path
    pub fn annotation(&self, template: &str) -> Option<&NodeAnnotation> {
        self.annotations.get(template)
    }

    /// Declare default fields for a table
    pub fn set_defaults(&mut self, table: impl Into<String>, defaults: DbValue) {
        self.defaults.insert(table.into(), defaults);
    }

    /// Declared defaults, table → record
    pub fn defaults(&self) -> &BTreeMap<String, DbValue> {
        &self.defaults
    }

    /// Get the number of registered callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl Default for XfmrRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for XfmrRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<String> = self
            .callbacks
            .keys()
            .map(|(t, k)| format!("{}#{}", t, k.tag()))
            .collect();
        f.debug_struct("XfmrRegistry")
            .field("callbacks", &slots)
            .field("annotations", &self.annotations.len())
            .field("strict", &self.strict)
            .finish()
    }
}
