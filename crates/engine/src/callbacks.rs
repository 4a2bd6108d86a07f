//! Callback kinds
//!
//! Every callback a schema node can carry is one variant of the closed sum
//! type [`Xfmr`]. Each variant wraps a shared closure with the signature of
//! its kind; the dispatcher pattern-matches on the variant, so a callback
//! can never be invoked through the wrong signature.
//!
//! Each kind has a descriptive capability tag (`"KeyXfmrYangToDb"`, ...).
//! [`Xfmr::validate_kind`] logs that tag and rejects a callback registered
//! under a kind it does not implement.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use xfmr_core::{DbSet, JsonValue, TableMap, XfmrError, XfmrResult};

use crate::params::XfmrParams;
use crate::subscribe::{XfmrSubscInParams, XfmrSubscOutParams};
use crate::value_xfmr::XfmrDbParams;

/// Schema key → composite backend key
pub type KeyXfmrYangToDb = Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<String> + Send + Sync>;
/// Backend key → schema key leaves
pub type KeyXfmrDbToYang =
    Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<BTreeMap<String, JsonValue>> + Send + Sync>;
/// Schema leaves → backend fields
pub type FieldXfmrYangToDb =
    Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<BTreeMap<String, String>> + Send + Sync>;
/// Backend fields → schema leaves
pub type FieldXfmrDbToYang =
    Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<BTreeMap<String, JsonValue>> + Send + Sync>;
/// Whole subtree → backend tables
pub type SubTreeXfmrYangToDb =
    Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<TableMap> + Send + Sync>;
/// Backend → whole subtree, written into the schema root
pub type SubTreeXfmrDbToYang = Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<()> + Send + Sync>;
/// Subscription translation and processing
pub type SubTreeXfmrSubscribe = Arc<
    dyn Fn(&XfmrSubscInParams<'_>, &mut XfmrSubscOutParams) -> XfmrResult<()> + Send + Sync,
>;
/// Dynamic table selection
pub type TableXfmrFunc = Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<Vec<String>> + Send + Sync>;
/// Single field value conversion
pub type ValueXfmrFunc = Arc<dyn Fn(&XfmrDbParams) -> XfmrResult<String> + Send + Sync>;
/// Hook run before the primary operation
pub type PreXfmrFunc = Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<()> + Send + Sync>;
/// Hook run after the primary operation, returning extra writes
pub type PostXfmrFunc = Arc<dyn Fn(&mut XfmrParams<'_>) -> XfmrResult<TableMap> + Send + Sync>;
/// Action handler: request body → response body
pub type RpcCallpoint = Arc<dyn Fn(&[u8], &DbSet) -> XfmrResult<Vec<u8>> + Send + Sync>;
/// Read-path filter; `false` drops the node without error
pub type ValidateCallpoint = Arc<dyn Fn(&mut XfmrParams<'_>) -> bool + Send + Sync>;

/// Which way data flows through a callback kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Schema tree → backend
    YangToDb,
    /// Backend → schema tree
    DbToYang,
    /// Operates on one field, both ways
    FieldLocal,
    /// Action invocation
    Action,
    /// Subscription phases
    Subscribe,
}

/// Tag of an [`Xfmr`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XfmrKind {
    /// Key schema→backend
    KeyToDb,
    /// Key backend→schema
    KeyToYang,
    /// Field schema→backend
    FieldToDb,
    /// Field backend→schema
    FieldToYang,
    /// Subtree schema→backend
    SubtreeToDb,
    /// Subtree backend→schema
    SubtreeToYang,
    /// Subscription
    Subscribe,
    /// Table selection
    Table,
    /// Value conversion
    Value,
    /// Pre-hook
    Pre,
    /// Post-hook
    Post,
    /// Action
    Rpc,
    /// Read filter
    Validate,
}

impl XfmrKind {
    /// All kinds, in declaration order
    pub const ALL: [XfmrKind; 13] = [
        XfmrKind::KeyToDb,
        XfmrKind::KeyToYang,
        XfmrKind::FieldToDb,
        XfmrKind::FieldToYang,
        XfmrKind::SubtreeToDb,
        XfmrKind::SubtreeToYang,
        XfmrKind::Subscribe,
        XfmrKind::Table,
        XfmrKind::Value,
        XfmrKind::Pre,
        XfmrKind::Post,
        XfmrKind::Rpc,
        XfmrKind::Validate,
    ];

    /// Capability tag
    pub fn tag(self) -> &'static str {
        match self {
            XfmrKind::KeyToDb => "KeyXfmrYangToDb",
            XfmrKind::KeyToYang => "KeyXfmrDbToYang",
            XfmrKind::FieldToDb => "FieldXfmrYangToDb",
            XfmrKind::FieldToYang => "FieldXfmrDbtoYang",
            XfmrKind::SubtreeToDb => "SubTreeXfmrYangToDb",
            XfmrKind::SubtreeToYang => "SubTreeXfmrDbToYang",
            XfmrKind::Subscribe => "SubTreeXfmrSubscribe",
            XfmrKind::Table => "TableXfmrFunc",
            XfmrKind::Value => "ValueXfmrFunc",
            XfmrKind::Pre => "PreXfmrFunc",
            XfmrKind::Post => "PostXfmrFunc",
            XfmrKind::Rpc => "RpcCallpoint",
            XfmrKind::Validate => "ValidateCallpoint",
        }
    }

    /// Data direction of this kind
    pub fn direction(self) -> Direction {
        match self {
            XfmrKind::KeyToDb
            | XfmrKind::FieldToDb
            | XfmrKind::SubtreeToDb
            | XfmrKind::Table
            | XfmrKind::Pre
            | XfmrKind::Post => Direction::YangToDb,
            XfmrKind::KeyToYang
            | XfmrKind::FieldToYang
            | XfmrKind::SubtreeToYang
            | XfmrKind::Validate => Direction::DbToYang,
            XfmrKind::Value => Direction::FieldLocal,
            XfmrKind::Rpc => Direction::Action,
            XfmrKind::Subscribe => Direction::Subscribe,
        }
    }
}

impl fmt::Display for XfmrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Value transformer plus its reversibility
///
/// A reversible transformer satisfies `to_yang(to_db(v)) == v`.
#[derive(Clone)]
pub struct ValueXfmr {
    func: ValueXfmrFunc,
    reversible: bool,
}

impl ValueXfmr {
    /// Run the transformation
    pub fn call(&self, params: &XfmrDbParams) -> XfmrResult<String> {
        (self.func)(params)
    }

    /// True when backend→schema inverts schema→backend
    pub fn is_reversible(&self) -> bool {
        self.reversible
    }
}

impl fmt::Debug for ValueXfmr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueXfmr")
            .field("reversible", &self.reversible)
            .finish()
    }
}

/// A registered callback
#[derive(Clone)]
pub enum Xfmr {
    /// See [`KeyXfmrYangToDb`]
    KeyToDb(KeyXfmrYangToDb),
    /// See [`KeyXfmrDbToYang`]
    KeyToYang(KeyXfmrDbToYang),
    /// See [`FieldXfmrYangToDb`]
    FieldToDb(FieldXfmrYangToDb),
    /// See [`FieldXfmrDbToYang`]
    FieldToYang(FieldXfmrDbToYang),
    /// See [`SubTreeXfmrYangToDb`]
    SubtreeToDb(SubTreeXfmrYangToDb),
    /// See [`SubTreeXfmrDbToYang`]
    SubtreeToYang(SubTreeXfmrDbToYang),
    /// See [`SubTreeXfmrSubscribe`]
    Subscribe(SubTreeXfmrSubscribe),
    /// See [`TableXfmrFunc`]
    Table(TableXfmrFunc),
    /// See [`ValueXfmr`]
    Value(ValueXfmr),
    /// See [`PreXfmrFunc`]
    Pre(PreXfmrFunc),
    /// See [`PostXfmrFunc`]
    Post(PostXfmrFunc),
    /// See [`RpcCallpoint`]
    Rpc(RpcCallpoint),
    /// See [`ValidateCallpoint`]
    Validate(ValidateCallpoint),
}

impl Xfmr {
    /// Wrap a key schema→backend closure
    pub fn key_to_db<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<String> + Send + Sync + 'static,
    {
        Xfmr::KeyToDb(Arc::new(f))
    }

    /// Wrap a key backend→schema closure
    pub fn key_to_yang<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<BTreeMap<String, JsonValue>>
            + Send
            + Sync
            + 'static,
    {
        Xfmr::KeyToYang(Arc::new(f))
    }

    /// Wrap a field schema→backend closure
    pub fn field_to_db<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<BTreeMap<String, String>>
            + Send
            + Sync
            + 'static,
    {
        Xfmr::FieldToDb(Arc::new(f))
    }

    /// Wrap a field backend→schema closure
    pub fn field_to_yang<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<BTreeMap<String, JsonValue>>
            + Send
            + Sync
            + 'static,
    {
        Xfmr::FieldToYang(Arc::new(f))
    }

    /// Wrap a subtree schema→backend closure
    pub fn subtree_to_db<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<TableMap> + Send + Sync + 'static,
    {
        Xfmr::SubtreeToDb(Arc::new(f))
    }

    /// Wrap a subtree backend→schema closure
    pub fn subtree_to_yang<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<()> + Send + Sync + 'static,
    {
        Xfmr::SubtreeToYang(Arc::new(f))
    }

    /// Wrap a subscription closure
    pub fn subscribe<F>(f: F) -> Self
    where
        F: Fn(&XfmrSubscInParams<'_>, &mut XfmrSubscOutParams) -> XfmrResult<()>
            + Send
            + Sync
            + 'static,
    {
        Xfmr::Subscribe(Arc::new(f))
    }

    /// Wrap a table selection closure
    pub fn table<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<Vec<String>> + Send + Sync + 'static,
    {
        Xfmr::Table(Arc::new(f))
    }

    /// Wrap a value conversion closure
    pub fn value<F>(f: F, reversible: bool) -> Self
    where
        F: Fn(&XfmrDbParams) -> XfmrResult<String> + Send + Sync + 'static,
    {
        Xfmr::Value(ValueXfmr {
            func: Arc::new(f),
            reversible,
        })
    }

    /// Wrap a pre-hook closure
    pub fn pre<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<()> + Send + Sync + 'static,
    {
        Xfmr::Pre(Arc::new(f))
    }

    /// Wrap a post-hook closure
    pub fn post<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> XfmrResult<TableMap> + Send + Sync + 'static,
    {
        Xfmr::Post(Arc::new(f))
    }

    /// Wrap an action closure
    pub fn rpc<F>(f: F) -> Self
    where
        F: Fn(&[u8], &DbSet) -> XfmrResult<Vec<u8>> + Send + Sync + 'static,
    {
        Xfmr::Rpc(Arc::new(f))
    }

    /// Wrap a read-filter closure
    pub fn validate<F>(f: F) -> Self
    where
        F: Fn(&mut XfmrParams<'_>) -> bool + Send + Sync + 'static,
    {
        Xfmr::Validate(Arc::new(f))
    }

    /// Kind of this callback
    pub fn kind(&self) -> XfmrKind {
        match self {
            Xfmr::KeyToDb(_) => XfmrKind::KeyToDb,
            Xfmr::KeyToYang(_) => XfmrKind::KeyToYang,
            Xfmr::FieldToDb(_) => XfmrKind::FieldToDb,
            Xfmr::FieldToYang(_) => XfmrKind::FieldToYang,
            Xfmr::SubtreeToDb(_) => XfmrKind::SubtreeToDb,
            Xfmr::SubtreeToYang(_) => XfmrKind::SubtreeToYang,
            Xfmr::Subscribe(_) => XfmrKind::Subscribe,
            Xfmr::Table(_) => XfmrKind::Table,
            Xfmr::Value(_) => XfmrKind::Value,
            Xfmr::Pre(_) => XfmrKind::Pre,
            Xfmr::Post(_) => XfmrKind::Post,
            Xfmr::Rpc(_) => XfmrKind::Rpc,
            Xfmr::Validate(_) => XfmrKind::Validate,
        }
    }

    /// Capability tag of this callback
    pub fn tag(&self) -> &'static str {
        self.kind().tag()
    }

    /// Check that this callback implements `expected`
    ///
    /// # Errors
    ///
    /// Returns a registration error naming both tags on mismatch.
    pub fn validate_kind(&self, expected: XfmrKind) -> XfmrResult<()> {
        tracing::debug!(tag = self.tag(), expected = expected.tag(), "xfmr interface validate");
        if self.kind() == expected {
            Ok(())
        } else {
            Err(XfmrError::registration(format!(
                "expected {} but callback implements {}",
                expected.tag(),
                self.tag()
            )))
        }
    }
}

impl fmt::Debug for Xfmr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Xfmr").field(&self.tag()).finish()
    }
}
