//! Value transformers
//!
//! A value transformer converts one field value and sees no schema tree:
//! its whole input is an [`XfmrDbParams`]. [`EnumValueXfmr`] is the
//! built-in reversible token mapping used for enumerations whose schema
//! spelling differs from the backend spelling (`UP` ↔ `up`).

use xfmr_core::{DbNum, Operation, XfmrError, XfmrResult};

use crate::callbacks::Xfmr;

/// Input to a value transformer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XfmrDbParams {
    /// Operation being executed
    pub oper: Operation,
    /// Partition of the field
    pub db_num: DbNum,
    /// Table of the field
    pub table_name: String,
    /// Record key
    pub key: String,
    /// Field name
    pub field_name: String,
    /// Value to convert
    pub value: String,
}

impl XfmrDbParams {
    /// Bundle a field value for conversion
    pub fn new(
        oper: Operation,
        db_num: DbNum,
        table_name: impl Into<String>,
        key: impl Into<String>,
        field_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            oper,
            db_num,
            table_name: table_name.into(),
            key: key.into(),
            field_name: field_name.into(),
            value: value.into(),
        }
    }

    fn location(&self) -> String {
        format!("{}|{}/{}", self.table_name, self.key, self.field_name)
    }
}

/// Bidirectional enumeration token mapping
///
/// Write operations map schema → backend, `Get` maps backend → schema and
/// `Delete` passes the value through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumValueXfmr {
    pairs: Vec<(String, String)>,
}

impl EnumValueXfmr {
    /// Build from `(schema token, backend token)` pairs
    pub fn new<I, S, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(s, d)| (s.into(), d.into()))
                .collect(),
        }
    }

    /// Backend token for a schema token
    pub fn to_db(&self, schema: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(s, _)| s == schema)
            .map(|(_, d)| d.as_str())
    }

    /// Schema token for a backend token
    pub fn to_yang(&self, db: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(_, d)| d == db)
            .map(|(s, _)| s.as_str())
    }

    /// Convert according to the operation
    ///
    /// # Errors
    ///
    /// Returns a translation error for a token outside the mapping.
    pub fn transform(&self, params: &XfmrDbParams) -> XfmrResult<String> {
        let mapped = match params.oper {
            Operation::Delete => return Ok(params.value.clone()),
            Operation::Get => self.to_yang(&params.value),
            Operation::Create | Operation::Replace | Operation::Update => {
                self.to_db(&params.value)
            }
        };
        mapped.map(str::to_string).ok_or_else(|| {
            XfmrError::translation(
                params.location(),
                format!("unknown {} token '{}'", params.oper, params.value),
            )
        })
    }

    /// Wrap as a reversible value callback
    pub fn into_xfmr(self) -> Xfmr {
        Xfmr::value(move |p| self.transform(p), true)
    }
}
