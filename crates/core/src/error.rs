//! Error types for the translation core
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! A `false` return from a validate callpoint is deliberately NOT an error:
//! it is a filter signal and is reported by the read path as a filtered node.

use crate::types::DbNum;
use thiserror::Error;

/// Result type alias for translation operations
pub type XfmrResult<T> = std::result::Result<T, XfmrError>;

/// Coarse classification of an [`XfmrError`]
///
/// | Kind | Raised by |
/// |------|-----------|
/// | `Translation` | malformed path, unresolvable key, bad value token |
/// | `BackendMismatch` | table/key absent when a record was expected |
/// | `Subscription` | watch set could not be computed |
/// | `Action` | RPC callpoint failure or cancellation |
/// | `Registration` | capability tag mismatch, duplicate registration |
/// | `Internal` | parameter type mismatch, storage and config failures |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed path, unresolvable key
    Translation,
    /// Table/key not found when expected
    BackendMismatch,
    /// Unable to compute a watch set
    Subscription,
    /// RPC callpoint failure
    Action,
    /// Callback registration rejected
    Registration,
    /// Everything else
    Internal,
}

/// Error types for the translation core
#[derive(Debug, Error)]
pub enum XfmrError {
    /// Path or key could not be translated
    #[error("translation error at '{path}': {reason}")]
    Translation {
        /// Schema path being translated
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Expected backend record is missing
    #[error("backend mismatch: {table}|{key} not found in {db}")]
    BackendMismatch {
        /// Partition searched
        db: DbNum,
        /// Table searched
        table: String,
        /// Key searched
        key: String,
    },

    /// Subscription watch set could not be computed
    #[error("subscription error at '{path}': {reason}")]
    Subscription {
        /// Subscribed path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Action callpoint failed
    #[error("action error at '{path}': {reason}")]
    Action {
        /// Action path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Callback registration rejected
    #[error("registration error: {reason}")]
    Registration {
        /// What went wrong
        reason: String,
    },

    /// Opaque callback parameter had an unexpected type
    #[error("parameter type mismatch: expected {expected}")]
    ParamMismatch {
        /// Type name the callback asked for
        expected: &'static str,
    },

    /// Callback observed cancellation
    #[error("cancelled: {reason}")]
    Cancelled {
        /// Cancellation cause
        reason: String,
    },

    /// Partition handle failure
    #[error("storage error: {reason}")]
    Storage {
        /// What went wrong
        reason: String,
    },

    /// Configuration could not be read or parsed
    #[error("config error: {reason}")]
    Config {
        /// What went wrong
        reason: String,
    },

    /// Error raised while translating a specific path
    #[error("{source} (path: {path})")]
    AtPath {
        /// Failing request path
        path: String,
        /// Underlying error
        #[source]
        source: Box<XfmrError>,
    },
}

impl XfmrError {
    /// Build a translation error
    pub fn translation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        XfmrError::Translation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a backend mismatch error
    pub fn backend_mismatch(db: DbNum, table: impl Into<String>, key: impl Into<String>) -> Self {
        XfmrError::BackendMismatch {
            db,
            table: table.into(),
            key: key.into(),
        }
    }

    /// Build a subscription error
    pub fn subscription(path: impl Into<String>, reason: impl Into<String>) -> Self {
        XfmrError::Subscription {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build an action error
    pub fn action(path: impl Into<String>, reason: impl Into<String>) -> Self {
        XfmrError::Action {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a registration error
    pub fn registration(reason: impl Into<String>) -> Self {
        XfmrError::Registration {
            reason: reason.into(),
        }
    }

    /// Build a storage error
    pub fn storage(reason: impl Into<String>) -> Self {
        XfmrError::Storage {
            reason: reason.into(),
        }
    }

    /// Build a config error
    pub fn config(reason: impl Into<String>) -> Self {
        XfmrError::Config {
            reason: reason.into(),
        }
    }

    /// Attach the failing request path
    ///
    /// Errors that already carry a path (wrapped or intrinsic) are returned
    /// unchanged, so the innermost path wins.
    pub fn at_path(self, path: impl Into<String>) -> Self {
        if self.path().is_some() {
            return self;
        }
        XfmrError::AtPath {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Path associated with this error, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            XfmrError::Translation { path, .. }
            | XfmrError::Subscription { path, .. }
            | XfmrError::Action { path, .. }
            | XfmrError::AtPath { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            XfmrError::Translation { .. } => ErrorKind::Translation,
            XfmrError::BackendMismatch { .. } => ErrorKind::BackendMismatch,
            XfmrError::Subscription { .. } => ErrorKind::Subscription,
            XfmrError::Action { .. } | XfmrError::Cancelled { .. } => ErrorKind::Action,
            XfmrError::Registration { .. } => ErrorKind::Registration,
            XfmrError::ParamMismatch { .. }
            | XfmrError::Storage { .. }
            | XfmrError::Config { .. } => ErrorKind::Internal,
            XfmrError::AtPath { source, .. } => source.kind(),
        }
    }

    /// Innermost error, skipping path wrappers
    pub fn root_cause(&self) -> &XfmrError {
        match self {
            XfmrError::AtPath { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
