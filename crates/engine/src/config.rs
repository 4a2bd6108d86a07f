//! Dispatcher configuration via `xfmr.toml`
//!
//! A missing file means defaults. `write_default_if_missing` drops a
//! commented default file next to the caller's other settings; edit it and
//! rebuild the dispatcher to pick up changes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use xfmr_core::{DbNum, XfmrError, XfmrResult};

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "xfmr.toml";

/// How a multi-path read treats per-node failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Failed nodes are reported, the rest of the tree is returned
    #[default]
    Partial,
    /// The first failed node fails the whole read
    AllOrNothing,
}

/// Dispatcher configuration loaded from `xfmr.toml`.
///
/// # Example
///
/// ```toml
/// # Partition used for nodes without an annotation
/// default_db = "CONFIG_DB"
///
/// # "partial" (default) or "all_or_nothing"
/// read_policy = "partial"
///
/// # Reject callbacks registered under the wrong kind
/// strict_registration = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XfmrConfig {
    /// Partition name, e.g. `"CONFIG_DB"`.
    #[serde(default = "default_db_str")]
    pub default_db: String,
    /// Read policy: `"partial"` or `"all_or_nothing"`.
    #[serde(default = "default_read_policy_str")]
    pub read_policy: String,
    /// Reject kind mismatches at registration.
    #[serde(default = "default_strict")]
    pub strict_registration: bool,
}

fn default_db_str() -> String {
    DbNum::ConfigDb.name().to_string()
}

fn default_read_policy_str() -> String {
    "partial".to_string()
}

fn default_strict() -> bool {
    true
}

impl Default for XfmrConfig {
    fn default() -> Self {
        Self {
            default_db: default_db_str(),
            read_policy: default_read_policy_str(),
            strict_registration: default_strict(),
        }
    }
}

impl XfmrConfig {
    /// Parse the default partition name.
    ///
    /// # Errors
    ///
    /// Returns a config error for an unknown partition name.
    pub fn default_db_num(&self) -> XfmrResult<DbNum> {
        self.default_db.parse()
    }

    /// Parse the read policy string.
    ///
    /// # Errors
    ///
    /// Returns a config error if the string is not `"partial"` or
    /// `"all_or_nothing"`.
    pub fn read_policy(&self) -> XfmrResult<ReadPolicy> {
        match self.read_policy.as_str() {
            "partial" => Ok(ReadPolicy::Partial),
            "all_or_nothing" => Ok(ReadPolicy::AllOrNothing),
            other => Err(XfmrError::config(format!(
                "Invalid read policy '{}' in xfmr.toml. Expected \"partial\" or \"all_or_nothing\".",
                other
            ))),
        }
    }

    /// Check every enum-like string.
    pub fn validate(&self) -> XfmrResult<()> {
        self.default_db_num()?;
        self.read_policy()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Translation dispatcher configuration
#
# Partition used for schema nodes without a partition annotation.
# One of APPL_DB, ASIC_DB, COUNTERS_DB, LOGLEVEL_DB, CONFIG_DB,
# FLEX_COUNTER_DB, STATE_DB, SNMP_OVERLAY_DB, ERROR_DB.
default_db = "CONFIG_DB"

# Multi-path reads: "partial" (default) or "all_or_nothing"
#   "partial"        = failed nodes are reported, the rest is returned
#   "all_or_nothing" = the first failed node fails the whole read
read_policy = "partial"

# Reject callbacks registered under a kind they do not implement.
# When false the mismatch is logged and the callback is registered under
# its actual kind.
strict_registration = true
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or holds invalid values.
    pub fn from_toml_str(content: &str) -> XfmrResult<Self> {
        let config: XfmrConfig = toml::from_str(content)
            .map_err(|e| XfmrError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> XfmrResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            XfmrError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: XfmrConfig = toml::from_str(&content).map_err(|e| {
            XfmrError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        // Validate enum-like values eagerly
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> XfmrResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                XfmrError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> XfmrResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| XfmrError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            XfmrError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
