//! Schema path parsing
//!
//! Request URIs address schema nodes with an XPath-like syntax:
//!
//! ```text
//! /openconfig-interfaces:interfaces/interface[name=Ethernet0]/config/mtu
//! /acl/acl-sets/acl-set[name='ACL/1'][type=ACL_IPV4]
//! ```
//!
//! - Segments are separated by `/`; the path must start with `/`.
//! - A segment may carry a `module:` prefix, kept separately from the name.
//! - List instances carry `[key=value]` predicates in declaration order.
//!   Values may be quoted with `'` or `"`; unquoted values run to the
//!   closing `]` and may contain `/`.
//!
//! The *template* of a path drops prefixes and predicates and is the form
//! callbacks are registered against.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{XfmrError, XfmrResult};

/// One step of a schema path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Optional module prefix
    pub module: Option<String>,
    /// Node name
    pub name: String,
    /// List key predicates, in declaration order
    pub keys: Vec<(String, String)>,
}

impl PathSegment {
    /// Segment without module or keys
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: None,
            name: name.into(),
            keys: Vec::new(),
        }
    }

    /// Value of one key predicate
    pub fn key(&self, name: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{}:", module)?;
        }
        f.write_str(&self.name)?;
        for (k, v) in &self.keys {
            match quote_for(v) {
                Some(q) => write!(f, "[{}={}{}{}]", k, q, v, q)?,
                None => write!(f, "[{}={}]", k, v)?,
            }
        }
        Ok(())
    }
}

/// Quote character a predicate value needs to parse back unchanged
///
/// Unquoted values run to the first `]` and must not open with a quote.
/// A value needing quotes that holds both quote characters has no
/// representation; it is written with `'` and will not parse back.
fn quote_for(value: &str) -> Option<char> {
    let needs_quotes = value.contains(']') || value.starts_with(&['\'', '"'][..]);
    if !needs_quotes {
        return None;
    }
    Some(if value.contains('\'') { '"' } else { '\'' })
}

/// Parsed request path
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaPath {
    segments: Vec<PathSegment>,
}

impl SchemaPath {
    /// The root path `/`
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a request URI
    ///
    /// # Errors
    ///
    /// Returns a translation error for a missing leading `/`, empty segments,
    /// a trailing `/`, predicates without `=`, and unterminated predicates
    /// or quotes.
    pub fn parse(input: &str) -> XfmrResult<Self> {
        let fail = |reason: &str| XfmrError::translation(input, reason);

        let rest = input
            .strip_prefix('/')
            .ok_or_else(|| fail("path must start with '/'"))?;
        let mut segments = Vec::new();
        if rest.is_empty() {
            return Ok(Self { segments });
        }

        let chars: Vec<char> = rest.chars().collect();
        let mut i = 0;
        loop {
            let start = i;
            while i < chars.len() && chars[i] != '/' && chars[i] != '[' {
                i += 1;
            }
            let raw: String = chars[start..i].iter().collect();
            let (module, name) = match raw.split_once(':') {
                Some((m, n)) => (Some(m.to_string()), n.to_string()),
                None => (None, raw),
            };
            if name.is_empty() {
                return Err(fail("empty path segment"));
            }

            let mut keys = Vec::new();
            while i < chars.len() && chars[i] == '[' {
                i += 1;
                let key_start = i;
                while i < chars.len() && chars[i] != '=' && chars[i] != ']' {
                    i += 1;
                }
                if i >= chars.len() || chars[i] != '=' {
                    return Err(fail("predicate without '='"));
                }
                let key: String = chars[key_start..i].iter().collect();
                let key = key.trim().to_string();
                if key.is_empty() {
                    return Err(fail("predicate with empty key"));
                }
                i += 1;

                let value: String;
                if i < chars.len() && (chars[i] == '\'' || chars[i] == '"') {
                    let quote = chars[i];
                    i += 1;
                    let value_start = i;
                    while i < chars.len() && chars[i] != quote {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(fail("unterminated quoted value"));
                    }
                    value = chars[value_start..i].iter().collect();
                    i += 1;
                    if i >= chars.len() || chars[i] != ']' {
                        return Err(fail("unterminated predicate"));
                    }
                } else {
                    let value_start = i;
                    while i < chars.len() && chars[i] != ']' {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(fail("unterminated predicate"));
                    }
                    value = chars[value_start..i].iter().collect();
                }
                i += 1;
                keys.push((key, value));
            }

            segments.push(PathSegment { module, name, keys });

            if i >= chars.len() {
                break;
            }
            if chars[i] != '/' {
                return Err(fail("unexpected character after predicate"));
            }
            i += 1;
            if i >= chars.len() {
                return Err(fail("trailing '/'"));
            }
        }

        Ok(Self { segments })
    }

    /// Segments from the root down
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Last segment, `None` for the root
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// True for `/`
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Path without its last segment
    pub fn parent(&self) -> Option<SchemaPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a child segment
    pub fn child(&self, segment: PathSegment) -> SchemaPath {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Path with module prefixes and predicates removed
    pub fn template(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for seg in &self.segments {
            out.push('/');
            out.push_str(&seg.name);
        }
        out
    }

    /// Predicates of the deepest keyed segment
    pub fn key_values(&self) -> &[(String, String)] {
        self.segments
            .iter()
            .rev()
            .find(|seg| !seg.keys.is_empty())
            .map(|seg| seg.keys.as_slice())
            .unwrap_or(&[])
    }

    /// Concrete URI for a registered descendant template
    ///
    /// `/interfaces/interface[name=Ethernet0]` with descendant template
    /// `/interfaces/interface/qos` yields
    /// `/interfaces/interface[name=Ethernet0]/qos`. Returns `None` when the
    /// template is not strictly below this path.
    pub fn descendant_uri(&self, descendant_template: &str) -> Option<String> {
        let own = self.template();
        if !is_descendant_template(&own, descendant_template) {
            return None;
        }
        let suffix = if self.is_root() {
            descendant_template
        } else {
            &descendant_template[own.len()..]
        };
        if self.is_root() {
            Some(suffix.to_string())
        } else {
            Some(format!("{}{}", self, suffix))
        }
    }
}

/// True when `child` names a node strictly below `parent` (template form)
pub fn is_descendant_template(parent: &str, child: &str) -> bool {
    if parent == "/" {
        return child.len() > 1 && child.starts_with('/');
    }
    child.len() > parent.len() && child.starts_with(parent) && child[parent.len()..].starts_with('/')
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{}", seg)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for SchemaPath {
    type Err = XfmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaPath::parse(s)
    }
}
