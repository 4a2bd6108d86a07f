//! Subscription sessions
//!
//! A [`SubscriptionSession`] drives the two-phase subscription protocol for
//! a set of paths:
//!
//! 1. `translate(uri)` runs TRANSLATE_SUBSCRIBE and records the watch set.
//! 2. `process(uri, changed)` runs PROCESS_SUBSCRIBE after a backend change.
//!
//! Paths whose translation asked for caching (`need_cache`) get the
//! previously cached snapshot instead of the raw change on their next
//! PROCESS call, and the cache is refreshed from that call's output.
//!
//! Paths without a subscribe callback watch their annotated table, keyed by
//! the path predicates or every key (`*`) when the path has none.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};
use xfmr_core::{join_key, DbDataMap, DbValue, SchemaPath, SubscProcType, XfmrError, XfmrResult};

use super::Dispatcher;
use crate::callbacks::{Xfmr, XfmrKind};
use crate::subscribe::{NotificationOpts, XfmrSubscInParams, XfmrSubscOutParams};

const ANY_KEY: &str = "*";

/// Result of translating one subscribed path
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEntry {
    /// Subscribed path
    pub uri: String,
    /// Records to watch
    pub db_data_map: DbDataMap,
    /// PROCESS calls for this path receive the cached snapshot
    pub need_cache: bool,
    /// Notify on every change
    pub on_change: bool,
    /// Requested notification preference
    pub n_opts: Option<NotificationOpts>,
    /// The path has no direct table mapping
    pub is_virtual_tbl: bool,
}

/// Result of processing a change for one path
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    /// Recomputed value
    pub db_data_map: DbDataMap,
    /// The change is visible to the subscriber
    pub on_change: bool,
    /// The path has no direct table mapping
    pub is_virtual_tbl: bool,
}

/// A path excluded from the subscription
///
/// The notification preference set by the callback before it failed is
/// still reported.
#[derive(Debug, Error)]
#[error("subscription to '{uri}' failed: {source}")]
pub struct SubscribeFailure {
    /// Subscribed path
    pub uri: String,
    /// Why the path was excluded
    #[source]
    pub source: XfmrError,
    /// Preference set before the failure
    pub n_opts: Option<NotificationOpts>,
}

#[derive(Debug, Clone)]
struct WatchState {
    watch: DbDataMap,
    need_cache: bool,
    cached: Option<DbDataMap>,
}

/// Subscription state for one subscriber
#[derive(Debug)]
pub struct SubscriptionSession<'d> {
    dispatcher: &'d Dispatcher,
    watched: BTreeMap<String, WatchState>,
}

impl Dispatcher {
    /// Open a subscription session
    pub fn subscription_session(&self) -> SubscriptionSession<'_> {
        SubscriptionSession {
            dispatcher: self,
            watched: BTreeMap::new(),
        }
    }
}

impl<'d> SubscriptionSession<'d> {
    /// Run TRANSLATE_SUBSCRIBE for a path and start watching it
    ///
    /// # Errors
    ///
    /// A failed path is excluded and stops being watched, even if an
    /// earlier call had started watching it. The failure carries any
    /// notification preference the callback set before failing.
    pub fn translate(&mut self, uri: &str) -> Result<WatchEntry, SubscribeFailure> {
        let fail = |source: XfmrError, n_opts| SubscribeFailure {
            uri: uri.to_string(),
            source,
            n_opts,
        };
        let path = SchemaPath::parse(uri).map_err(|e| fail(e, None))?;
        let d = self.dispatcher;

        let out = match d.registry.lookup(&path, XfmrKind::Subscribe) {
            Some(Xfmr::Subscribe(f)) => {
                let empty = DbDataMap::new();
                let input = XfmrSubscInParams {
                    uri,
                    dbs: &d.dbs,
                    db_data_map: &empty,
                    subsc_proc: SubscProcType::TranslateSubscribe,
                };
                let mut out = XfmrSubscOutParams::default();
                debug!(path = uri, tag = XfmrKind::Subscribe.tag(), phase = ?input.subsc_proc, "invoke");
                if let Err(e) = f(&input, &mut out) {
                    warn!(path = uri, error = %e, "subscription path excluded");
                    self.watched.remove(uri);
                    return Err(fail(e, out.n_opts));
                }
                out
            }
            _ => match self.default_watch(&path) {
                Ok(out) => out,
                Err(e) => {
                    warn!(path = uri, error = %e, "subscription path excluded");
                    self.watched.remove(uri);
                    return Err(fail(e, None));
                }
            },
        };

        self.watched.insert(
            uri.to_string(),
            WatchState {
                watch: out.db_data_map.clone(),
                need_cache: out.need_cache,
                cached: out.need_cache.then(|| out.db_data_map.clone()),
            },
        );
        Ok(WatchEntry {
            uri: uri.to_string(),
            db_data_map: out.db_data_map,
            need_cache: out.need_cache,
            on_change: out.on_change,
            n_opts: out.n_opts,
            is_virtual_tbl: out.is_virtual_tbl,
        })
    }

    /// Translate several paths; failures exclude only their own path
    pub fn translate_all(&mut self, uris: &[&str]) -> (Vec<WatchEntry>, Vec<SubscribeFailure>) {
        let mut watched = Vec::new();
        let mut excluded = Vec::new();
        for uri in uris {
            match self.translate(uri) {
                Ok(entry) => watched.push(entry),
                Err(failure) => excluded.push(failure),
            }
        }
        (watched, excluded)
    }

    /// Run PROCESS_SUBSCRIBE for a watched path after a backend change
    ///
    /// # Errors
    ///
    /// Fails when the path is not watched or the callback fails. A failing
    /// callback also removes the path from the watch set; it has to be
    /// translated again before the next PROCESS.
    pub fn process(
        &mut self,
        uri: &str,
        changed: &DbDataMap,
    ) -> Result<ProcessOutcome, SubscribeFailure> {
        let fail = |source: XfmrError, n_opts| SubscribeFailure {
            uri: uri.to_string(),
            source,
            n_opts,
        };
        let Some(state) = self.watched.get(uri).cloned() else {
            return Err(fail(XfmrError::subscription(uri, "path is not subscribed"), None));
        };
        let path = SchemaPath::parse(uri).map_err(|e| fail(e, None))?;
        let d = self.dispatcher;

        let out = match d.registry.lookup(&path, XfmrKind::Subscribe) {
            Some(Xfmr::Subscribe(f)) => {
                let previous = state.cached.clone().unwrap_or_default();
                let input = XfmrSubscInParams {
                    uri,
                    dbs: &d.dbs,
                    db_data_map: if state.need_cache { &previous } else { changed },
                    subsc_proc: SubscProcType::ProcessSubscribe,
                };
                let mut out = XfmrSubscOutParams::default();
                debug!(path = uri, tag = XfmrKind::Subscribe.tag(), phase = ?input.subsc_proc, "invoke");
                if let Err(e) = f(&input, &mut out) {
                    warn!(path = uri, error = %e, "subscription processing failed");
                    self.watched.remove(uri);
                    return Err(fail(e, out.n_opts));
                }
                out
            }
            _ => default_process(&state.watch, changed),
        };

        if state.need_cache {
            if let Some(entry) = self.watched.get_mut(uri) {
                entry.cached = Some(out.db_data_map.clone());
            }
        }
        Ok(ProcessOutcome {
            db_data_map: out.db_data_map,
            on_change: out.on_change,
            is_virtual_tbl: out.is_virtual_tbl,
        })
    }

    /// Snapshot that the next PROCESS call for `uri` will receive
    pub fn cached(&self, uri: &str) -> Option<&DbDataMap> {
        self.watched.get(uri).and_then(|s| s.cached.as_ref())
    }

    /// Check if a path is being watched
    pub fn is_watched(&self, uri: &str) -> bool {
        self.watched.contains_key(uri)
    }

    /// Stop watching a path
    pub fn unsubscribe(&mut self, uri: &str) -> bool {
        self.watched.remove(uri).is_some()
    }

    fn default_watch(&self, path: &SchemaPath) -> XfmrResult<XfmrSubscOutParams> {
        let d = self.dispatcher;
        let node = d.node(path.clone());
        let table = node.table.as_deref().ok_or_else(|| {
            XfmrError::subscription(node.uri.clone(), "no table mapping to watch")
        })?;
        let values = path.key_values();
        let key = if values.is_empty() {
            ANY_KEY.to_string()
        } else {
            let parts: Vec<&str> = values.iter().map(|(_, v)| v.as_str()).collect();
            join_key(node.db, &parts)
        };
        let mut out = XfmrSubscOutParams {
            on_change: true,
            ..Default::default()
        };
        out.db_data_map.insert(node.db, table, key, DbValue::new());
        Ok(out)
    }
}

/// Changed records that fall inside a watch set
fn default_process(watch: &DbDataMap, changed: &DbDataMap) -> XfmrSubscOutParams {
    let mut out = XfmrSubscOutParams::default();
    for (db, table, key, value) in changed.iter() {
        let Some(keys) = watch.table(db, table) else {
            continue;
        };
        if keys.contains_key(ANY_KEY) || keys.contains_key(key) {
            out.db_data_map.insert(db, table, key, value.clone());
        }
    }
    out.on_change = !out.db_data_map.is_empty();
    out
}
