//! Test utilities for translation comprehensive tests
//!
//! Provides a PORT-annotated registry, a dispatcher over fresh in-memory
//! partitions and payload builders for the interface list.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use xfmr::{mem_db_set, DbNum, Dispatcher, JsonValue, MemDb, XfmrRegistry};

/// Interface list template
pub const INTERFACE: &str = "/interfaces/interface";

static INIT_TRACING: Once = Once::new();

/// Route dispatcher logs to the test harness output
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Concrete path of one interface entry
pub fn eth(name: &str) -> String {
    format!("{}[name={}]", INTERFACE, name)
}

/// Registry mapping the interface list to `CONFIG_DB` `PORT`
pub fn port_registry() -> XfmrRegistry {
    let mut registry = XfmrRegistry::new();
    registry
        .annotate(INTERFACE, DbNum::ConfigDb, Some("PORT"))
        .expect("annotate interface list");
    registry
}

/// Dispatcher plus direct handles to every partition
pub struct TestEnv {
    pub dispatcher: Dispatcher,
    pub handles: Vec<Arc<MemDb>>,
}

impl TestEnv {
    pub fn new(registry: XfmrRegistry) -> Self {
        init_tracing();
        let (dbs, handles) = mem_db_set();
        Self {
            dispatcher: Dispatcher::new(Arc::new(registry), dbs),
            handles,
        }
    }

    pub fn db(&self, db: DbNum) -> &MemDb {
        &self.handles[db.index()]
    }

    pub fn config_db(&self) -> &MemDb {
        self.db(DbNum::ConfigDb)
    }
}

/// Payload holding one interface entry with the given leaves
pub fn interface_payload(name: &str, leaves: &[(&str, JsonValue)]) -> JsonValue {
    let mut entry = serde_json::Map::new();
    entry.insert("name".to_string(), JsonValue::String(name.to_string()));
    for (leaf, value) in leaves {
        entry.insert(leaf.to_string(), value.clone());
    }
    serde_json::json!({"interfaces": {"interface": [JsonValue::Object(entry)]}})
}
