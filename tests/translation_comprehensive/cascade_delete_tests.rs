//! Cascade Delete Tests (Tier 1)
//!
//! Tables declared for cascade deletion by any callback of a DELETE are
//! collected once per (partition, table, key) and removed on apply:
//! - A subtree DELETE that returns nothing still removes dependent records
//! - Overlapping declarations from nested callbacks are deduplicated
//! - Declarations outside DELETE are ignored
//! - A parent DELETE reaches every stored instance of a keyed child

use proptest::prelude::*;
use serde_json::json;

use crate::test_utils::{eth, TestEnv, INTERFACE};
use xfmr::{Db, DbNum, Operation, TableMap, Xfmr, XfmrRegistry};

fn seed(env: &TestEnv) {
    let config = env.config_db();
    for (table, key) in [
        ("PORT_QOS_MAP", "Ethernet0"),
        ("PORT_TABLE", "Ethernet0"),
        ("QUEUE", "Ethernet0"),
        ("PORT_QOS_MAP", "Ethernet4"),
    ] {
        config
            .set_entry(table, key, [("profile", "default")].into_iter().collect())
            .unwrap();
    }
}

fn cascading_registry(tables: &'static [&'static str]) -> XfmrRegistry {
    let mut registry = XfmrRegistry::new();
    registry
        .register(
            INTERFACE,
            Xfmr::subtree_to_db(move |p| {
                for table in tables {
                    p.add_cascade_delete_table(*table);
                }
                Ok(TableMap::new())
            }),
        )
        .unwrap();
    registry
}

// ============================================================================
// Subtree DELETE
// ============================================================================

#[test]
fn test_subtree_delete_removes_declared_tables() {
    let env = TestEnv::new(cascading_registry(&["PORT_QOS_MAP", "PORT_TABLE"]));
    seed(&env);
    let d = &env.dispatcher;

    let req = d.begin_request();
    let t = d
        .translate_to_db(&req, Operation::Delete, &eth("Ethernet0"), &json!({}))
        .unwrap();
    assert!(t.data.is_empty());
    assert_eq!(t.cascade.tables(), vec!["PORT_QOS_MAP", "PORT_TABLE"]);

    let stats = d.apply(&t).unwrap();
    assert_eq!(stats.cascade_deleted, 2);

    let config = env.config_db();
    assert!(config.get_entry("PORT_QOS_MAP", "Ethernet0").unwrap().is_none());
    assert!(config.get_entry("PORT_TABLE", "Ethernet0").unwrap().is_none());
    // Other keys and undeclared tables survive
    assert!(config.get_entry("PORT_QOS_MAP", "Ethernet4").unwrap().is_some());
    assert!(config.get_entry("QUEUE", "Ethernet0").unwrap().is_some());
}

#[test]
fn test_nested_declarations_are_deduplicated() {
    let mut registry = cascading_registry(&["PORT_QOS_MAP", "PORT_TABLE"]);
    registry
        .register(
            "/interfaces/interface/qos",
            Xfmr::subtree_to_db(|p| {
                p.add_cascade_delete_table("PORT_QOS_MAP");
                p.add_cascade_delete_table("QUEUE");
                Ok(TableMap::new())
            }),
        )
        .unwrap();
    let env = TestEnv::new(registry);
    seed(&env);
    let d = &env.dispatcher;

    let req = d.begin_request();
    let t = d
        .translate_to_db(&req, Operation::Delete, &eth("Ethernet0"), &json!({}))
        .unwrap();
    assert_eq!(t.cascade.len(), 3);
    assert_eq!(t.cascade.tables(), vec!["PORT_QOS_MAP", "PORT_TABLE", "QUEUE"]);
    assert!(t.cascade.iter().all(|c| c.db == DbNum::ConfigDb && c.key == "Ethernet0"));

    let stats = d.apply(&t).unwrap();
    assert_eq!(stats.cascade_deleted, 3);
    assert_eq!(env.config_db().record_count(), 1);
}

#[test]
fn test_missing_records_are_not_counted() {
    let env = TestEnv::new(cascading_registry(&["PORT_QOS_MAP", "PORT_TABLE"]));
    let d = &env.dispatcher;

    let req = d.begin_request();
    let t = d
        .translate_to_db(&req, Operation::Delete, &eth("Ethernet8"), &json!({}))
        .unwrap();
    assert_eq!(t.cascade.len(), 2);
    assert_eq!(d.apply(&t).unwrap().cascade_deleted, 0);
}

#[test]
fn test_declarations_outside_delete_are_ignored() {
    let env = TestEnv::new(cascading_registry(&["PORT_QOS_MAP"]));
    seed(&env);
    let d = &env.dispatcher;

    let req = d.begin_request();
    let payload = json!({"interfaces": {"interface": [{"name": "Ethernet0"}]}});
    let t = d
        .translate_to_db(&req, Operation::Update, &eth("Ethernet0"), &payload)
        .unwrap();
    assert!(t.cascade.is_empty());

    d.apply(&t).unwrap();
    assert!(env
        .config_db()
        .get_entry("PORT_QOS_MAP", "Ethernet0")
        .unwrap()
        .is_some());
}

// ============================================================================
// Parent DELETE
// ============================================================================

#[test]
fn test_parent_delete_runs_child_once_per_stored_key() {
    let mut registry = cascading_registry(&["PORT_QOS_MAP"]);
    registry
        .annotate(INTERFACE, DbNum::ConfigDb, Some("PORT"))
        .unwrap();
    let env = TestEnv::new(registry);
    seed(&env);
    for key in ["Ethernet0", "Ethernet4"] {
        env.config_db()
            .set_entry("PORT", key, [("mtu", "9100")].into_iter().collect())
            .unwrap();
    }
    let d = &env.dispatcher;

    let req = d.begin_request();
    let t = d
        .translate_to_db(&req, Operation::Delete, "/interfaces", &json!({}))
        .unwrap();
    let keys: Vec<&str> = t.cascade.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["Ethernet0", "Ethernet4"]);
    assert_eq!(t.cascade.tables(), vec!["PORT_QOS_MAP"]);

    let stats = d.apply(&t).unwrap();
    assert_eq!(stats.cascade_deleted, 2);
    assert!(env.config_db().get_keys("PORT_QOS_MAP").unwrap().is_empty());
    assert!(env.config_db().get_entry("QUEUE", "Ethernet0").unwrap().is_some());
}

#[test]
fn test_parent_delete_without_child_table_clears_declared_tables() {
    let mut registry = cascading_registry(&["PORT_QOS_MAP"]);
    registry
        .annotate("/interfaces", DbNum::ConfigDb, None)
        .unwrap();
    let env = TestEnv::new(registry);
    seed(&env);
    let d = &env.dispatcher;

    let req = d.begin_request();
    let t = d
        .translate_to_db(&req, Operation::Delete, "/interfaces", &json!({}))
        .unwrap();
    assert!(t.cascade.is_empty());
    assert!(t
        .data
        .table(DbNum::ConfigDb, "PORT_QOS_MAP")
        .is_some_and(|keys| keys.is_empty()));

    let stats = d.apply(&t).unwrap();
    assert_eq!(stats.tables_deleted, 1);
    let config = env.config_db();
    assert!(config.get_keys("PORT_QOS_MAP").unwrap().is_empty());
    assert!(config.get_entry("PORT_TABLE", "Ethernet0").unwrap().is_some());
    assert!(config.get_entry("QUEUE", "Ethernet0").unwrap().is_some());
}

// ============================================================================
// Dedup Property
// ============================================================================

proptest! {
    #[test]
    fn prop_cascade_set_keeps_first_declaration_order(
        picks in prop::collection::vec(0usize..4, 0..16),
    ) {
        const TABLES: [&str; 4] = ["PORT_QOS_MAP", "PORT_TABLE", "QUEUE", "BUFFER_PG"];
        let declared: Vec<&'static str> = picks.iter().map(|i| TABLES[*i]).collect();

        let mut expected: Vec<&str> = Vec::new();
        for table in &declared {
            if !expected.contains(table) {
                expected.push(table);
            }
        }

        let mut registry = XfmrRegistry::new();
        let tables = declared.clone();
        registry
            .register(
                INTERFACE,
                Xfmr::subtree_to_db(move |p| {
                    for table in &tables {
                        p.add_cascade_delete_table(*table);
                    }
                    Ok(TableMap::new())
                }),
            )
            .unwrap();
        let env = TestEnv::new(registry);
        let d = &env.dispatcher;

        let req = d.begin_request();
        let t = d
            .translate_to_db(&req, Operation::Delete, &eth("Ethernet0"), &json!({}))
            .unwrap();
        prop_assert_eq!(t.cascade.len(), expected.len());
        prop_assert_eq!(t.cascade.tables(), expected);
    }
}
