//! Key Translation Scenarios (Tier 2)
//!
//! Schema list keys and backend record keys differ in spelling and shape:
//! - Key callbacks rename list entries in both directions
//! - Default keys join multi-leaf predicates with the partition separator
//! - Reading a whole list enumerates the backend table

use serde_json::json;
use std::collections::BTreeMap;

use crate::test_utils::{eth, interface_payload, port_registry, TestEnv, INTERFACE};
use xfmr::{Db, DbNum, ErrorKind, Operation, Xfmr, XfmrError, XfmrRegistry};

/// `Eth0` in the schema is `Ethernet0` in the backend
fn renaming_registry() -> XfmrRegistry {
    let mut registry = port_registry();
    registry
        .register(
            INTERFACE,
            Xfmr::key_to_db(|p| {
                let Some(name) = p.path().last().and_then(|seg| seg.key("name")) else {
                    return Ok(String::new());
                };
                let index = name
                    .strip_prefix("Eth")
                    .ok_or_else(|| XfmrError::translation(p.uri(), "unsupported interface name"))?;
                Ok(format!("Ethernet{}", index))
            }),
        )
        .unwrap();
    registry
        .register(
            INTERFACE,
            Xfmr::key_to_yang(|p| {
                let key = p.key().unwrap_or_default();
                let index = key.strip_prefix("Ethernet").unwrap_or(key);
                let mut leaves = BTreeMap::new();
                leaves.insert("name".to_string(), json!(format!("Eth{}", index)));
                Ok(leaves)
            }),
        )
        .unwrap();
    registry
}

// ============================================================================
// PORT Round Trip
// ============================================================================

#[test]
fn test_port_entry_round_trip_through_key_callbacks() {
    let env = TestEnv::new(renaming_registry());
    let d = &env.dispatcher;
    let uri = eth("Eth0");

    let req = d.begin_request();
    let payload = interface_payload(
        "Eth0",
        &[("mtu", json!(9100)), ("description", json!("uplink"))],
    );
    let t = d
        .translate_to_db(&req, Operation::Update, &uri, &payload)
        .unwrap();
    let stats = d.apply(&t).unwrap();
    assert_eq!(stats.written, 1);

    let rec = env
        .config_db()
        .get_entry("PORT", "Ethernet0")
        .unwrap()
        .unwrap();
    assert_eq!(rec.get("mtu"), Some("9100"));
    assert_eq!(rec.get("description"), Some("uplink"));
    // Key leaves live in the record key, not in its fields
    assert!(!rec.has("name"));

    let req = d.begin_request();
    let mut root = json!({});
    d.translate_from_db(&req, &[uri.as_str()], &mut root)
        .unwrap();
    assert_eq!(
        root,
        interface_payload(
            "Eth0",
            &[("mtu", json!("9100")), ("description", json!("uplink"))],
        )
    );
}

#[test]
fn test_list_read_enumerates_backend_keys() {
    let env = TestEnv::new(renaming_registry());
    for (key, mtu) in [("Ethernet0", "9100"), ("Ethernet4", "1500")] {
        env.config_db()
            .set_entry("PORT", key, [("mtu", mtu)].into_iter().collect())
            .unwrap();
    }
    let d = &env.dispatcher;

    let req = d.begin_request();
    let mut root = json!({});
    let result = d
        .translate_from_db(&req, &[INTERFACE], &mut root)
        .unwrap();
    assert!(result.is_complete());
    assert_eq!(
        root,
        json!({"interfaces": {"interface": [
            {"name": "Eth0", "mtu": "9100"},
            {"name": "Eth4", "mtu": "1500"}
        ]}})
    );
}

#[test]
fn test_key_callback_error_names_the_path() {
    let env = TestEnv::new(renaming_registry());
    let d = &env.dispatcher;

    let req = d.begin_request();
    let err = d
        .translate_to_db(&req, Operation::Update, &eth("PortChannel1"), &json!({}))
        .unwrap_err();
    assert_eq!(err.root_cause().kind(), ErrorKind::Translation);
    assert!(err.to_string().contains("unsupported interface name"));
    assert_eq!(env.config_db().record_count(), 0);
}

#[test]
fn test_keyless_delete_removes_whole_table() {
    let env = TestEnv::new(renaming_registry());
    for key in ["Ethernet0", "Ethernet4"] {
        env.config_db()
            .set_entry("PORT", key, [("mtu", "9100")].into_iter().collect())
            .unwrap();
    }
    let d = &env.dispatcher;

    let req = d.begin_request();
    let t = d
        .translate_to_db(&req, Operation::Delete, INTERFACE, &json!({}))
        .unwrap();
    let stats = d.apply(&t).unwrap();
    assert_eq!(stats.tables_deleted, 1);
    assert!(env.config_db().get_keys("PORT").unwrap().is_empty());
}

// ============================================================================
// Default Composite Keys
// ============================================================================

#[test]
fn test_default_key_uses_partition_separator() {
    let mut registry = XfmrRegistry::new();
    registry
        .annotate("/acl/rule", DbNum::ConfigDb, Some("ACL_RULE"))
        .unwrap();
    registry
        .annotate("/routes/route", DbNum::ApplDb, Some("ROUTE_TABLE"))
        .unwrap();
    let env = TestEnv::new(registry);
    let d = &env.dispatcher;

    let req = d.begin_request();
    let acl = json!({"acl": {"rule": [
        {"table": "DATAACL", "name": "RULE_1", "priority": 10}
    ]}});
    let t = d
        .translate_to_db(
            &req,
            Operation::Create,
            "/acl/rule[table=DATAACL][name=RULE_1]",
            &acl,
        )
        .unwrap();
    assert_eq!(
        t.data
            .get(DbNum::ConfigDb, "ACL_RULE", "DATAACL|RULE_1")
            .and_then(|r| r.get("priority")),
        Some("10")
    );

    let route = json!({"routes": {"route": [
        {"vrf": "default", "prefix": "10.0.0.0/8", "nexthop": "10.1.1.1"}
    ]}});
    let t = d
        .translate_to_db(
            &req,
            Operation::Update,
            "/routes/route[vrf=default][prefix=10.0.0.0/8]",
            &route,
        )
        .unwrap();
    d.apply(&t).unwrap();
    let rec = env
        .db(DbNum::ApplDb)
        .get_entry("ROUTE_TABLE", "default:10.0.0.0/8")
        .unwrap()
        .unwrap();
    assert_eq!(rec.get("nexthop"), Some("10.1.1.1"));
}
