//! Value Transformer Tests (Tier 1)
//!
//! A reversible value transformer registered on a leaf converts the leaf
//! on the way into the backend and back out again, so a write followed by
//! a read returns the schema spelling the client sent.

use proptest::prelude::*;
use serde_json::json;

use crate::test_utils::{eth, interface_payload, port_registry, TestEnv};
use xfmr::{
    Db, DbNum, EnumValueXfmr, ErrorKind, Operation, XfmrDbParams, XfmrKind, XfmrRegistry,
};

const ADMIN_STATUS: &str = "/interfaces/interface/admin_status";

fn admin_status_registry() -> XfmrRegistry {
    let mut registry = port_registry();
    registry
        .register(
            ADMIN_STATUS,
            EnumValueXfmr::new([("UP", "up"), ("DOWN", "down")]).into_xfmr(),
        )
        .unwrap();
    registry
}

// ============================================================================
// Write Path
// ============================================================================

#[test]
fn test_write_stores_backend_token() {
    let env = TestEnv::new(admin_status_registry());
    let d = &env.dispatcher;

    let req = d.begin_request();
    let payload = interface_payload("Ethernet0", &[("admin_status", json!("UP"))]);
    let t = d
        .translate_to_db(&req, Operation::Update, &eth("Ethernet0"), &payload)
        .unwrap();
    d.apply(&t).unwrap();

    let rec = env
        .config_db()
        .get_entry("PORT", "Ethernet0")
        .unwrap()
        .unwrap();
    assert_eq!(rec.get("admin_status"), Some("up"));
}

#[test]
fn test_unknown_token_aborts_write() {
    let env = TestEnv::new(admin_status_registry());
    let d = &env.dispatcher;

    let req = d.begin_request();
    let payload = interface_payload("Ethernet0", &[("admin_status", json!("TESTING"))]);
    let err = d
        .translate_to_db(&req, Operation::Update, &eth("Ethernet0"), &payload)
        .unwrap_err();
    assert_eq!(err.root_cause().kind(), ErrorKind::Translation);
    assert_eq!(err.path(), Some(eth("Ethernet0").as_str()));
    assert_eq!(env.config_db().record_count(), 0);
}

#[test]
fn test_delete_leaves_value_unchanged() {
    let d = TestEnv::new(admin_status_registry()).dispatcher;
    let params = XfmrDbParams::new(
        Operation::Delete,
        DbNum::ConfigDb,
        "PORT",
        "Ethernet0",
        "admin_status",
        "UP",
    );
    assert_eq!(d.transform_value(ADMIN_STATUS, &params).unwrap(), "UP");
}

#[test]
fn test_transform_value_without_registration_is_identity() {
    let d = TestEnv::new(port_registry()).dispatcher;
    let params = XfmrDbParams::new(
        Operation::Update,
        DbNum::ConfigDb,
        "PORT",
        "Ethernet0",
        "mtu",
        "9100",
    );
    assert!(!d
        .registry()
        .contains("/interfaces/interface/mtu", XfmrKind::Value));
    assert_eq!(
        d.transform_value("/interfaces/interface[name=Ethernet0]/mtu", &params)
            .unwrap(),
        "9100"
    );
}

// ============================================================================
// Round Trip
// ============================================================================

#[test]
fn test_read_returns_schema_token() {
    let env = TestEnv::new(admin_status_registry());
    env.config_db()
        .set_entry(
            "PORT",
            "Ethernet0",
            [("admin_status", "down")].into_iter().collect(),
        )
        .unwrap();
    let d = &env.dispatcher;

    let req = d.begin_request();
    let mut root = json!({});
    let result = d
        .translate_from_db(&req, &[eth("Ethernet0").as_str()], &mut root)
        .unwrap();
    assert!(result.is_complete());
    assert_eq!(
        root,
        interface_payload("Ethernet0", &[("admin_status", json!("DOWN"))])
    );
}

proptest! {
    #[test]
    fn prop_write_then_read_returns_client_spelling(
        up in any::<bool>(),
        mtu in 68u32..9217,
        index in 0u32..64,
    ) {
        let env = TestEnv::new(admin_status_registry());
        let d = &env.dispatcher;
        let name = format!("Ethernet{}", index * 4);
        let status = if up { "UP" } else { "DOWN" };
        let uri = eth(&name);

        let req = d.begin_request();
        let payload = interface_payload(
            &name,
            &[("admin_status", json!(status)), ("mtu", json!(mtu))],
        );
        let t = d.translate_to_db(&req, Operation::Update, &uri, &payload).unwrap();
        d.apply(&t).unwrap();

        let req = d.begin_request();
        let mut root = json!({});
        d.translate_from_db(&req, &[uri.as_str()], &mut root).unwrap();

        // Leaves come back as strings
        let expected = interface_payload(
            &name,
            &[("admin_status", json!(status)), ("mtu", json!(mtu.to_string()))],
        );
        prop_assert_eq!(root, expected);
    }
}
