//! Read Policy Tests (Tier 2)
//!
//! A multi-path read either reports per-node failures next to the nodes it
//! could populate (`partial`), or fails on the first node
//! (`all_or_nothing`).

use serde_json::json;
use std::sync::Arc;

use crate::test_utils::{eth, init_tracing, interface_payload, port_registry};
use xfmr::{
    mem_db_set, Db, DbNum, Dispatcher, ErrorKind, ReadPolicy, Xfmr, XfmrConfig, XfmrError,
    XfmrRegistry,
};

fn dispatcher(read_policy: &str) -> Dispatcher {
    init_tracing();
    let config = XfmrConfig::from_toml_str(&format!("read_policy = \"{}\"\n", read_policy))
        .unwrap();
    let (dbs, handles) = mem_db_set();
    handles[DbNum::ConfigDb.index()]
        .set_entry("PORT", "Ethernet0", [("mtu", "9100")].into_iter().collect())
        .unwrap();
    Dispatcher::with_config(Arc::new(port_registry()), dbs, config).unwrap()
}

#[test]
fn test_partial_policy_returns_what_it_can() {
    let d = dispatcher("partial");
    assert_eq!(d.config().read_policy().unwrap(), ReadPolicy::Partial);

    let req = d.begin_request();
    let mut root = json!({});
    let good = eth("Ethernet0");
    let missing = eth("Ethernet4");
    let result = d
        .translate_from_db(&req, &[good.as_str(), missing.as_str()], &mut root)
        .unwrap();

    assert!(!result.is_complete());
    assert_eq!(result.populated(), vec![good.as_str()]);
    let failures = result.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, missing.as_str());
    assert!(matches!(
        failures[0].1.root_cause(),
        XfmrError::BackendMismatch { .. }
    ));
    assert_eq!(root, interface_payload("Ethernet0", &[("mtu", json!("9100"))]));
}

#[test]
fn test_all_or_nothing_policy_fails_the_read() {
    let d = dispatcher("all_or_nothing");

    let req = d.begin_request();
    let mut root = json!({});
    let missing = eth("Ethernet4");
    let err = d
        .translate_from_db(&req, &[eth("Ethernet0").as_str(), missing.as_str()], &mut root)
        .unwrap_err();
    assert_eq!(err.path(), Some(missing.as_str()));
    assert_eq!(err.root_cause().kind(), ErrorKind::BackendMismatch);
}

#[test]
fn test_unknown_policy_is_config_error() {
    let err = XfmrConfig::from_toml_str("read_policy = \"best_effort\"\n").unwrap_err();
    assert!(matches!(err, XfmrError::Config { .. }));
    assert!(err.to_string().contains("best_effort"));
}

#[test]
fn test_default_db_routes_unannotated_nodes() {
    init_tracing();
    let config = XfmrConfig::from_toml_str("default_db = \"STATE_DB\"\n").unwrap();
    let mut registry = XfmrRegistry::new();
    registry
        .register(
            "/system/state",
            Xfmr::table(|_| Ok(vec!["DEVICE_METADATA".to_string()])),
        )
        .unwrap();
    registry
        .register(
            "/system/state",
            Xfmr::key_to_db(|_| Ok("localhost".to_string())),
        )
        .unwrap();
    let (dbs, handles) = mem_db_set();
    handles[DbNum::StateDb.index()]
        .set_entry(
            "DEVICE_METADATA",
            "localhost",
            [("hostname", "sonic")].into_iter().collect(),
        )
        .unwrap();
    let d = Dispatcher::with_config(Arc::new(registry), dbs, config).unwrap();

    let req = d.begin_request();
    let mut root = json!({});
    d.translate_from_db(&req, &["/system/state"], &mut root)
        .unwrap();
    assert_eq!(root, json!({"system": {"state": {"hostname": "sonic"}}}));
}
