//! Registry Tests (Tier 1)
//!
//! Every (template path, kind) pair holds at most one callback, and the
//! dispatcher invokes exactly that one for any concrete path matching the
//! template.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::test_utils::{eth, port_registry, TestEnv, INTERFACE};
use xfmr::{ErrorKind, Operation, TableMap, Xfmr, XfmrConfig, XfmrKind, XfmrRegistry};

// ============================================================================
// One Callback per Key
// ============================================================================

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut registry = XfmrRegistry::new();
    registry
        .register(INTERFACE, Xfmr::key_to_db(|_| Ok("first".to_string())))
        .unwrap();
    let err = registry
        .register(INTERFACE, Xfmr::key_to_db(|_| Ok("second".to_string())))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_concrete_path_registers_at_its_template() {
    let mut registry = XfmrRegistry::new();
    registry
        .register(&eth("Ethernet0"), Xfmr::key_to_db(|_| Ok("x".to_string())))
        .unwrap();
    assert!(registry.contains(INTERFACE, XfmrKind::KeyToDb));

    // Another instance of the same list is the same key
    let err = registry
        .register(&eth("Ethernet4"), Xfmr::key_to_db(|_| Ok("y".to_string())))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);
}

#[test]
fn test_kinds_coexist_at_one_path() {
    let mut registry = XfmrRegistry::new();
    registry
        .register(INTERFACE, Xfmr::key_to_db(|_| Ok(String::new())))
        .unwrap();
    registry
        .register(INTERFACE, Xfmr::key_to_yang(|_| Ok(Default::default())))
        .unwrap();
    registry
        .register(INTERFACE, Xfmr::validate(|_| true))
        .unwrap();

    let kinds = registry.kinds_at(INTERFACE);
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&XfmrKind::KeyToDb));
    assert!(kinds.contains(&XfmrKind::KeyToYang));
    assert!(kinds.contains(&XfmrKind::Validate));
}

#[test]
fn test_dispatcher_invokes_the_registered_callback_once_per_instance() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = port_registry();
    {
        let calls = Arc::clone(&calls);
        registry
            .register(
                INTERFACE,
                Xfmr::key_to_db(move |p| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(p.path().key_values()[0].1.to_uppercase())
                }),
            )
            .unwrap();
    }
    let env = TestEnv::new(registry);
    let d = &env.dispatcher;

    for name in ["Ethernet0", "Ethernet4"] {
        let req = d.begin_request();
        let payload = json!({"interfaces": {"interface": [{"name": name, "mtu": 1500}]}});
        let t = d
            .translate_to_db(&req, Operation::Update, &eth(name), &payload)
            .unwrap();
        assert!(t
            .data
            .get(xfmr::DbNum::ConfigDb, "PORT", &name.to_uppercase())
            .is_some());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Kind Checks
// ============================================================================

#[test]
fn test_strict_registration_rejects_wrong_kind() {
    let mut registry = XfmrRegistry::new();
    let err = registry
        .register_as(
            INTERFACE,
            XfmrKind::SubtreeToDb,
            Xfmr::post(|_| Ok(TableMap::new())),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);
    assert!(registry.is_empty());
}

#[test]
fn test_lenient_registration_uses_actual_kind() {
    let config = XfmrConfig {
        strict_registration: false,
        ..XfmrConfig::default()
    };
    let mut registry = XfmrRegistry::from_config(&config);
    registry
        .register_as(
            INTERFACE,
            XfmrKind::SubtreeToDb,
            Xfmr::post(|_| Ok(TableMap::new())),
        )
        .unwrap();
    assert!(registry.contains(INTERFACE, XfmrKind::Post));
    assert!(!registry.contains(INTERFACE, XfmrKind::SubtreeToDb));
}

#[test]
fn test_unregister_frees_the_slot() {
    let mut registry = XfmrRegistry::new();
    registry
        .register(INTERFACE, Xfmr::validate(|_| false))
        .unwrap();
    assert!(registry.unregister(INTERFACE, XfmrKind::Validate).is_some());
    registry
        .register(INTERFACE, Xfmr::validate(|_| true))
        .unwrap();
    assert_eq!(registry.len(), 1);
}
