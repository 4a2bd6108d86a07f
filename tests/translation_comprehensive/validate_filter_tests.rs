//! Validate Filter Tests (Tier 2)
//!
//! A validate callpoint returning false drops its node from the read
//! result. Filtering is not an error.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::test_utils::{eth, port_registry, TestEnv, INTERFACE};
use xfmr::{Db, NodeStatus, Xfmr, XfmrRegistry};

/// Hides management ports, keeps everything else
fn filtering_registry() -> XfmrRegistry {
    let mut registry = port_registry();
    registry
        .register(
            INTERFACE,
            Xfmr::validate(|p| {
                p.path()
                    .last()
                    .and_then(|seg| seg.key("name"))
                    .map_or(true, |name| !name.starts_with("eth"))
            }),
        )
        .unwrap();
    registry
}

fn seeded_env(registry: XfmrRegistry) -> TestEnv {
    let env = TestEnv::new(registry);
    for key in ["Ethernet0", "eth0"] {
        env.config_db()
            .set_entry("PORT", key, [("mtu", "1500")].into_iter().collect())
            .unwrap();
    }
    env
}

#[test]
fn test_false_drops_node_without_error() {
    let env = seeded_env(filtering_registry());
    let d = &env.dispatcher;
    let kept = eth("Ethernet0");
    let hidden = eth("eth0");

    let req = d.begin_request();
    let mut root = json!({});
    let result = d
        .translate_from_db(&req, &[kept.as_str(), hidden.as_str()], &mut root)
        .unwrap();

    assert!(result.is_complete());
    assert!(result.failures().is_empty());
    assert_eq!(result.filtered(), vec![hidden.as_str()]);
    assert!(matches!(result.status(&hidden), Some(NodeStatus::Filtered)));
    assert_eq!(
        root,
        json!({"interfaces": {"interface": [{"name": "Ethernet0", "mtu": "1500"}]}})
    );
}

#[test]
fn test_filter_removes_pre_existing_content() {
    let env = seeded_env(filtering_registry());
    let d = &env.dispatcher;
    let hidden = eth("eth0");

    let req = d.begin_request();
    let mut root = json!({"interfaces": {"interface": [
        {"name": "eth0", "mtu": "stale"},
        {"name": "Ethernet0", "mtu": "1500"}
    ]}});
    d.translate_from_db(&req, &[hidden.as_str()], &mut root)
        .unwrap();
    assert_eq!(
        root,
        json!({"interfaces": {"interface": [{"name": "Ethernet0", "mtu": "1500"}]}})
    );
}

#[test]
fn test_filtered_node_skips_every_other_callback() {
    let reads = Arc::new(AtomicUsize::new(0));
    let mut registry = filtering_registry();
    {
        let reads = Arc::clone(&reads);
        registry
            .register(
                INTERFACE,
                Xfmr::field_to_yang(move |_| {
                    reads.fetch_add(1, Ordering::SeqCst);
                    Ok(Default::default())
                }),
            )
            .unwrap();
    }
    let env = seeded_env(registry);
    let d = &env.dispatcher;

    let req = d.begin_request();
    let mut root = json!({});
    let hidden = eth("eth0");
    let result = d
        .translate_from_db(&req, &[hidden.as_str()], &mut root)
        .unwrap();
    assert!(result.status(&hidden).is_some_and(NodeStatus::is_filtered));
    assert_eq!(reads.load(Ordering::SeqCst), 0);

    let kept = eth("Ethernet0");
    d.translate_from_db(&req, &[kept.as_str()], &mut root)
        .unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}
