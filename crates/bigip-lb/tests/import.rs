mod common;

use std::sync::Arc;

use bigip_lb::{Node, Pool, PoolMember, Rule};
use bigip_session::constants::procedures;
use bigip_session::testing::FakeDevice;
use bigip_session::{Error, ResourceKind};
use serde_json::{Value, json};

use common::{open, seeded};

fn documents<T: serde::Serialize>(proxies: &[Arc<T>]) -> Value {
    Value::Array(
        proxies
            .iter()
            .map(|p| serde_json::to_value(p.as_ref()).unwrap())
            .collect(),
    )
}

#[test]
fn test_exported_pools_recreate_on_another_device() {
    let source = seeded();
    let exported = open(&source).pools_get(Some("www-1"), false).unwrap();
    let target = FakeDevice::new();
    let lb = open(&target);

    let pools = lb.import::<Pool>(documents(&exported)).unwrap();

    assert_eq!(pools.len(), 1);
    assert!(Arc::ptr_eq(&pools[0], &lb.pool("www-1")));
    assert_eq!(
        target.members("/Common/www-1"),
        [
            ("/Common/10.0.0.1".to_string(), 80),
            ("/Common/10.0.0.2".to_string(), 80)
        ]
    );
    assert_eq!(target.count(procedures::SUBMIT_TRANSACTION), 1);
    assert!(!target.transaction_open());
}

#[test]
fn test_import_failure_rolls_back_batch() {
    let device = seeded();
    let lb = open(&device);

    let err = lb
        .import::<Node>(json!([
            { "name": "/Common/10.0.0.7", "address": "10.0.0.7", "ratio": 2 },
            { "name": "/Common/10.0.0.8", "ratio": 2 },
        ]))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Incomplete {
            kind: ResourceKind::Node,
            field: "address"
        }
    ));
    assert!(!device.contains("LocalLB.NodeAddressV2", "/Common/10.0.0.7"));
    assert_eq!(device.count(procedures::ROLLBACK_TRANSACTION), 1);
    assert_eq!(device.folder(), "/Common");
}

#[test]
fn test_import_updates_existing_rule() {
    let device = seeded();
    let lb = open(&device);
    let held = lb.rule("redirect");

    let rules = lb
        .import::<Rule>(json!([
            { "name": "redirect", "definition": "when HTTP_REQUEST {}", "description": "moved" },
        ]))
        .unwrap();

    assert!(Arc::ptr_eq(&rules[0], &held));
    let attrs = device.attrs("LocalLB.Rule", "/Common/redirect").unwrap();
    assert_eq!(attrs["definition"], json!("when HTTP_REQUEST {}"));
    assert_eq!(attrs["description"], json!("moved"));
}

#[test]
fn test_import_pool_member_attributes() {
    let device = seeded();
    let lb = open(&device);

    lb.import::<PoolMember>(json!([
        { "node": "/Common/10.0.0.1", "port": 80, "pool": "/Common/www-1", "ratio": 3 },
    ]))
    .unwrap();

    let member = lb.pm_get("/Common/10.0.0.1", 80, "www-1").unwrap();
    assert_eq!(member.cached().ratio, Some(3));
}

#[test]
fn test_malformed_documents_make_no_call() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.import::<Pool>(json!({ "name": "web" })).unwrap_err();
    assert!(matches!(err, Error::Document(_)));

    let err = lb.import::<Pool>(json!([{ "description": "no name" }])).unwrap_err();
    assert!(matches!(err, Error::Document(_)));
    assert!(device.calls().is_empty());
}
