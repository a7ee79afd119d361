mod common;

use std::sync::Arc;

use bigip_lb::constants::node;
use bigip_lb::{Node, Resource};
use bigip_session::constants::procedures;
use bigip_session::{Error, ResourceKind};
use serde_json::json;

use common::{open, seeded};

const NODE: &str = "LocalLB.NodeAddressV2";

#[test]
fn test_node_get_loads_attributes() {
    let device = seeded();
    let lb = open(&device);

    let node = lb.node_get("10.0.0.1").unwrap();

    let cached = node.cached();
    assert_eq!(cached.address.as_deref(), Some("10.0.0.1"));
    assert_eq!(cached.ratio, Some(1));
    assert_eq!(cached.dynamic_ratio, Some(1));
    assert_eq!(cached.enabled, Some(true));
    assert!(Arc::ptr_eq(&node, &lb.node("/Common/10.0.0.1")));
}

#[test]
fn test_node_object_status() {
    let device = seeded();
    device.seed(
        NODE,
        "/Common/10.0.0.9",
        &json!({
            "address": "10.0.0.9",
            "object_status": {
                "availability_status": "AVAILABILITY_STATUS_RED",
                "enabled_status": "ENABLED_STATUS_ENABLED",
                "status_description": "Monitor icmp down",
            },
        }),
    );
    let lb = open(&device);

    let listed = lb.nodes_get(Some("10.0.0.1"), false).unwrap();
    assert_eq!(listed[0].cached().availability_status.as_deref(), Some("blue"));
    assert_eq!(device.count(node::GET_OBJECT_STATUS), 1);

    let down = lb.node("10.0.0.9");
    assert_eq!(down.availability_status().unwrap().as_deref(), Some("red"));
    assert_eq!(
        down.status_description().unwrap().as_deref(),
        Some("Monitor icmp down")
    );
}

#[test]
fn test_node_get_missing() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.node_get("10.9.9.9").unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::Node));
}

#[test]
fn test_nodes_get_sees_all_partitions() {
    let device = seeded();
    let lb = open(&device);

    let nodes = lb.nodes_get(None, true).unwrap();

    let names: Vec<&str> = nodes.iter().map(|n| n.name()).collect();
    assert_eq!(names, ["/App/10.1.0.1", "/Common/10.0.0.1", "/Common/10.0.0.2"]);
}

#[test]
fn test_nodes_get_in_folder_is_not_recursive() {
    let device = seeded();
    device.seed_node("/App/deep/10.2.0.1", "10.2.0.1");
    let lb = open(&device);

    let nodes = lb.nodes_get_in("/App", None, false).unwrap();

    let names: Vec<&str> = nodes.iter().map(|n| n.name()).collect();
    assert_eq!(names, ["/App/10.1.0.1"]);
    assert_eq!(nodes[0].cached().address.as_deref(), Some("10.1.0.1"));
    assert_eq!(device.folder(), "/Common");
    assert!(!device.recursive());
    assert_eq!(device.count(procedures::SET_RECURSIVE_QUERY_STATE), 0);
}

#[test]
fn test_nodes_get_in_root_is_recursive() {
    let device = seeded();
    let lb = open(&device);

    let nodes = lb.nodes_get_in("/", Some("10.0"), true).unwrap();

    assert_eq!(nodes.len(), 2);
    assert!(!device.recursive());
}

#[test]
fn test_create_node() {
    let device = seeded();
    let lb = open(&device);
    let node = lb.node("10.0.0.7");
    node.stage(|a| {
        a.address = Some("10.0.0.7".into());
        a.connection_limit = Some(100);
        a.description = Some("cache".into());
    });

    node.save().unwrap();

    let attrs = device.attrs(NODE, "/Common/10.0.0.7").unwrap();
    assert_eq!(attrs["address"], json!("10.0.0.7"));
    assert_eq!(attrs["connection_limit"], json!(100));
    assert_eq!(attrs["description"], json!("cache"));
    assert_eq!(device.count(node::CREATE), 1);
    assert_eq!(device.count(node::SET_CONNECTION_LIMIT), 0);
}

#[test]
fn test_create_node_requires_address() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.node("10.0.0.8").save().unwrap_err();

    assert!(matches!(
        err,
        Error::Incomplete {
            kind: ResourceKind::Node,
            field: "address"
        }
    ));
    assert_eq!(device.count(procedures::ROLLBACK_TRANSACTION), 1);
}

#[test]
fn test_update_existing_node() {
    let device = seeded();
    let lb = open(&device);
    let node = lb.node("10.0.0.2");
    node.stage(|a| {
        a.rate_limit = Some(500);
        a.enabled = Some(false);
    });

    node.save().unwrap();

    let attrs = device.attrs(NODE, "/Common/10.0.0.2").unwrap();
    assert_eq!(attrs["rate_limit"], json!(500));
    assert_eq!(attrs["session_enabled_state"], json!("STATE_DISABLED"));
    assert_eq!(device.count(node::CREATE), 0);
}

#[test]
fn test_setters_write_through() {
    let device = seeded();
    let lb = open(&device);
    let node = lb.node("10.0.0.1");

    node.set_dynamic_ratio(3).unwrap();
    node.set_connection_limit(10).unwrap();

    assert_eq!(node.dynamic_ratio().unwrap(), Some(3));
    assert_eq!(node.connection_limit().unwrap(), Some(10));
    assert_eq!(
        device.attrs(NODE, "/Common/10.0.0.1").unwrap()["dynamic_ratio_v2"],
        json!(3)
    );
}

#[test]
fn test_delete_node() {
    let device = seeded();
    let lb = open(&device);

    lb.node("/App/10.1.0.1").delete().unwrap();

    assert!(!device.contains(NODE, "/App/10.1.0.1"));
}

#[test]
fn test_unbound_node() {
    let node = Node::new("/Common/offline");
    node.set_description("local only").unwrap();
    assert_eq!(node.description().unwrap().as_deref(), Some("local only"));
    assert!(node.exists().unwrap_err().is_unbound());
}
