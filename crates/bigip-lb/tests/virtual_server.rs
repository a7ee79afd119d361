mod common;

use bigip_lb::constants::virtual_server;
use bigip_lb::{Resource, VirtualServer};
use bigip_session::ResourceKind;
use serde_json::json;

use common::{at_root, open, seeded};

const VIRTUAL_SERVER: &str = "LocalLB.VirtualServer";

#[test]
fn test_vs_get_loads_attributes() {
    let device = seeded();
    let lb = open(&device);

    let vs = lb.vs_get("www-vs-tls").unwrap();

    let cached = vs.cached();
    assert_eq!(cached.address.as_deref(), Some("/Common/192.0.2.10"));
    assert_eq!(cached.port, Some(443));
    assert_eq!(cached.default_pool.as_deref(), Some("/Common/www-1"));
    assert_eq!(cached.protocol.as_deref(), Some("tcp"));
    assert_eq!(cached.vstype.as_deref(), Some("pool"));
    assert_eq!(cached.enabled, Some(true));
}

#[test]
fn test_vs_get_missing() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.vs_get("nope").unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::VirtualServer));
}

#[test]
fn test_vss_get_pattern() {
    let device = seeded();
    let lb = at_root(&device);

    let servers = lb.vss_get(Some("www-"), true).unwrap();

    let names: Vec<&str> = servers.iter().map(|v| v.name()).collect();
    assert_eq!(names, ["/Common/www-vs", "/Common/www-vs-tls"]);
    assert_eq!(device.count(virtual_server::GET_DESTINATION), 0);
    assert_eq!(device.folder(), "/");
}

#[test]
fn test_individual_getters() {
    let device = seeded();
    let lb = open(&device);
    let vs = lb.virtual_server("/App/api-vs");

    assert_eq!(vs.address().unwrap().as_deref(), Some("/App/192.0.2.20"));
    assert_eq!(vs.port().unwrap(), Some(80));
    assert_eq!(vs.protocol().unwrap().as_deref(), Some("tcp"));
    assert_eq!(vs.vstype().unwrap().as_deref(), Some("pool"));
    assert_eq!(vs.description().unwrap().as_deref(), Some(""));
}

#[test]
fn test_set_enabled_writes_through() {
    let device = seeded();
    let lb = at_root(&device);
    let vs = lb.virtual_server("/Common/www-vs");

    vs.set_enabled(false).unwrap();

    assert_eq!(
        device.attrs(VIRTUAL_SERVER, "/Common/www-vs").unwrap()["enabled_state"],
        json!("STATE_DISABLED")
    );
    assert_eq!(vs.enabled().unwrap(), Some(false));
    assert_eq!(device.folder(), "/");
}

#[test]
fn test_save_pushes_staged_attributes() {
    let device = seeded();
    let lb = open(&device);
    let vs = lb.virtual_server("www-vs");
    vs.stage(|a| {
        a.default_pool = Some("/Common/api".into());
        a.description = Some("public".into());
    });

    vs.save().unwrap();

    let attrs = device.attrs(VIRTUAL_SERVER, "/Common/www-vs").unwrap();
    assert_eq!(attrs["default_pool_name"], json!("/Common/api"));
    assert_eq!(attrs["description"], json!("public"));
    assert_eq!(device.count(virtual_server::SET_ENABLED_STATE), 0);
}

#[test]
fn test_save_missing_is_not_found() {
    let device = seeded();
    let lb = open(&device);
    let vs = lb.virtual_server("ghost");
    vs.stage(|a| a.description = Some("x".into()));

    let err = vs.save().unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::VirtualServer));
}

#[test]
fn test_delete_virtual_server() {
    let device = seeded();
    let lb = open(&device);

    lb.virtual_server("/App/api-vs").delete().unwrap();

    assert!(!device.contains(VIRTUAL_SERVER, "/App/api-vs"));
}

#[test]
fn test_unbound_virtual_server() {
    let vs = VirtualServer::new("/Common/draft");
    vs.stage(|a| a.port = Some(8443));
    assert_eq!(vs.port().unwrap(), Some(8443));
    assert!(vs.save().unwrap_err().is_unbound());
}
