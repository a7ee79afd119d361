mod common;

use std::sync::Arc;

use bigip_lb::constants::pool;
use bigip_lb::{MemberId, PoolMember, Resource};
use bigip_session::ResourceKind;
use bigip_session::constants::procedures;
use serde_json::json;

use common::{at_root, open, seeded};

fn ids(members: &[Arc<PoolMember>]) -> Vec<String> {
    members.iter().map(|m| m.id().address().to_string()).collect()
}

#[test]
fn test_pms_get_pattern_on_address_and_port() {
    let device = seeded();
    let lb = open(&device);

    let members = lb.pms_get(None, Some("10.0.0.1"), false).unwrap();

    assert_eq!(ids(&members), ["/Common/10.0.0.1:80"]);
    let cached = members[0].cached();
    assert_eq!(cached.availability_status.as_deref(), Some("green"));
    assert_eq!(cached.ratio, Some(1));
    assert_eq!(cached.enabled, Some(true));
    assert_eq!(device.folder(), "/Common");
    assert!(!device.recursive());
}

#[test]
fn test_pms_get_pattern_matches_port() {
    let device = seeded();
    let lb = open(&device);

    let members = lb.pms_get(None, Some(r".*:8080$"), true).unwrap();

    assert_eq!(ids(&members), ["/Common/10.0.0.3:8080"]);
    assert_eq!(members[0].pool(), "/Common/api");
}

#[test]
fn test_pms_get_named_pools_batches_by_pool() {
    let device = seeded();
    let lb = open(&device);

    let members = lb
        .pms_get(Some(&["www-1", "/Common/api"][..]), None, false)
        .unwrap();

    assert_eq!(members.len(), 3);
    assert_eq!(device.count(pool::GET_MEMBER), 1);
    assert_eq!(device.count(pool::GET_MEMBER_RATIO), 1);
    let pools: Vec<&str> = members.iter().map(|m| m.pool()).collect();
    assert_eq!(pools, ["/Common/www-1", "/Common/www-1", "/Common/api"]);
}

#[test]
fn test_pms_get_missing_pool() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.pms_get(Some(&["ghost"][..]), None, true).unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::Pool));
    assert_eq!(device.folder(), "/Common");
}

#[test]
fn test_handle_is_canonical() {
    let device = seeded();
    let lb = open(&device);

    let a = lb.pool_member("10.0.0.1", 80, "www-1");
    let b = lb.pool_member("/Common/10.0.0.1", 80, "/Common/www-1");
    let listed = lb.pms_get(Some(&["www-1"][..]), Some("10.0.0.1"), true).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &listed[0]));
    assert_eq!(
        a.id(),
        &MemberId::new("/Common/10.0.0.1", 80, "/Common/www-1")
    );
    assert!(device.calls().iter().all(|c| !c.starts_with("LocalLB.Pool.set")));
}

#[test]
fn test_pm_get_missing_is_member_not_found() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.pm_get("10.0.0.9", 80, "www-1").unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::PoolMember));
}

#[test]
fn test_getters_fetch_from_device() {
    let device = seeded();
    let lb = open(&device);
    let member = lb.pm_get("10.0.0.2", 80, "www-1").unwrap();

    assert_eq!(member.priority().unwrap(), Some(0));
    assert_eq!(member.dynamic_ratio().unwrap(), Some(1));
    assert_eq!(member.connection_limit().unwrap(), Some(0));
    assert_eq!(member.rate_limit().unwrap(), Some(0));
    assert_eq!(member.description().unwrap().as_deref(), Some(""));
    assert_eq!(member.availability_status().unwrap().as_deref(), Some("green"));
    assert_eq!(member.cached().status_description.as_deref(), Some(""));
}

#[test]
fn test_setter_from_root_restores_root() {
    let device = seeded();
    let lb = at_root(&device);
    let member = lb.pool_member("/Common/10.0.0.1", 80, "/Common/www-1");

    member.set_enabled(false).unwrap();
    member.set_ratio(7).unwrap();

    assert_eq!(device.folder(), "/");
    assert_eq!(member.enabled().unwrap(), Some(false));
    assert_eq!(member.ratio().unwrap(), Some(7));
    assert_eq!(device.count(pool::SET_MEMBER_SESSION_ENABLED_STATE), 1);
}

#[test]
fn test_save_adds_missing_member() {
    let device = seeded();
    let lb = open(&device);
    let member = lb.pool_member("10.0.0.9", 80, "www-1");
    member.stage(|a| {
        a.ratio = Some(5);
        a.priority = Some(2);
    });

    member.save().unwrap();

    assert!(
        device
            .members("/Common/www-1")
            .contains(&("/Common/10.0.0.9".to_string(), 80))
    );
    assert_eq!(device.count(pool::ADD_MEMBER), 1);
    assert_eq!(device.count(procedures::SUBMIT_TRANSACTION), 1);
    assert_eq!(member.ratio().unwrap(), Some(5));
    assert_eq!(member.priority().unwrap(), Some(2));
}

#[test]
fn test_save_existing_member_only_pushes() {
    let device = seeded();
    let lb = open(&device);
    let member = lb.pool_member("10.0.0.1", 80, "www-1");
    member.stage(|a| a.description = Some("primary".into()));

    member.save().unwrap();

    assert_eq!(device.count(pool::ADD_MEMBER), 0);
    assert_eq!(device.count(pool::SET_MEMBER_DESCRIPTION), 1);
    assert_eq!(member.description().unwrap().as_deref(), Some("primary"));
}

#[test]
fn test_save_into_missing_pool_rolls_back() {
    let device = seeded();
    let lb = open(&device);
    let member = lb.pool_member("10.0.0.1", 80, "ghost");

    let err = member.save().unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::Pool));
    assert_eq!(device.count(procedures::ROLLBACK_TRANSACTION), 1);
}

#[test]
fn test_delete_removes_member_and_forgets() {
    let device = seeded();
    let lb = open(&device);
    let member = lb.pool_member("10.0.0.2", 80, "www-1");
    let key = member.key();

    member.delete().unwrap();

    assert_eq!(
        device.members("/Common/www-1"),
        [("/Common/10.0.0.1".to_string(), 80)]
    );
    assert!(lb.registry().pool_members().get(&key).is_none());
    assert!(!member.exists().unwrap());
}

#[test]
fn test_delete_missing_member() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.pool_member("10.0.0.9", 80, "www-1").delete().unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::PoolMember));
    assert_eq!(device.members("/Common/www-1").len(), 2);
}

#[test]
fn test_serialize_bound_member() {
    let device = seeded();
    let lb = open(&device);
    let member = lb.pm_get("10.0.0.3", 8080, "api").unwrap();

    let value = serde_json::to_value(&*member).unwrap();

    assert_eq!(value["node"], json!("/Common/10.0.0.3"));
    assert_eq!(value["port"], json!(8080));
    assert_eq!(value["pool"], json!("/Common/api"));
    assert_eq!(value["availability_status"], json!("green"));
}
