mod common;

use std::sync::Arc;

use bigip_lb::constants::rule;
use bigip_lb::{Resource, Rule};
use bigip_session::constants::procedures;
use bigip_session::{Error, ResourceKind};
use serde_json::json;

use common::{at_root, open, seeded};

const RULE: &str = "LocalLB.Rule";

#[test]
fn test_rule_get_loads_definition() {
    let device = seeded();
    let lb = open(&device);

    let redirect = lb.rule_get("redirect").unwrap();

    assert_eq!(
        redirect.cached().definition.as_deref(),
        Some("when HTTP_REQUEST { HTTP::redirect / }")
    );
    assert_eq!(redirect.ignore_verification().unwrap(), Some(false));
}

#[test]
fn test_rule_get_missing() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.rule_get("nope").unwrap_err();

    assert!(err.is_not_found_for(ResourceKind::Rule));
}

#[test]
fn test_rules_get_with_pattern() {
    let device = seeded();
    device.seed_rule("/App/redirect-app", "when HTTP_REQUEST {}");
    device.seed_rule("/Common/logger", "when CLIENT_ACCEPTED {}");
    let lb = at_root(&device);

    let rules = lb.rules_get(Some("redir"), false).unwrap();

    let names: Vec<String> = rules.iter().map(|r| r.name()).collect();
    assert_eq!(names, ["/App/redirect-app", "/Common/redirect"]);
    assert_eq!(
        rules[0].cached().definition.as_deref(),
        Some("when HTTP_REQUEST {}")
    );
    assert_eq!(device.folder(), "/");
}

#[test]
fn test_create_rule() {
    let device = seeded();
    let lb = open(&device);
    let logger = lb.rule("logger");
    logger.stage(|a| {
        a.definition = Some("when CLIENT_ACCEPTED { log local0. hi }".into());
        a.description = Some("connection log".into());
    });

    logger.save().unwrap();

    let attrs = device.attrs(RULE, "/Common/logger").unwrap();
    assert_eq!(attrs["definition"], json!("when CLIENT_ACCEPTED { log local0. hi }"));
    assert_eq!(attrs["description"], json!("connection log"));
    assert_eq!(device.count(rule::CREATE), 1);
    assert_eq!(device.count(rule::MODIFY), 0);
}

#[test]
fn test_create_rule_requires_definition() {
    let device = seeded();
    let lb = open(&device);

    let err = lb.rule("empty").save().unwrap_err();

    assert!(matches!(
        err,
        Error::Incomplete {
            kind: ResourceKind::Rule,
            field: "definition"
        }
    ));
    assert_eq!(device.count(procedures::ROLLBACK_TRANSACTION), 1);
}

#[test]
fn test_save_existing_rule_modifies() {
    let device = seeded();
    let lb = open(&device);
    let redirect = lb.rule("redirect");
    redirect.stage(|a| a.definition = Some("when HTTP_REQUEST { HTTP::respond 200 }".into()));

    redirect.save().unwrap();

    assert_eq!(device.count(rule::MODIFY), 1);
    assert_eq!(device.count(rule::CREATE), 0);
    assert_eq!(
        redirect.definition().unwrap().as_deref(),
        Some("when HTTP_REQUEST { HTTP::respond 200 }")
    );
}

#[test]
fn test_set_definition_writes_through() {
    let device = seeded();
    let lb = at_root(&device);
    let redirect = lb.rule("/Common/redirect");

    redirect.set_definition("when HTTP_REQUEST {}").unwrap();
    redirect.set_ignore_verification(true).unwrap();

    let attrs = device.attrs(RULE, "/Common/redirect").unwrap();
    assert_eq!(attrs["definition"], json!("when HTTP_REQUEST {}"));
    assert_eq!(attrs["ignore_verification"], json!(true));
    assert_eq!(device.folder(), "/");
}

#[test]
fn test_rename_then_save_creates_copy() {
    let device = seeded();
    let lb = open(&device);
    let redirect = lb.rule_get("redirect").unwrap();

    redirect.rename("redirect-v2").unwrap();
    redirect.save().unwrap();

    assert!(Arc::ptr_eq(&redirect, &lb.rule("redirect-v2")));
    assert!(device.contains(RULE, "/Common/redirect"));
    assert!(device.contains(RULE, "/Common/redirect-v2"));
}

#[test]
fn test_delete_rule() {
    let device = seeded();
    let lb = open(&device);
    let redirect = lb.rule("redirect");
    let key = redirect.key();

    redirect.delete().unwrap();

    assert!(!device.contains(RULE, "/Common/redirect"));
    assert!(lb.registry().rules().get(&key).is_none());
}

#[test]
fn test_unbound_rule_rename() {
    let rule = Arc::new(Rule::new("draft"));
    rule.rename("final").unwrap();
    assert_eq!(rule.name(), "final");
    assert!(rule.delete().unwrap_err().is_unbound());
}

#[test]
fn test_rename_onto_live_rule_is_refused() {
    let device = seeded();
    device.seed_rule("/Common/other", "when HTTP_REQUEST {}");
    let lb = open(&device);
    let redirect = lb.rule_get("redirect").unwrap();
    let other = lb.rule_get("other").unwrap();

    let err = redirect.rename("other").unwrap_err();

    assert!(err.is_identity_conflict());
    assert_eq!(redirect.name(), "/Common/redirect");

    other.delete().unwrap();
    assert!(Arc::ptr_eq(&redirect, &lb.rule("redirect")));
    assert!(!Arc::ptr_eq(&other, &lb.rule("other")));
}
