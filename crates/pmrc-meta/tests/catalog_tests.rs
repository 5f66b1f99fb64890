//! Integration tests for the standard catalog

use std::path::PathBuf;

use pmrc_meta::nerf::{is_dynamic_key, nerf_dart};
use pmrc_meta::{Catalog, Location, RuntimeFacts, TypeContext};
use rstest::rstest;
use serde_json::json;

fn catalog() -> Catalog {
    let facts = RuntimeFacts {
        cwd: PathBuf::from("/work"),
        home: Some(PathBuf::from("/home/me")),
        platform: "linux".into(),
        ..Default::default()
    };
    Catalog::standard(&facts).unwrap()
}

#[rstest]
#[case("loglevel", json!("warn"), Some(json!("warn")))]
#[case("loglevel", json!("loud"), None)]
#[case("searchlimit", json!("50"), Some(json!(50)))]
#[case("global", json!("true"), Some(json!(true)))]
#[case("omit", json!("dev"), Some(json!(["dev"])))]
#[case("before", json!("2020-01-01"), Some(json!("2020-01-01T00:00:00.000Z")))]
#[case("registry", json!("ftp"), None)]
fn test_standard_coercions(
    #[case] key: &str,
    #[case] raw: serde_json::Value,
    #[case] expected: Option<serde_json::Value>,
) {
    let catalog = catalog();
    let def = catalog.get(key).unwrap();
    let got = def.coerce(&raw, Location::Cli, &TypeContext::default()).ok();
    assert_eq!(got, expected);
}

#[test]
fn test_internal_facts_cannot_be_set_by_users() {
    let catalog = catalog();
    for key in catalog.internal_keys() {
        let def = catalog.get(key).unwrap();
        assert!(!def.is_allowed(Location::Cli), "{key} settable on cli");
        assert!(!def.is_allowed(Location::User), "{key} settable in user file");
    }
    assert!(catalog.internal_keys().any(|k| k == "cafile-contents"));
}

#[test]
fn test_every_allowed_key_has_a_description() {
    let catalog = catalog();
    for def in catalog.allowed_at(Location::User) {
        assert!(!def.description().is_empty(), "{}", def.key());
    }
}

#[test]
fn test_nerf_darts_for_registry_urls() {
    assert_eq!(
        nerf_dart("https://registry.npmjs.org/").unwrap(),
        "//registry.npmjs.org/"
    );
    assert!(is_dynamic_key("//registry.npmjs.org/:_authToken"));
    assert!(is_dynamic_key("@acme:registry"));
    assert!(!is_dynamic_key("registry"));
}
