//! Tests for precedence resolution, derived values and the flattened view

use std::sync::Arc;

use pmrc_core::{ConfigResolver, Error, Origin};
use pmrc_meta::{Catalog, Location};
use pmrc_test_utils::TestEnv;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn resolver(env: &TestEnv) -> ConfigResolver {
    let facts = env.facts();
    let catalog = Arc::new(Catalog::standard(&facts).unwrap());
    ConfigResolver::new(catalog, &facts).unwrap()
}

fn object(value: Value) -> Origin {
    let Value::Object(data) = value else {
        panic!("not an object")
    };
    Origin::Object { data, file: None }
}

fn args(tokens: &[&str]) -> Origin {
    Origin::Args(tokens.iter().map(|t| t.to_string()).collect())
}

mod precedence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn higher_locations_win() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        assert_eq!(r.get_data(None, "loglevel"), Some(json!("notice")));

        r.load(Location::Env, object(json!({ "loglevel": "silly" }))).unwrap();
        assert_eq!(r.get_data(None, "loglevel"), Some(json!("silly")));

        r.load(Location::Cli, args(&[])).unwrap();
        r.set_data(Location::Cli, "loglevel", json!("warn")).unwrap();
        assert_eq!(r.get_data(None, "loglevel"), Some(json!("warn")));
        assert_eq!(r.get_data(Some(Location::Env), "loglevel"), Some(json!("silly")));
    }

    #[test]
    fn falsy_values_still_shadow() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::User, object(json!({ "description": true, "save-prefix": "~" })))
            .unwrap();
        r.load(Location::Project, object(json!({ "description": false, "save-prefix": "" })))
            .unwrap();

        assert_eq!(r.get_data(None, "description"), Some(json!(false)));
        assert_eq!(r.get_data(None, "save-prefix"), Some(json!("")));
        assert_eq!(r.find(None, "save-prefix"), Some(Location::Project));
    }

    #[test]
    fn find_respects_the_starting_location() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Env, object(json!({ "loglevel": "silly" }))).unwrap();

        assert_eq!(r.find(None, "loglevel"), Some(Location::Env));
        assert_eq!(r.find(Some(Location::User), "loglevel"), Some(Location::Default));
        assert_eq!(r.find(None, "no-such-key"), None);
        assert!(r.has_data(None, "loglevel"));
        assert!(!r.has_data(Some(Location::Cli), "loglevel"));
    }

    #[test]
    fn iteration_orders() {
        let env = TestEnv::new();
        let r = resolver(&env);
        let up: Vec<_> = r.values(Some(Location::Env)).map(|s| s.location()).collect();
        assert_eq!(up, vec![Location::Env, Location::Cli]);

        let down: Vec<_> = r.rev_values(Some(Location::Builtin)).map(|s| s.location()).collect();
        assert_eq!(down, vec![Location::Builtin, Location::Default, Location::Internal]);
        assert_eq!(r.values(None).count(), Location::ALL.len());
    }

    #[test]
    fn aliases_read_the_canonical_key() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Cli, args(&["--enjoy-by", "2024-01-02"])).unwrap();
        assert!(r.get_data(None, "before").is_some());
    }

    #[test]
    fn mutating_unloaded_location_fails() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        let err = r.set_data(Location::User, "loglevel", json!("warn")).unwrap_err();
        assert!(matches!(err, Error::NotLoaded { .. }));
    }
}

mod derived {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dependency_changes_recompute() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Cli, args(&[])).unwrap();
        assert_eq!(r.effective("save-prefix"), Some(json!("^")));

        r.set_data(Location::Cli, "save-exact", json!(true)).unwrap();
        assert_eq!(r.effective("save-prefix"), Some(json!("")));

        r.delete_data(Location::Cli, "save-exact").unwrap();
        assert_eq!(r.effective("save-prefix"), Some(json!("^")));
    }

    #[test]
    fn invalidation_follows_derived_dependencies() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Cli, args(&[])).unwrap();
        let before = r.effective("npx-cache").unwrap();

        r.set_data(Location::Cli, "cache", json!("/tmp/elsewhere")).unwrap();
        let after = r.effective("npx-cache").unwrap();
        assert_ne!(before, after);
        assert_eq!(after, json!("/tmp/elsewhere/_npx"));
        assert_eq!(r.effective("cache"), Some(json!("/tmp/elsewhere/_cacache")));
        assert_eq!(r.effective("cache-root"), Some(json!("/tmp/elsewhere")));
    }

    #[test]
    fn co_derived_keys_move_together() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Cli, args(&["--location", "global"])).unwrap();
        assert_eq!(r.effective("global"), Some(json!(true)));
        // The stored value is untouched.
        assert_eq!(r.get_data(None, "global"), Some(json!(false)));

        let prefix = env.prefix().to_string_lossy().into_owned();
        assert_eq!(r.effective("global-prefix"), Some(json!(prefix)));
        assert_eq!(
            r.effective("globalconfig"),
            Some(json!(env.global_rc().to_string_lossy()))
        );
    }

    #[test]
    fn derived_only_keys_fall_back_through_get_data() {
        let env = TestEnv::new();
        let r = resolver(&env);
        assert_eq!(r.get_data(None, "silent"), Some(json!(false)));
        assert_eq!(r.get_data(None, "search.limit"), Some(json!(20)));
        assert_eq!(r.get_data(Some(Location::Default), "silent"), None);
    }

    #[test]
    fn reload_clears_memoized_values() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        assert_eq!(r.effective("silent"), Some(json!(false)));
        r.load(Location::Cli, args(&["--silent"])).unwrap();
        assert_eq!(r.effective("silent"), Some(json!(true)));
    }

    #[test]
    fn user_agent_uses_facts() {
        let env = TestEnv::new();
        let r = resolver(&env);
        assert_eq!(
            r.effective("user-agent"),
            Some(json!("npm/10.2.4 node/v20.11.0 linux x64 workspaces/false"))
        );
    }
}

mod view {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_names_and_canonical_keys() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Cli, args(&["--no-strict-ssl"])).unwrap();
        let view = r.resolved();

        assert_eq!(view.get("strictSSL"), Some(json!(false)));
        assert_eq!(view.get("strict-ssl"), Some(json!(false)));
        assert_eq!(view.get("npmVersion"), Some(json!("10.2.4")));
        assert_eq!(view.get("searchLimit"), None);
        assert_eq!(view.get("search.limit"), Some(json!(20)));
    }

    #[test]
    fn derived_values_override_static_names() {
        let env = TestEnv::new();
        let r = resolver(&env);
        let view = r.resolved();
        let cache = env.home().join(".npm").join("_cacache");
        assert_eq!(view.get("cache"), Some(json!(cache.to_string_lossy())));
    }

    #[test]
    fn whole_view_nests_dotted_names() {
        let env = TestEnv::new();
        let r = resolver(&env);
        let value = r.resolved().to_value();
        assert_eq!(value["search"]["limit"], json!(20));
        assert_eq!(value["platform"], json!("linux"));
        assert_eq!(value["hashAlgorithm"], json!("sha1"));
    }
}

mod exports {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn changed_values_are_exported() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Cli, args(&["--loglevel", "warn", "--omit", "dev", "--omit", "peer"]))
            .unwrap();
        let exports = r.env_exports();

        assert_eq!(exports.get("npm_config_loglevel").map(String::as_str), Some("warn"));
        assert_eq!(exports.get("npm_config_omit").map(String::as_str), Some("dev\n\npeer"));
        assert!(!exports.contains_key("npm_config_registry"));
        assert!(!exports.contains_key("npm_config_cwd"));
        assert_eq!(exports.get("EDITOR").map(String::as_str), Some("vi"));
        assert_eq!(
            exports.get("npm_config_local_prefix"),
            Some(&env.project().to_string_lossy().into_owned())
        );
        assert_eq!(
            exports.get("npm_config_global_prefix"),
            Some(&env.prefix().to_string_lossy().into_owned())
        );
    }

    #[test]
    fn process_updates_include_title() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(Location::Cli, args(&["--title", "npm install"])).unwrap();
        assert_eq!(
            r.process_updates(),
            vec![("title".to_string(), "npm install".to_string())]
        );
    }
}

mod auth {
    use super::*;
    use pretty_assertions::assert_eq;
    use pmrc_core::{AuthAction, Validation};

    #[test]
    fn repair_renames_into_the_registry_scope() {
        let env = TestEnv::new();
        let mut r = resolver(&env);
        r.load(
            Location::User,
            Origin::Text {
                text: "_authToken=secret\n_authtoken=old\n".to_string(),
                file: None,
            },
        )
        .unwrap();

        let Validation::Problems(problems) = r.validate(Location::User).unwrap() else {
            panic!("expected problems")
        };
        assert!(problems.iter().any(|p| matches!(
            &p.action,
            AuthAction::Rename { to, .. } if to == "//registry.npmjs.org/:_authToken"
        )));

        r.repair(Location::User, &problems).unwrap();
        let store = r.store(Location::User);
        assert_eq!(store.get("//registry.npmjs.org/:_authToken"), Some(&json!("secret")));
        assert!(!store.has("_authToken"));
        assert!(!store.has("_authtoken"));
        assert_eq!(r.validate(Location::User).unwrap(), Validation::Valid);
    }
}
