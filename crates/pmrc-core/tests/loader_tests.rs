//! Tests for loading every location from a sandboxed machine

use pmrc_core::{ConfigLoader, Error};
use pmrc_meta::Location;
use pmrc_test_utils::TestEnv;
use serde_json::json;

#[test]
fn files_load_in_precedence_order() {
    let env = TestEnv::new();
    env.write_builtin_rc("searchlimit=1\nsave-prefix=~\n");
    env.write_global_rc("searchlimit=2\nloglevel=error\n");
    env.write_user_rc("searchlimit=3\n");
    env.write_project_rc("searchlimit=4\n");

    let loaded = ConfigLoader::new(env.facts()).load().unwrap();
    let r = &loaded.resolver;
    assert_eq!(r.get_data(None, "searchlimit"), Some(json!(4)));
    assert_eq!(r.get_data(None, "loglevel"), Some(json!("error")));
    assert_eq!(r.get_data(None, "save-prefix"), Some(json!("~")));
    assert_eq!(r.find(None, "searchlimit"), Some(Location::Project));

    for location in Location::ALL {
        assert!(r.store(location).is_loaded(), "{location} was not loaded");
    }
}

#[test]
fn command_line_and_environment() {
    let env = TestEnv::new()
        .with_var("npm_config_loglevel", "silly")
        .with_var("npm_config_searchlimit", "9");
    let loaded = ConfigLoader::new(env.facts())
        .args(["install", "--loglevel", "warn", "left-pad"])
        .load()
        .unwrap();

    assert_eq!(loaded.positional, vec!["install", "left-pad"]);
    assert_eq!(loaded.resolver.get_data(None, "loglevel"), Some(json!("warn")));
    assert_eq!(loaded.resolver.get_data(None, "searchlimit"), Some(json!(9)));
}

#[test]
fn invalid_command_line_values_fail() {
    let env = TestEnv::new();
    let err = ConfigLoader::new(env.facts())
        .args(["--searchlimit", "lots"])
        .load()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidItem { location: Location::Cli, .. }));
}

#[test]
fn global_mode_skips_the_project_file() {
    let env = TestEnv::new();
    env.write_project_rc("searchlimit=4\n");
    let loaded = ConfigLoader::new(env.facts()).args(["-g"]).load().unwrap();

    let project = loaded.resolver.store(Location::Project);
    assert_eq!(project.source(), Some("project config, ignored: global mode enabled"));
    assert_eq!(loaded.resolver.get_data(None, "searchlimit"), Some(json!(20)));
}

#[test]
fn project_file_that_is_the_user_file_is_ignored() {
    let env = TestEnv::new();
    let userconfig = env.project_rc().to_string_lossy().into_owned();
    let loaded = ConfigLoader::new(env.facts())
        .args(["--userconfig", userconfig.as_str()])
        .load()
        .unwrap();

    let project = loaded.resolver.store(Location::Project);
    assert_eq!(
        project.source(),
        Some("project config, ignored: same as \"user\" config")
    );
}

#[test]
fn userconfig_can_move_the_global_file() {
    let env = TestEnv::new();
    let alt = env.root().join("alt-npmrc");
    std::fs::write(&alt, "searchlimit=7\n").unwrap();
    env.write_user_rc(&format!("globalconfig={}\n", alt.display()));

    let loaded = ConfigLoader::new(env.facts()).load().unwrap();
    assert_eq!(loaded.resolver.find(None, "searchlimit"), Some(Location::Global));
    assert_eq!(loaded.resolver.get_data(None, "searchlimit"), Some(json!(7)));
}

#[test]
fn missing_files_leave_errored_stores() {
    let env = TestEnv::new();
    let loaded = ConfigLoader::new(env.facts()).load().unwrap();
    let user = loaded.resolver.store(Location::User);
    assert!(user.is_loaded());
    assert!(user.error().is_some_and(|e| e.is_not_found()));
    assert!(user.data().is_empty());
}

#[test]
fn unknown_file_keys_are_dropped() {
    let env = TestEnv::new();
    env.write_user_rc("not-a-real-key=1\nloglevel=warn\n");
    let loaded = ConfigLoader::new(env.facts()).load().unwrap();
    let user = loaded.resolver.store(Location::User);
    assert!(!user.has("not-a-real-key"));
    assert!(user.has("loglevel"));
}

#[test]
fn cafile_contents_feed_ca() {
    let env = TestEnv::new();
    let cafile = env.root().join("ca.pem");
    std::fs::write(
        &cafile,
        "-----BEGIN CERTIFICATE-----\nAAA\n-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----\nBBB\n-----END CERTIFICATE-----\n",
    )
    .unwrap();
    env.write_user_rc(&format!("cafile={}\n", cafile.display()));

    let loaded = ConfigLoader::new(env.facts()).load().unwrap();
    let ca = loaded.resolver.effective("ca").unwrap();
    assert_eq!(ca.as_array().map(Vec::len), Some(2));
    assert_eq!(
        ca[1],
        json!("-----BEGIN CERTIFICATE-----\nBBB\n-----END CERTIFICATE-----")
    );
}

#[test]
fn environment_placeholders_expand_in_files() {
    let env = TestEnv::new().with_var("MY_TOKEN", "s3cret");
    env.write_user_rc("//registry.npmjs.org/:_authToken=${MY_TOKEN}\n");
    let loaded = ConfigLoader::new(env.facts()).load().unwrap();
    assert_eq!(
        loaded.resolver.get_data(None, "//registry.npmjs.org/:_authToken"),
        Some(json!("s3cret"))
    );
}
