use std::sync::Arc;

use pmrc_core::{ConfigResolver, Origin, ini};
use pmrc_meta::{Catalog, Location, RuntimeFacts};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn resolver() -> ConfigResolver {
    let facts = RuntimeFacts {
        cwd: "/work".into(),
        home: Some("/home/me".into()),
        default_global_prefix: "/usr/local".into(),
        ..RuntimeFacts::default()
    };
    let catalog = Arc::new(Catalog::standard(&facts).unwrap());
    ConfigResolver::new(catalog, &facts).unwrap()
}

const LAYERS: [Location; 5] = [
    Location::Builtin,
    Location::Global,
    Location::User,
    Location::Project,
    Location::Env,
];

proptest! {
    #[test]
    fn test_highest_setting_location_wins(
        limits in proptest::collection::vec(proptest::option::of(0i64..1000), LAYERS.len())
    ) {
        let mut r = resolver();
        for (location, limit) in LAYERS.iter().zip(&limits) {
            let mut data = Map::new();
            if let Some(limit) = limit {
                data.insert("searchlimit".into(), json!(limit));
            }
            r.load(*location, Origin::Object { data, file: None }).unwrap();
        }

        let expected = limits
            .iter()
            .rev()
            .find_map(|l| l.map(|v| json!(v)))
            .unwrap_or(json!(20));
        prop_assert_eq!(r.get_data(None, "searchlimit"), Some(expected.clone()));
        prop_assert_eq!(r.effective("search.limit"), Some(expected));
    }

    #[test]
    fn test_ini_text_round_trips(
        entries in proptest::collection::btree_map("[a-z][a-z0-9-]{0,10}", r"[a-zA-Z0-9 ./:@~^\\;#-]{0,16}", 0..8)
    ) {
        let data: Map<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k, Value::String(v.trim().to_string())))
            .filter(|(_, v)| !matches!(v.as_str(), Some("true" | "false" | "null")))
            .collect();
        let reparsed = ini::parse(&ini::stringify(&data));
        prop_assert_eq!(reparsed, data);
    }
}
