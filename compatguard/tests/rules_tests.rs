//! Rules file loading and validation

use compatguard::rules::{RuleSource, RULES_ENV_VAR};
use compatguard::{ConfigError, RuleSet};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn temp_rules(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_custom_rules() {
    let path = fixture_path("custom_rules.json");
    let rules = RuleSet::load(&path).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules.source(), &RuleSource::File(path));
    assert_eq!(rules.rules()[0].id, "voltline-vx-panel-breaker");
    assert_eq!(rules.catalog().brand_names().collect::<Vec<_>>(), vec!["Voltline"]);
}

#[test]
fn test_malformed_file_is_rejected() {
    let err = RuleSet::load(&fixture_path("malformed_rules.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { .. }));
    assert!(err.to_string().contains("malformed_rules.json"));
}

#[test]
fn test_backwards_range_is_rejected() {
    let err = RuleSet::load(&fixture_path("invalid_range.json")).unwrap_err();
    match err {
        ConfigError::InvalidRule { rule, reason, .. } => {
            assert_eq!(rule, "backwards-range");
            assert!(reason.contains("empty range"));
        }
        other => panic!("expected InvalidRule, got {}", other),
    }
}

#[test]
fn test_unknown_attribute_is_rejected() {
    let err = RuleSet::load(&fixture_path("unknown_attribute.json")).unwrap_err();
    assert!(err.to_string().contains("wire_gauge"));
}

#[test]
fn test_relation_outside_its_pair_is_rejected() {
    let file = temp_rules(
        r#"{"rules": [{
            "category_pair": ["plug", "receptacle"],
            "brand": "*",
            "series": "*",
            "constraints": { "continuous_load": true }
        }]}"#,
    );
    let err = RuleSet::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRule { .. }));
}

#[test]
fn test_anchor_outside_pair_is_rejected() {
    let file = temp_rules(
        r#"{"rules": [{
            "category_pair": ["plug", "receptacle"],
            "brand": "Leviton",
            "series": "*",
            "anchor": "panel"
        }]}"#,
    );
    assert!(RuleSet::load(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuleSet::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Missing(_)));
}

#[test]
fn test_default_rule_id() {
    let rules = RuleSet::from_json(
        r#"{"rules": [{
            "category_pair": ["panel", "breaker"],
            "brand": "Siemens",
            "series": "QP"
        }]}"#,
    )
    .unwrap();
    assert_eq!(rules.rules()[0].id, "Siemens QP (panel ↔ breaker)");
}

#[test]
fn test_resolution_order() {
    let custom = fixture_path("custom_rules.json");

    // Explicit path wins over the environment
    std::env::set_var(RULES_ENV_VAR, fixture_path("malformed_rules.json"));
    let rules = RuleSet::resolve(Some(&custom)).unwrap();
    assert_eq!(rules.source(), &RuleSource::File(custom.clone()));

    // A broken file named by the environment never falls back
    assert!(RuleSet::resolve(None).is_err());

    std::env::set_var(RULES_ENV_VAR, &custom);
    assert_eq!(RuleSet::resolve(None).unwrap().len(), 1);

    std::env::remove_var(RULES_ENV_VAR);
    assert_eq!(RuleSet::resolve(None).unwrap().source(), &RuleSource::Builtin);
}
