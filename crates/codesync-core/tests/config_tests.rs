//! Tests for project configuration loading and validation

use codesync_core::{Config, ErrorKind, TargetKind};
use codesync_fs::NormalizedPath;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

const CONFIG: &str = r#"
version: "1"
projectName: demo
notifyOnly: false
items:
  - name: utils
    description: shared helpers
    source: { owner: acme, repo: toolkit, path: utils.go }
    target: { path: pkg/utils.go, type: function, language: go, function: Add }
  - name: readme
    source: { owner: acme, repo: toolkit, path: README.md, branch: develop, revision: "abc1234" }
    target: { path: docs/README.md, type: file }
    disabled: true
"#;

#[test]
fn test_config_parse_items_and_defaults() {
    let config = Config::parse(CONFIG).expect("Should parse valid YAML");

    assert_eq!(config.version, "1");
    assert_eq!(config.project_name, "demo");
    assert_eq!(config.state_dir, ".codesync");
    assert_eq!(config.items.len(), 2);

    let utils = &config.items[0];
    assert_eq!(utils.source.branch, "main");
    assert_eq!(utils.kind(), TargetKind::Function);
    assert_eq!(utils.target.function.as_deref(), Some("Add"));
    assert!(utils.enabled());

    let readme = &config.items[1];
    assert_eq!(readme.source.branch, "develop");
    assert_eq!(readme.source.pinned_revision(), Some("abc1234"));
    assert!(!readme.enabled());

    let enabled: Vec<_> = config.enabled_items().map(|i| i.name.as_str()).collect();
    assert_eq!(enabled, vec!["utils"]);
    config.validate().expect("Should validate");
}

#[test]
fn test_config_load_resolves_paths_against_its_directory() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path()).join("codesync.yaml");
    std::fs::write(path.to_native(), CONFIG).unwrap();

    let config = Config::load(&path).unwrap();
    let base = NormalizedPath::new(temp.path());

    assert_eq!(config.base_dir(), base);
    assert_eq!(config.state_dir_path(), base.join(".codesync"));
    assert_eq!(config.mirror_root_path(), base.join(".codesync").join("mirrors"));
    assert_eq!(
        config.items[0].target_path(&config.base_dir()),
        base.join("pkg/utils.go")
    );
}

#[test]
fn test_blank_revision_is_not_a_pin() {
    let config = Config::parse(
        r#"
version: "1"
items:
  - name: a
    source: { owner: o, repo: r, path: a.txt, revision: "  " }
    target: { path: a.txt, type: file }
"#,
    )
    .unwrap();
    assert_eq!(config.items[0].source.pinned_revision(), None);
}

#[rstest]
#[case::missing_version(
    "items:\n  - name: a\n    source: { owner: o, repo: r, path: p }\n    target: { path: t, type: file }\n",
    "version"
)]
#[case::no_items("version: \"1\"\nitems: []\n", "no sync items")]
#[case::duplicate_names(
    "version: \"1\"\nitems:\n  - name: a\n    source: { owner: o, repo: r, path: p }\n    target: { path: t, type: file }\n  - name: a\n    source: { owner: o, repo: r, path: p }\n    target: { path: u, type: file }\n",
    "duplicate"
)]
#[case::incomplete_source(
    "version: \"1\"\nitems:\n  - name: a\n    source: { owner: o, path: p }\n    target: { path: t, type: file }\n",
    "incomplete source"
)]
#[case::missing_target_type(
    "version: \"1\"\nitems:\n  - name: a\n    source: { owner: o, repo: r, path: p }\n    target: { path: t }\n",
    "incomplete target"
)]
#[case::function_without_language(
    "version: \"1\"\nitems:\n  - name: a\n    source: { owner: o, repo: r, path: p }\n    target: { path: t, type: function, function: Add }\n",
    "requires a language"
)]
#[case::unsupported_language(
    "version: \"1\"\nitems:\n  - name: a\n    source: { owner: o, repo: r, path: p }\n    target: { path: t, type: function, language: cobol, function: Add }\n",
    "unsupported language"
)]
#[case::function_without_name(
    "version: \"1\"\nitems:\n  - name: a\n    source: { owner: o, repo: r, path: p }\n    target: { path: t, type: function, language: python }\n",
    "function name"
)]
fn test_config_validation_rejects(#[case] yaml: &str, #[case] expected: &str) {
    let config = Config::parse(yaml).expect("Should parse");
    let error = config.validate().expect_err("Should be rejected");

    assert_eq!(error.kind(), ErrorKind::ConfigurationInvalid);
    assert!(
        error.to_string().contains(expected),
        "expected '{expected}' in: {error}"
    );
}

#[test]
fn test_disabled_items_skip_validation() {
    let config = Config::parse(
        r#"
version: "1"
items:
  - name: ok
    source: { owner: o, repo: r, path: a.txt }
    target: { path: a.txt, type: file }
  - name: broken
    source: { owner: o }
    target: { path: b.txt }
    disabled: true
"#,
    )
    .unwrap();
    config.validate().expect("Disabled items are not validated");
}

#[test]
fn test_malformed_yaml_is_configuration_error() {
    let error = Config::parse("items: [unclosed").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ConfigurationInvalid);
}
