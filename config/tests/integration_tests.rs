use std::path::Path;

use input_rules_config::{ConfigError, RequestDocument, RulesetConfig};
use input_rules_core::{ErrorKind, RuleError, Scope};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const RULES_YAML: &str = r#"
version: "1.0"
query:
  - property: page
    types: [NUMBER]
    min: 1
    default: 1
  - property: debug
    types: [BOOLEAN]
    default: false
body:
  - property: title
    required: true
    types: [STRING]
    min: 3
    max: 80
  - property: status
    types: [STRING]
    enum: [draft, published]
  - property: tags
    types: [ARRAY]
    max: 3
"#;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ---------------------------------------------------------------------------
// End-to-end evaluation from files
// ---------------------------------------------------------------------------

#[test]
fn test_valid_request_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.yml", RULES_YAML);
    let request = write(
        dir.path(),
        "request.json",
        r#"{"query": {"debug": "on"}, "body": {"title": "Hello", "status": "draft"}}"#,
    );

    let mut ruleset = RulesetConfig::load(&rules).unwrap().to_ruleset().unwrap();
    let mut input = RequestDocument::load(&request).unwrap().into_input();

    assert!(ruleset.evaluate(&mut input).is_ok());
    assert_eq!(input.query().get("page"), Some(&json!(1)));
    assert_eq!(input.query().get("debug"), Some(&json!(true)));
    assert_eq!(input.body().get("tags"), Some(&json!(null)));
}

#[test]
fn test_invalid_request_reports_every_violation() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.yaml", RULES_YAML);
    let request = write(
        dir.path(),
        "request.yaml",
        r#"
query:
  page: 0
  utm_source: newsletter
body:
  status: archived
  tags: [a, b, c, d]
"#,
    );

    let mut ruleset = RulesetConfig::load(&rules).unwrap().to_ruleset().unwrap();
    let mut input = RequestDocument::load(&request).unwrap().into_input();

    let report = ruleset.evaluate(&mut input).unwrap_err();
    assert_eq!(report.len(), 5);
    assert_eq!(report.get(Scope::Query, "page")[0].kind, ErrorKind::ValueMinError);
    assert_eq!(
        report.get(Scope::Query, "utm_source")[0].kind,
        ErrorKind::UnknownPropertyName
    );
    assert_eq!(
        report.get(Scope::Body, "title")[0].kind,
        ErrorKind::MissingRequiredProperty
    );
    assert_eq!(
        report.get(Scope::Body, "status")[0].kind,
        ErrorKind::InvalidPropertyValue
    );
    assert_eq!(report.get(Scope::Body, "tags")[0].kind, ErrorKind::ValueMaxError);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["body"]["status"]["INVALID_PROPERTY_VALUE"], json!(["draft", "published"]));
    assert_eq!(json["query"]["page"]["VALUE_MIN_ERROR"], json!(1));
}

#[test]
fn test_json_rules_file_is_supported() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(
        dir.path(),
        "rules.json",
        r#"{"version": "1.0", "body": [{"property": "id", "required": true, "types": ["NUMBER", "STRING"]}]}"#,
    );
    let config = RulesetConfig::load(&rules).unwrap();
    let ruleset = config.to_ruleset().unwrap();
    assert!(ruleset.rules(Scope::Query).is_empty());
    assert_eq!(ruleset.rules(Scope::Body).len(), 1);
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn test_misconfigured_rules_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(
        dir.path(),
        "rules.yml",
        "version: '1.0'\nbody:\n  - property: n\n    types: [NUMBER]\n    min: 10\n    max: 1\n",
    );
    let config = RulesetConfig::load(&rules).unwrap();
    assert_eq!(config.lint().len(), 1);
    assert!(matches!(
        config.to_ruleset(),
        Err(ConfigError::InvalidRule(RuleError::InvertedBounds { .. }))
    ));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.toml", "version = '1.0'");
    assert!(matches!(
        RulesetConfig::load(&rules),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_malformed_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let request = write(dir.path(), "request.json", "{\"query\": ");
    assert!(matches!(
        RequestDocument::load(&request),
        Err(ConfigError::JsonError(_))
    ));
}
