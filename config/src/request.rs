//! Request documents: query and body values captured in a file.
//!
//! ```json
//! { "query": { "page": "2", "debug": "on" }, "body": { "name": "ferris" } }
//! ```
//!
//! Query values are stored the way a query string delivers them: scalars
//! become strings, `null` becomes an empty string. Arrays and objects (as
//! produced by `a[]=1` style parameters) are kept as-is. Body values are
//! kept verbatim.

use std::path::Path;

use input_rules_core::{RequestInput, Scope, ScopeInput};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::format::FileFormat;

/// Raw request values loaded from JSON or YAML.
///
/// # Examples
///
/// ```
/// use input_rules_config::RequestDocument;
/// use serde_json::json;
///
/// let doc: RequestDocument = serde_json::from_value(json!({
///     "query": {"page": 2, "debug": true},
///     "body": {"count": 2}
/// }))
/// .unwrap();
///
/// let input = doc.into_input();
/// assert_eq!(input.query().get("page"), Some(&json!("2")));
/// assert_eq!(input.query().get("debug"), Some(&json!("true")));
/// assert_eq!(input.body().get("count"), Some(&json!(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestDocument {
    /// Query parameters.
    #[serde(default)]
    pub query: Map<String, Value>,
    /// Body fields.
    #[serde(default)]
    pub body: Map<String, Value>,
}

impl RequestDocument {
    /// Loads a document from a `.json`, `.yml` or `.yaml` file.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](crate::ConfigError::UnsupportedFormat),
    /// [`IoError`](crate::ConfigError::IoError), or a parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        FileFormat::load(path)
    }

    /// Converts into engine input, string-encoding query scalars.
    pub fn into_input(self) -> RequestInput {
        let query = self
            .query
            .into_iter()
            .map(|(k, v)| (k, query_encoded(v)))
            .collect();
        RequestInput::new()
            .with_query(ScopeInput::from_map(Scope::Query, query))
            .with_body(ScopeInput::from_map(Scope::Body, self.body))
    }
}

fn query_encoded(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ConfigError;

    #[test]
    fn test_missing_scopes_default_to_empty() {
        let doc: RequestDocument = serde_json::from_str("{}").unwrap();
        let input = doc.into_input();
        assert!(input.query().is_empty());
        assert!(input.body().is_empty());
    }

    #[test]
    fn test_query_scalars_become_strings() {
        let doc: RequestDocument = serde_json::from_value(json!({
            "query": {"a": null, "b": 1.5, "c": "x", "d": ["1", "2"]}
        }))
        .unwrap();
        let input = doc.into_input();
        assert_eq!(input.query().get("a"), Some(&json!("")));
        assert_eq!(input.query().get("b"), Some(&json!("1.5")));
        assert_eq!(input.query().get("c"), Some(&json!("x")));
        assert_eq!(input.query().get("d"), Some(&json!(["1", "2"])));
    }

    #[test]
    fn test_body_is_verbatim() {
        let doc: RequestDocument = serde_json::from_value(json!({
            "body": {"flag": true, "n": null}
        }))
        .unwrap();
        let input = doc.into_input();
        assert_eq!(input.body().get("flag"), Some(&json!(true)));
        assert_eq!(input.body().get("n"), Some(&Value::Null));
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let err = serde_json::from_str::<RequestDocument>(r#"{"headers": {}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_load_yaml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.yaml");
        std::fs::write(&path, "query:\n  page: 3\nbody:\n  name: ferris\n").unwrap();

        let input = RequestDocument::load(&path).unwrap().into_input();
        assert_eq!(input.query().get("page"), Some(&json!("3")));
        assert_eq!(input.body().get("name"), Some(&json!("ferris")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RequestDocument::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
