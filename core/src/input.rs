//! Explicit handles to the input values a ruleset evaluates.
//!
//! Evaluation both reads and writes these mappings: absent properties are
//! seeded with their default (or `null`) and boolean tokens in
//! string-encoded scopes are replaced by real booleans. Callers that need
//! the normalized values read them back from the same handle afterwards.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::Scope;

/// Named input values for a single [`Scope`].
///
/// # Examples
///
/// ```
/// use input_rules_core::{Scope, ScopeInput};
/// use serde_json::json;
///
/// let input = ScopeInput::from_pairs(Scope::Query, [("page", "2"), ("sort", "asc")]);
/// assert_eq!(input.get("page"), Some(&json!("2")));
/// assert_eq!(input.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeInput {
    scope: Scope,
    values: Map<String, Value>,
}

impl ScopeInput {
    /// Creates an empty input for `scope`.
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            values: Map::new(),
        }
    }

    /// Wraps an existing mapping.
    pub fn from_map(scope: Scope, values: Map<String, Value>) -> Self {
        Self { scope, values }
    }

    /// Builds a string-valued input from decoded key/value pairs, as a query
    /// string would deliver them. A repeated key keeps its last value.
    pub fn from_pairs<I, K, V>(scope: Scope, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { scope, values }
    }

    /// The scope these values belong to.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if `name` is a key, including keys holding `null`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Sets `name` to `value`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Iterates over property names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no property is present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrows the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Consumes the input and returns the underlying mapping.
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl Serialize for ScopeInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// The query and body inputs of one request.
///
/// # Examples
///
/// ```
/// use input_rules_core::{RequestInput, Scope, ScopeInput};
///
/// let mut request = RequestInput::new()
///     .with_query(ScopeInput::from_pairs(Scope::Query, [("q", "rust")]));
/// assert!(request.scope(Scope::Query).contains("q"));
/// assert!(request.scope(Scope::Body).is_empty());
///
/// request.scope_mut(Scope::Body).insert("name", "ferris".into());
/// assert_eq!(request.body().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestInput {
    query: ScopeInput,
    body: ScopeInput,
}

impl Default for RequestInput {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestInput {
    /// Creates a request with empty query and body.
    pub fn new() -> Self {
        Self {
            query: ScopeInput::new(Scope::Query),
            body: ScopeInput::new(Scope::Body),
        }
    }

    /// Replaces the query input. The input is re-tagged as [`Scope::Query`].
    pub fn with_query(mut self, query: ScopeInput) -> Self {
        self.query = ScopeInput::from_map(Scope::Query, query.into_map());
        self
    }

    /// Replaces the body input. The input is re-tagged as [`Scope::Body`].
    pub fn with_body(mut self, body: ScopeInput) -> Self {
        self.body = ScopeInput::from_map(Scope::Body, body.into_map());
        self
    }

    /// Query parameters.
    pub fn query(&self) -> &ScopeInput {
        &self.query
    }

    /// Body fields.
    pub fn body(&self) -> &ScopeInput {
        &self.body
    }

    /// Borrows the input for `scope`.
    pub fn scope(&self, scope: Scope) -> &ScopeInput {
        match scope {
            Scope::Query => &self.query,
            Scope::Body => &self.body,
        }
    }

    /// Mutably borrows the input for `scope`.
    pub fn scope_mut(&mut self, scope: Scope) -> &mut ScopeInput {
        match scope {
            Scope::Query => &mut self.query,
            Scope::Body => &mut self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_pairs_last_duplicate_wins() {
        let input = ScopeInput::from_pairs(Scope::Query, [("a", "1"), ("a", "2")]);
        assert_eq!(input.len(), 1);
        assert_eq!(input.get("a"), Some(&json!("2")));
    }

    #[test]
    fn test_contains_sees_null_values() {
        let mut input = ScopeInput::new(Scope::Body);
        input.insert("gone", Value::Null);
        assert!(input.contains("gone"));
        assert_eq!(input.get("gone"), Some(&Value::Null));
    }

    #[test]
    fn test_with_query_retags_scope() {
        let request = RequestInput::new().with_query(ScopeInput::new(Scope::Body));
        assert_eq!(request.query().scope(), Scope::Query);
    }

    #[test]
    fn test_request_serializes_both_scopes() {
        let mut request = RequestInput::new();
        request.scope_mut(Scope::Query).insert("page", json!(2));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"query": {"page": 2}, "body": {}}));
    }
}
