//! Structured validation errors and the per-scope error report.
//!
//! An [`ErrorReport`] keeps every [`ValidationError`] in order per scope and
//! property. Its serialized form is keyed by error kind:
//!
//! ```json
//! { "query": { "age": { "VALUE_MAX_ERROR": 120 } } }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{PropertyType, Scope};

/// Closed set of violation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Input carries a property no rule covers.
    UnknownPropertyName,
    /// A required property is absent.
    MissingRequiredProperty,
    /// Value matches none of the accepted types.
    InvalidPropertyType,
    /// Value is outside the enum allow-list.
    InvalidPropertyValue,
    /// Value, length, or count is below the lower bound.
    ValueMinError,
    /// Value, length, or count is above the upper bound.
    ValueMaxError,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UnknownPropertyName => "UNKNOWN_PROPERTY_NAME",
            ErrorKind::MissingRequiredProperty => "MISSING_REQUIRED_PROPERTY",
            ErrorKind::InvalidPropertyType => "INVALID_PROPERTY_TYPE",
            ErrorKind::InvalidPropertyValue => "INVALID_PROPERTY_VALUE",
            ErrorKind::ValueMinError => "VALUE_MIN_ERROR",
            ErrorKind::ValueMaxError => "VALUE_MAX_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Payload attached to a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Detail {
    /// Human-readable message (unknown and missing properties).
    Message(String),
    /// The expected value: type names, allow-list, or bound.
    Expected(Value),
}

/// One detected violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Scope the property was read from.
    pub scope: Scope,
    /// Offending property name.
    pub property: String,
    /// Violation kind.
    pub kind: ErrorKind,
    /// Message or expected value, depending on `kind`.
    pub detail: Detail,
}

impl ValidationError {
    /// Input property not covered by any rule.
    pub fn unknown_property(scope: Scope, property: &str) -> Self {
        Self {
            scope,
            property: property.to_string(),
            kind: ErrorKind::UnknownPropertyName,
            detail: Detail::Message(format!("Unknown property name '{property}'")),
        }
    }

    /// Required property absent from the input.
    pub fn missing_property(scope: Scope, property: &str) -> Self {
        Self {
            scope,
            property: property.to_string(),
            kind: ErrorKind::MissingRequiredProperty,
            detail: Detail::Message(format!("Missing required property '{property}'")),
        }
    }

    /// Value matched none of `types`.
    pub fn invalid_type(scope: Scope, property: &str, types: &[PropertyType]) -> Self {
        let names = types.iter().map(|t| Value::from(t.name())).collect();
        Self {
            scope,
            property: property.to_string(),
            kind: ErrorKind::InvalidPropertyType,
            detail: Detail::Expected(Value::Array(names)),
        }
    }

    /// Value outside the `allowed` enum list.
    pub fn invalid_value(scope: Scope, property: &str, allowed: &[Value]) -> Self {
        Self {
            scope,
            property: property.to_string(),
            kind: ErrorKind::InvalidPropertyValue,
            detail: Detail::Expected(Value::Array(allowed.to_vec())),
        }
    }

    /// Measure below `min`.
    pub fn below_min(scope: Scope, property: &str, min: i64) -> Self {
        Self {
            scope,
            property: property.to_string(),
            kind: ErrorKind::ValueMinError,
            detail: Detail::Expected(Value::from(min)),
        }
    }

    /// Measure above `max`.
    pub fn above_max(scope: Scope, property: &str, max: i64) -> Self {
        Self {
            scope,
            property: property.to_string(),
            kind: ErrorKind::ValueMaxError,
            detail: Detail::Expected(Value::from(max)),
        }
    }

    /// Expected value, when the detail carries one.
    pub fn expected(&self) -> Option<&Value> {
        match &self.detail {
            Detail::Expected(value) => Some(value),
            Detail::Message(_) => None,
        }
    }

    /// Human-readable description of the violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use input_rules_core::{PropertyType, Scope, ValidationError};
    ///
    /// let err = ValidationError::invalid_type(
    ///     Scope::Body,
    ///     "id",
    ///     &[PropertyType::Number, PropertyType::String],
    /// );
    /// assert_eq!(err.message(), "Value must be of type NUMBER or STRING");
    /// ```
    pub fn message(&self) -> String {
        match (&self.kind, &self.detail) {
            (_, Detail::Message(message)) => message.clone(),
            (ErrorKind::InvalidPropertyType, Detail::Expected(expected)) => {
                format!("Value must be of type {}", join_alternatives(expected, false))
            }
            (ErrorKind::InvalidPropertyValue, Detail::Expected(expected)) => {
                format!("Value must be exactly: {}", join_alternatives(expected, true))
            }
            (ErrorKind::ValueMinError, Detail::Expected(bound)) => {
                format!("Value must be larger or equal to {bound}")
            }
            (ErrorKind::ValueMaxError, Detail::Expected(bound)) => {
                format!("Value must be smaller or equal to {bound}")
            }
            (kind, Detail::Expected(expected)) => format!("{kind}: expected {expected}"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} [{}]: {}",
            self.scope,
            self.property,
            self.kind,
            self.message()
        )
    }
}

// Renders `["a", "b"]` as `a or b`, quoting strings when `quote` is set.
fn join_alternatives(expected: &Value, quote: bool) -> String {
    let render = |v: &Value| match v {
        Value::String(s) if quote => format!("'{s}'"),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match expected {
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(" or "),
        other => render(other),
    }
}

/// Every violation found in one evaluation pass, indexed by scope and
/// property.
///
/// Appending never drops earlier entries for the same scope/property.
///
/// # Examples
///
/// ```
/// use input_rules_core::{ErrorKind, ErrorReport, Scope, ValidationError};
///
/// let mut report = ErrorReport::default();
/// report.push(ValidationError::unknown_property(Scope::Query, "foo"));
/// report.push(ValidationError::below_min(Scope::Body, "age", 0));
///
/// assert_eq!(report.len(), 2);
/// assert_eq!(report.get(Scope::Query, "foo")[0].kind, ErrorKind::UnknownPropertyName);
///
/// let json = serde_json::to_value(&report).unwrap();
/// assert_eq!(json["body"]["age"]["VALUE_MIN_ERROR"], 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorReport {
    scopes: BTreeMap<Scope, BTreeMap<String, Vec<ValidationError>>>,
}

impl ErrorReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a violation under its scope and property.
    pub fn push(&mut self, error: ValidationError) {
        self.scopes
            .entry(error.scope)
            .or_default()
            .entry(error.property.clone())
            .or_default()
            .push(error);
    }

    /// Returns `true` if no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Total number of violations.
    pub fn len(&self) -> usize {
        self.scopes
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Violations for one property, in the order they were recorded.
    pub fn get(&self, scope: Scope, property: &str) -> &[ValidationError] {
        self.scopes
            .get(&scope)
            .and_then(|props| props.get(property))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Scopes with at least one violation.
    pub fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
        self.scopes.keys().copied()
    }

    /// Iterates over every violation, grouped by scope then property name.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.scopes
            .values()
            .flat_map(BTreeMap::values)
            .flatten()
    }

    /// Returns `true` if any violation has `kind`.
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors().any(|e| e.kind == kind)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in self.errors() {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scopes.len()))?;
        for (scope, properties) in &self.scopes {
            map.serialize_entry(scope, &PropertyErrors(properties))?;
        }
        map.end()
    }
}

struct PropertyErrors<'a>(&'a BTreeMap<String, Vec<ValidationError>>);

impl Serialize for PropertyErrors<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (property, errors) in self.0 {
            map.serialize_entry(property, &KindErrors(errors))?;
        }
        map.end()
    }
}

struct KindErrors<'a>(&'a [ValidationError]);

impl Serialize for KindErrors<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for error in self.0 {
            map.serialize_entry(&error.kind, &error.detail)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_push_keeps_earlier_entries() {
        let mut report = ErrorReport::new();
        report.push(ValidationError::below_min(Scope::Body, "n", 1));
        report.push(ValidationError::above_max(Scope::Body, "n", 5));
        let errors = report.get(Scope::Body, "n");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ErrorKind::ValueMinError);
        assert_eq!(errors[1].kind, ErrorKind::ValueMaxError);
    }

    #[test]
    fn test_get_missing_is_empty() {
        let report = ErrorReport::new();
        assert!(report.is_empty());
        assert!(report.get(Scope::Query, "x").is_empty());
    }

    #[test]
    fn test_serialized_shape_is_kind_keyed() {
        let mut report = ErrorReport::new();
        report.push(ValidationError::unknown_property(Scope::Query, "foo"));
        report.push(ValidationError::invalid_value(
            Scope::Body,
            "sort",
            &[json!("a"), json!("b")],
        ));
        report.push(ValidationError::invalid_type(
            Scope::Body,
            "id",
            &[PropertyType::Number],
        ));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "query": {
                    "foo": {"UNKNOWN_PROPERTY_NAME": "Unknown property name 'foo'"}
                },
                "body": {
                    "id": {"INVALID_PROPERTY_TYPE": ["NUMBER"]},
                    "sort": {"INVALID_PROPERTY_VALUE": ["a", "b"]}
                }
            })
        );
    }

    #[test]
    fn test_messages() {
        let value = ValidationError::invalid_value(Scope::Body, "s", &[json!("a"), json!(2)]);
        assert_eq!(value.message(), "Value must be exactly: 'a' or 2");
        assert_eq!(
            ValidationError::below_min(Scope::Body, "n", 3).message(),
            "Value must be larger or equal to 3"
        );
        assert_eq!(
            ValidationError::above_max(Scope::Body, "n", 9).to_string(),
            "body.n [VALUE_MAX_ERROR]: Value must be smaller or equal to 9"
        );
    }

    #[test]
    fn test_error_record_serializes_flat() {
        let err = ValidationError::missing_property(Scope::Query, "page");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["scope"], "query");
        assert_eq!(value["kind"], "MISSING_REQUIRED_PROPERTY");
        assert_eq!(value["detail"], "Missing required property 'page'");
    }
}
