//! Closed vocabularies used by rules and inputs.
//!
//! [`PropertyType`] names the primitive shapes a value can be validated
//! against, and [`Scope`] names the bag of request input a rule applies to.
//! Both parse from strings through explicit lookup tables rather than
//! reflection, so the accepted spellings are visible in one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::RuleError;

/// Primitive shape a property value may be checked against.
///
/// Serialized in upper case (`"NUMBER"`, `"STRING"`, ...). Parsing is
/// ASCII case-insensitive.
///
/// # Examples
///
/// ```
/// use input_rules_core::PropertyType;
///
/// let ty: PropertyType = "number".parse().unwrap();
/// assert_eq!(ty, PropertyType::Number);
/// assert_eq!(ty.to_string(), "NUMBER");
/// assert!("integer".parse::<PropertyType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum PropertyType {
    /// JSON number, or a numeric string.
    Number,
    /// JSON string.
    String,
    /// JSON boolean (or a boolean token in string-encoded scopes).
    Boolean,
    /// JSON array.
    Array,
    /// JSON object. Matched structurally, keys are not inspected.
    Object,
    /// JSON `null`.
    Null,
}

const PROPERTY_TYPE_NAMES: [(&str, PropertyType); 6] = [
    ("NUMBER", PropertyType::Number),
    ("STRING", PropertyType::String),
    ("BOOLEAN", PropertyType::Boolean),
    ("ARRAY", PropertyType::Array),
    ("OBJECT", PropertyType::Object),
    ("NULL", PropertyType::Null),
];

impl PropertyType {
    /// All property types, in declaration order.
    pub const ALL: [PropertyType; 6] = [
        PropertyType::Number,
        PropertyType::String,
        PropertyType::Boolean,
        PropertyType::Array,
        PropertyType::Object,
        PropertyType::Null,
    ];

    /// Returns the canonical upper-case name.
    pub fn name(self) -> &'static str {
        PROPERTY_TYPE_NAMES[self as usize].0
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropertyType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        PROPERTY_TYPE_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(needle))
            .map(|(_, ty)| *ty)
            .ok_or_else(|| RuleError::UnknownPropertyType(s.to_string()))
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl TryFrom<String> for PropertyType {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Logical bag of named input values a rule is evaluated against.
///
/// `query` holds string-encoded values (URL search parameters), `body`
/// holds decoded request body fields. The legacy names
/// `get` and `post` are accepted as aliases when parsing.
///
/// # Examples
///
/// ```
/// use input_rules_core::Scope;
///
/// assert_eq!("post".parse::<Scope>().unwrap(), Scope::Body);
/// assert!(Scope::Query.is_string_encoded());
/// assert!(!Scope::Body.is_string_encoded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum Scope {
    /// URL query parameters.
    Query,
    /// Request body fields.
    Body,
}

// Canonical names first, in variant order, then aliases.
const SCOPE_NAMES: [(&str, Scope); 4] = [
    ("query", Scope::Query),
    ("body", Scope::Body),
    ("get", Scope::Query),
    ("post", Scope::Body),
];

impl Scope {
    /// Both scopes, in evaluation order.
    pub const ALL: [Scope; 2] = [Scope::Query, Scope::Body];

    /// Returns the canonical lower-case name.
    pub fn name(self) -> &'static str {
        SCOPE_NAMES[self as usize].0
    }

    /// Returns `true` when values in this scope arrive as strings and may
    /// need coercion before they match a primitive type.
    pub fn is_string_encoded(self) -> bool {
        matches!(self, Scope::Query)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scope {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        SCOPE_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(needle))
            .map(|(_, scope)| *scope)
            .ok_or_else(|| RuleError::UnknownScope(s.to_string()))
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl TryFrom<String> for Scope {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_names_roundtrip() {
        for ty in PropertyType::ALL {
            assert_eq!(ty.name().parse::<PropertyType>().unwrap(), ty);
            assert_eq!(ty.name().to_lowercase().parse::<PropertyType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_property_type_rejects_unknown_name() {
        let err = "float".parse::<PropertyType>().unwrap_err();
        assert_eq!(err, RuleError::UnknownPropertyType("float".to_string()));
    }

    #[test]
    fn test_property_type_serde_uses_upper_case() {
        let json = serde_json::to_string(&PropertyType::Boolean).unwrap();
        assert_eq!(json, "\"BOOLEAN\"");
        let parsed: PropertyType = serde_json::from_str("\"boolean\"").unwrap();
        assert_eq!(parsed, PropertyType::Boolean);
        assert!(serde_json::from_str::<PropertyType>("\"bool\"").is_err());
    }

    #[test]
    fn test_name_tables_list_canonical_names_in_variant_order() {
        for (index, ty) in PropertyType::ALL.into_iter().enumerate() {
            assert_eq!(PROPERTY_TYPE_NAMES[index].1, ty);
        }
        for (index, scope) in Scope::ALL.into_iter().enumerate() {
            assert_eq!(SCOPE_NAMES[index].1, scope);
        }
        assert_eq!(Scope::Query.name(), "query");
        assert_eq!(Scope::Body.to_string(), "body");
        assert_eq!(PropertyType::Null.to_string(), "NULL");
    }

    #[test]
    fn test_scope_aliases() {
        assert_eq!("GET".parse::<Scope>().unwrap(), Scope::Query);
        assert_eq!("query".parse::<Scope>().unwrap(), Scope::Query);
        assert_eq!("Body".parse::<Scope>().unwrap(), Scope::Body);
        assert_eq!(
            "cookie".parse::<Scope>().unwrap_err(),
            RuleError::UnknownScope("cookie".to_string())
        );
    }

    #[test]
    fn test_scope_serde() {
        assert_eq!(serde_json::to_string(&Scope::Body).unwrap(), "\"body\"");
        let scope: Scope = serde_json::from_str("\"get\"").unwrap();
        assert_eq!(scope, Scope::Query);
    }
}
