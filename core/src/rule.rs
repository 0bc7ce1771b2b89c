//! Per-property rule builder and evaluators.
//!
//! A [`Rule`] is built once with chained calls and then evaluated by a
//! [`Ruleset`](crate::Ruleset). The `eval_*` methods never fail: every
//! violation is reported as `false` and turned into a structured error by
//! the caller.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::{PropertyType, Scope, ScopeInput};

/// Tokens accepted as `true` in string-encoded scopes.
const TRUE_TOKENS: [&str; 4] = ["true", "1", "on", "yes"];
/// Tokens accepted as `false` in string-encoded scopes.
const FALSE_TOKENS: [&str; 4] = ["false", "0", "off", "no"];

/// Constraints for one named property.
///
/// # Examples
///
/// ```
/// use input_rules_core::{PropertyType, Rule};
///
/// let rule = Rule::new("age")
///     .required()
///     .of_type(PropertyType::Number)
///     .min(0)
///     .max(120);
///
/// assert_eq!(rule.property_name(), "age");
/// assert!(rule.is_required());
/// assert_eq!(rule.types(), &[PropertyType::Number]);
/// assert_eq!(rule.min_value(), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    property: String,
    required: bool,
    types: Vec<PropertyType>,
    allowed: Option<Vec<Value>>,
    min: Option<i64>,
    max: Option<i64>,
    default: Option<Value>,
    matched_type: Option<PropertyType>,
}

impl Rule {
    /// Creates an unconstrained, optional rule for `property`.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            required: false,
            types: Vec::new(),
            allowed: None,
            min: None,
            max: None,
            default: None,
            matched_type: None,
        }
    }

    /// Marks the property as mandatory.
    pub fn required(self) -> Self {
        self.with_required(true)
    }

    /// Sets whether the property is mandatory.
    pub fn with_required(mut self, flag: bool) -> Self {
        self.required = flag;
        self
    }

    /// Adds `ty` to the accepted types.
    ///
    /// Repeated calls build a union; the value must match at least one type
    /// and the first matching type in declaration order wins.
    pub fn of_type(mut self, ty: PropertyType) -> Self {
        if !self.types.contains(&ty) {
            self.types.push(ty);
        }
        self
    }

    /// Sets the inclusive lower bound (value, length, or element count).
    pub fn min(mut self, n: i64) -> Self {
        self.min = Some(n);
        self
    }

    /// Sets the inclusive upper bound (value, length, or element count).
    pub fn max(mut self, n: i64) -> Self {
        self.max = Some(n);
        self
    }

    /// Sets the value seeded into the input when the property is absent.
    ///
    /// `Value::Null` is a valid default and differs from having none.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts the property to an explicit allow-list.
    ///
    /// # Examples
    ///
    /// ```
    /// use input_rules_core::{PropertyType, Rule};
    /// use serde_json::json;
    ///
    /// let rule = Rule::new("sort").of_type(PropertyType::String).one_of(["asc", "desc"]);
    /// assert_eq!(rule.allowed_values(), Some(&[json!("asc"), json!("desc")][..]));
    /// ```
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Property name this rule applies to.
    pub fn property_name(&self) -> &str {
        &self.property
    }

    /// Whether the property must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Accepted types in declaration order. Empty means unconstrained.
    pub fn types(&self) -> &[PropertyType] {
        &self.types
    }

    /// Enum allow-list, if configured.
    pub fn allowed_values(&self) -> Option<&[Value]> {
        self.allowed.as_deref()
    }

    /// Inclusive lower bound, if configured.
    pub fn min_value(&self) -> Option<i64> {
        self.min
    }

    /// Inclusive upper bound, if configured.
    pub fn max_value(&self) -> Option<i64> {
        self.max
    }

    /// Default value, if configured.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether a default (possibly `null`) is configured.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Type resolved by the last successful [`eval_type`](Rule::eval_type).
    pub fn matched_type(&self) -> Option<PropertyType> {
        self.matched_type
    }

    /// Forgets the type matched by an earlier evaluation.
    pub(crate) fn clear_matched_type(&mut self) {
        self.matched_type = None;
    }

    /// Returns `true` if [`eval_type`](Rule::eval_type) has anything to check.
    pub fn is_type_constrained(&self) -> bool {
        !self.types.is_empty() || self.allowed.is_some()
    }

    /// Checks that the property is present in `input`.
    ///
    /// Postcondition: when absent, the property is inserted into `input` with
    /// the configured default, or `null` without one, and `false` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use input_rules_core::{Rule, Scope, ScopeInput};
    /// use serde_json::json;
    ///
    /// let mut input = ScopeInput::new(Scope::Query);
    /// let rule = Rule::new("page").default(1);
    /// assert!(!rule.eval_required(&mut input));
    /// assert_eq!(input.get("page"), Some(&json!(1)));
    /// assert!(rule.eval_required(&mut input));
    /// ```
    pub fn eval_required(&self, input: &mut ScopeInput) -> bool {
        if input.contains(&self.property) {
            return true;
        }

        let seed = self.default.clone().unwrap_or(Value::Null);
        debug!(
            scope = %input.scope(),
            property = %self.property,
            seed = %seed,
            "Seeding absent property"
        );
        input.insert(self.property.clone(), seed);
        false
    }

    /// Checks `value` against the accepted types and the enum allow-list.
    ///
    /// Types are tried in declaration order and the first match is cached as
    /// [`matched_type`](Rule::matched_type); the cache is cleared first, so a
    /// failed check leaves it unset. Postcondition: in a string-encoded scope
    /// a boolean token matched as [`PropertyType::Boolean`] is written back to
    /// `input` as a JSON boolean.
    ///
    /// # Examples
    ///
    /// ```
    /// use input_rules_core::{PropertyType, Rule, Scope, ScopeInput};
    /// use serde_json::json;
    ///
    /// let mut input = ScopeInput::from_pairs(Scope::Query, [("debug", "yes")]);
    /// let mut rule = Rule::new("debug").of_type(PropertyType::Boolean);
    /// assert!(rule.eval_type(&json!("yes"), &mut input));
    /// assert_eq!(rule.matched_type(), Some(PropertyType::Boolean));
    /// assert_eq!(input.get("debug"), Some(&json!(true)));
    /// ```
    pub fn eval_type(&mut self, value: &Value, input: &mut ScopeInput) -> bool {
        self.matched_type = None;
        let scope = input.scope();

        let (matched, resolved) = if self.types.is_empty() {
            (None, Cow::Borrowed(value))
        } else {
            let found = self
                .types
                .iter()
                .find_map(|&ty| resolve_type(ty, value, scope).map(|v| (ty, v)));
            match found {
                Some((ty, resolved)) => (Some(ty), resolved),
                None => return false,
            }
        };

        if let Cow::Owned(coerced) = &resolved {
            debug!(
                scope = %scope,
                property = %self.property,
                from = %value,
                to = %coerced,
                "Coerced string-encoded value"
            );
            input.insert(self.property.clone(), coerced.clone());
        }

        if let Some(allowed) = &self.allowed {
            if !allowed.iter().any(|member| enum_member_eq(&resolved, member)) {
                return false;
            }
        }

        self.matched_type = matched;
        true
    }

    /// Checks the lower bound using the measure of the matched type.
    ///
    /// Passes when no bound is set, when no type was matched, or when the
    /// matched type has no measure (`BOOLEAN`, `NULL`). Integer measures are
    /// compared exactly.
    pub fn eval_min(&self, value: &Value) -> bool {
        match (self.min, self.measure(value)) {
            (Some(min), Some(measure)) => measure.at_least(min),
            _ => true,
        }
    }

    /// Checks the upper bound using the measure of the matched type.
    ///
    /// Same pass-through policy as [`eval_min`](Rule::eval_min).
    pub fn eval_max(&self, value: &Value) -> bool {
        match (self.max, self.measure(value)) {
            (Some(max), Some(measure)) => measure.at_most(max),
            _ => true,
        }
    }

    // Numeric value for NUMBER, char count for STRING, element/key count for
    // ARRAY and OBJECT.
    fn measure(&self, value: &Value) -> Option<Numeric> {
        let count = |n: usize| Numeric::Int(n as i128);
        match self.matched_type? {
            PropertyType::Number => numeric_value(value),
            PropertyType::String => value.as_str().map(|s| count(s.chars().count())),
            PropertyType::Array => value.as_array().map(|items| count(items.len())),
            PropertyType::Object => value.as_object().map(|map| count(map.len())),
            PropertyType::Boolean | PropertyType::Null => None,
        }
    }
}

/// Returns the value as it matches `ty`, owned when it had to be coerced.
fn resolve_type(ty: PropertyType, value: &Value, scope: Scope) -> Option<Cow<'_, Value>> {
    let matched = match ty {
        PropertyType::Number => numeric_value(value).is_some(),
        PropertyType::String => value.is_string(),
        PropertyType::Array => value.is_array(),
        PropertyType::Object => value.is_object(),
        PropertyType::Null => value.is_null(),
        PropertyType::Boolean => {
            if value.is_boolean() {
                true
            } else if scope.is_string_encoded() {
                return value
                    .as_str()
                    .and_then(parse_bool_token)
                    .map(|b| Cow::Owned(Value::Bool(b)));
            } else {
                false
            }
        }
    };
    matched.then_some(Cow::Borrowed(value))
}

fn parse_bool_token(raw: &str) -> Option<bool> {
    let token = raw.trim();
    if TRUE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(true)
    } else if FALSE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(false)
    } else {
        None
    }
}

/// Numeric reading of a value. Integers stay exact; fractional and exponent
/// forms fall back to `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i128),
    Float(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(n) => n as f64,
            Numeric::Float(f) => f,
        }
    }

    fn at_least(self, bound: i64) -> bool {
        match self {
            Numeric::Int(n) => n >= i128::from(bound),
            Numeric::Float(f) => f >= bound as f64,
        }
    }

    fn at_most(self, bound: i64) -> bool {
        match self {
            Numeric::Int(n) => n <= i128::from(bound),
            Numeric::Float(f) => f <= bound as f64,
        }
    }

    fn same_as(self, other: Numeric) -> bool {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

/// Numeric reading of a JSON number or a numeric string.
fn numeric_value(value: &Value) -> Option<Numeric> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(Numeric::Int)
            .or_else(|| n.as_f64().map(Numeric::Float)),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

// Optional sign, at least one mantissa digit, optional exponent. `inf`,
// `nan` and hex forms are not numeric.
static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$")
        .expect("static regex must compile")
});

fn parse_numeric_str(raw: &str) -> Option<Numeric> {
    let s = raw.trim_matches(|c: char| c.is_ascii_whitespace());
    if !NUMERIC_RE.is_match(s) {
        return None;
    }
    if !s.contains(['.', 'e', 'E']) {
        if let Ok(n) = s.parse::<i128>() {
            return Some(Numeric::Int(n));
        }
    }
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Numeric::Float)
}

/// Enum membership: exact equality, or numeric equality between a number
/// and a numeric string.
fn enum_member_eq(value: &Value, member: &Value) -> bool {
    if value == member {
        return true;
    }
    match (value, member) {
        (Value::String(_), Value::Number(_)) | (Value::Number(_), Value::String(_)) => {
            match (numeric_value(value), numeric_value(member)) {
                (Some(a), Some(b)) => a.same_as(b),
                _ => false,
            }
        }
        _ => false,
    }
}
