//! Evaluation of rule collections against request input.
//!
//! A [`Ruleset`] holds the rules registered per [`Scope`] and checks a
//! [`RequestInput`] against them in one pass. Every violation across every
//! scope is collected before the result is returned.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    ErrorReport, RequestInput, Rule, RuleError, Scope, ScopeInput, ValidationError, validate_rules,
};

static NULL: Value = Value::Null;

/// Rules grouped by scope, plus the report of the last evaluation.
///
/// Only scopes that received rules through [`add`](Ruleset::add) are
/// evaluated. Registering an empty rule list for a scope makes every
/// property in that scope unknown.
///
/// # Examples
///
/// ```
/// use input_rules_core::*;
/// use serde_json::json;
///
/// let mut ruleset = Ruleset::new();
/// ruleset
///     .add(Scope::Query, [Rule::new("age").required().of_type(PropertyType::Number).min(0).max(120)])
///     .unwrap();
///
/// let mut request = RequestInput::new()
///     .with_query(ScopeInput::from_pairs(Scope::Query, [("age", "200")]));
///
/// let report = ruleset.evaluate(&mut request).unwrap_err();
/// let errors = report.get(Scope::Query, "age");
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].kind, ErrorKind::ValueMaxError);
/// assert_eq!(errors[0].expected(), Some(&json!(120)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    rules: BTreeMap<Scope, Vec<Rule>>,
    errors: ErrorReport,
}

impl Ruleset {
    /// Creates a ruleset with no scopes registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rules` for `scope`. Repeated calls for the same scope
    /// accumulate.
    ///
    /// Nothing is registered when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleError`] found in the new rules, including a
    /// [`DuplicateProperty`](RuleError::DuplicateProperty) against rules
    /// already registered for `scope`.
    pub fn add<I>(&mut self, scope: Scope, rules: I) -> Result<&mut Self, RuleError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let rules: Vec<Rule> = rules.into_iter().collect();
        if let Some(err) = validate_rules(scope, &rules).into_iter().next() {
            return Err(err);
        }

        let existing = self.rules(scope);
        if let Some(dup) = rules.iter().find(|new| {
            existing
                .iter()
                .any(|old| old.property_name() == new.property_name())
        }) {
            return Err(RuleError::DuplicateProperty {
                scope,
                property: dup.property_name().to_string(),
            });
        }

        debug!(scope = %scope, count = rules.len(), "Registered rules");
        self.rules.entry(scope).or_default().extend(rules);
        Ok(self)
    }

    /// Rules registered for `scope`, in declaration order.
    pub fn rules(&self, scope: Scope) -> &[Rule] {
        self.rules.get(&scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Scopes that have been registered.
    pub fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
        self.rules.keys().copied()
    }

    /// Report from the most recent [`evaluate`](Ruleset::evaluate) call.
    pub fn errors(&self) -> &ErrorReport {
        &self.errors
    }

    /// Checks `request` against every registered scope.
    ///
    /// Each pass starts from an empty report. Absent properties are seeded
    /// and boolean tokens in the query scope are coerced in `request`, so the
    /// caller can read normalized values back afterwards.
    ///
    /// # Errors
    ///
    /// Returns the full [`ErrorReport`] when any violation is found.
    pub fn evaluate(&mut self, request: &mut RequestInput) -> Result<(), ErrorReport> {
        let mut report = ErrorReport::new();

        for (&scope, rules) in &mut self.rules {
            let input = request.scope_mut(scope);
            eval_property_name_diff(rules, input, &mut report);
            for rule in rules.iter_mut() {
                eval_rule(rule, input, &mut report);
            }
        }

        info!(
            scopes = self.rules.len(),
            violations = report.len(),
            "Evaluated ruleset"
        );
        self.errors = report;

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }

    /// Checks a single scope's input against the rules registered for it.
    ///
    /// Unregistered scopes pass trivially. The stored report is replaced.
    ///
    /// # Errors
    ///
    /// Returns the [`ErrorReport`] for this scope when any violation is
    /// found.
    pub fn evaluate_scope(&mut self, input: &mut ScopeInput) -> Result<(), ErrorReport> {
        let mut report = ErrorReport::new();

        if let Some(rules) = self.rules.get_mut(&input.scope()) {
            eval_property_name_diff(rules, input, &mut report);
            for rule in rules.iter_mut() {
                eval_rule(rule, input, &mut report);
            }
        }

        self.errors = report;
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }
}

/// Records an error for every input key no rule covers.
fn eval_property_name_diff(rules: &[Rule], input: &ScopeInput, report: &mut ErrorReport) {
    let known: HashSet<&str> = rules.iter().map(Rule::property_name).collect();
    for name in input.keys().filter(|name| !known.contains(name)) {
        debug!(scope = %input.scope(), property = name, "Unknown property");
        report.push(ValidationError::unknown_property(input.scope(), name));
    }
}

/// Runs one rule: presence, then type/enum, then bounds.
fn eval_rule(rule: &mut Rule, input: &mut ScopeInput, report: &mut ErrorReport) {
    let scope = input.scope();
    let before = report.len();
    rule.clear_matched_type();

    if !rule.eval_required(input) {
        if rule.is_required() {
            report.push(ValidationError::missing_property(scope, rule.property_name()));
        }
        return;
    }

    let value = input
        .get(rule.property_name())
        .cloned()
        .unwrap_or(Value::Null);

    if rule.is_type_constrained() && !rule.eval_type(&value, input) {
        let error = match rule.allowed_values() {
            Some(allowed) => ValidationError::invalid_value(scope, rule.property_name(), allowed),
            None => ValidationError::invalid_type(scope, rule.property_name(), rule.types()),
        };
        report.push(error);
    }

    // Re-read: eval_type may have replaced the raw value.
    let value = input.get(rule.property_name()).unwrap_or(&NULL);

    if let Some(min) = rule.min_value() {
        if !rule.eval_min(value) {
            report.push(ValidationError::below_min(scope, rule.property_name(), min));
        }
    }
    if let Some(max) = rule.max_value() {
        if !rule.eval_max(value) {
            report.push(ValidationError::above_max(scope, rule.property_name(), max));
        }
    }

    debug!(
        scope = %scope,
        property = rule.property_name(),
        matched = ?rule.matched_type(),
        violations = report.len() - before,
        "Evaluated rule"
    );
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{ErrorKind, PropertyType};

    fn body_request(value: Value) -> RequestInput {
        let map = value.as_object().cloned().unwrap_or_default();
        RequestInput::new().with_body(ScopeInput::from_map(Scope::Body, map))
    }

    #[test]
    fn test_add_is_cumulative() {
        let mut ruleset = Ruleset::new();
        ruleset.add(Scope::Body, [Rule::new("a")]).unwrap();
        ruleset.add(Scope::Body, [Rule::new("b")]).unwrap();
        let names: Vec<_> = ruleset
            .rules(Scope::Body)
            .iter()
            .map(Rule::property_name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_add_rejects_duplicate_across_calls() {
        let mut ruleset = Ruleset::new();
        ruleset.add(Scope::Body, [Rule::new("a")]).unwrap();
        let err = ruleset
            .add(Scope::Body, [Rule::new("c"), Rule::new("a")])
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::DuplicateProperty {
                scope: Scope::Body,
                property: "a".to_string()
            }
        );
        assert_eq!(ruleset.rules(Scope::Body).len(), 1);
    }

    #[test]
    fn test_same_property_in_different_scopes_is_fine() {
        let mut ruleset = Ruleset::new();
        ruleset.add(Scope::Query, [Rule::new("id")]).unwrap();
        ruleset.add(Scope::Body, [Rule::new("id")]).unwrap();
        assert_eq!(ruleset.scopes().collect::<Vec<_>>(), [Scope::Query, Scope::Body]);
    }

    #[test]
    fn test_unregistered_scope_is_not_checked() {
        let mut ruleset = Ruleset::new();
        ruleset.add(Scope::Query, Vec::<Rule>::new()).unwrap();
        let mut request = body_request(json!({"anything": 1}));
        assert!(ruleset.evaluate(&mut request).is_ok());
    }

    #[test]
    fn test_empty_rule_list_makes_every_key_unknown() {
        let mut ruleset = Ruleset::new();
        ruleset.add(Scope::Body, Vec::<Rule>::new()).unwrap();
        let mut request = body_request(json!({"a": 1, "b": 2}));
        let report = ruleset.evaluate(&mut request).unwrap_err();
        assert_eq!(report.len(), 2);
        assert!(report.errors().all(|e| e.kind == ErrorKind::UnknownPropertyName));
    }

    #[test]
    fn test_missing_required_skips_other_checks() {
        let mut ruleset = Ruleset::new();
        ruleset
            .add(
                Scope::Body,
                [Rule::new("name").required().of_type(PropertyType::String).min(3)],
            )
            .unwrap();
        let mut request = RequestInput::new();
        let report = ruleset.evaluate(&mut request).unwrap_err();
        let errors = report.get(Scope::Body, "name");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MissingRequiredProperty);
    }

    #[test]
    fn test_type_error_suppresses_bound_errors() {
        let mut ruleset = Ruleset::new();
        ruleset
            .add(Scope::Body, [Rule::new("n").of_type(PropertyType::Number).min(1).max(2)])
            .unwrap();
        let mut request = body_request(json!({"n": "abc"}));
        let report = ruleset.evaluate(&mut request).unwrap_err();
        let errors = report.get(Scope::Body, "n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::InvalidPropertyType);
        assert_eq!(errors[0].expected(), Some(&json!(["NUMBER"])));
    }

    #[test]
    fn test_errors_reset_between_passes() {
        let mut ruleset = Ruleset::new();
        ruleset
            .add(Scope::Body, [Rule::new("n").of_type(PropertyType::Number)])
            .unwrap();

        let mut bad = body_request(json!({"n": "x"}));
        assert!(ruleset.evaluate(&mut bad).is_err());
        assert_eq!(ruleset.errors().len(), 1);

        let mut good = body_request(json!({"n": 3}));
        assert!(ruleset.evaluate(&mut good).is_ok());
        assert!(ruleset.errors().is_empty());
    }

    #[test]
    fn test_matched_type_is_cleared_when_property_goes_absent() {
        let mut ruleset = Ruleset::new();
        ruleset
            .add(Scope::Body, [Rule::new("n").of_type(PropertyType::Number)])
            .unwrap();

        let mut present = body_request(json!({"n": 3}));
        assert!(ruleset.evaluate(&mut present).is_ok());
        assert_eq!(
            ruleset.rules(Scope::Body)[0].matched_type(),
            Some(PropertyType::Number)
        );

        let mut absent = RequestInput::new();
        assert!(ruleset.evaluate(&mut absent).is_ok());
        assert_eq!(ruleset.rules(Scope::Body)[0].matched_type(), None);
    }

    #[test]
    fn test_evaluate_scope_only_touches_that_scope() {
        let mut ruleset = Ruleset::new();
        ruleset
            .add(Scope::Query, [Rule::new("debug").of_type(PropertyType::Boolean)])
            .unwrap();
        ruleset.add(Scope::Body, Vec::<Rule>::new()).unwrap();

        let mut query = ScopeInput::from_pairs(Scope::Query, [("debug", "off")]);
        assert!(ruleset.evaluate_scope(&mut query).is_ok());
        assert_eq!(query.get("debug"), Some(&json!(false)));
    }
}
