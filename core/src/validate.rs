//! Rule definition checks.
//!
//! Catches rule sets that are misconfigured rather than inputs that are
//! invalid: empty names, bounds without a type to measure, inverted bounds,
//! empty allow-lists, and duplicate properties within a scope.
//!
//! # Examples
//!
//! ```
//! use input_rules_core::*;
//!
//! let rules = [Rule::new("page").of_type(PropertyType::Number).min(1)];
//! assert!(validate_rules(Scope::Query, &rules).is_empty());
//!
//! // Invalid: a bound with nothing to measure it against
//! let rules = [Rule::new("page").min(1)];
//! assert_eq!(
//!     validate_rules(Scope::Query, &rules),
//!     vec![RuleError::BoundsWithoutType("page".to_string())]
//! );
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Rule, Scope};

/// Rule configuration errors.
///
/// These describe programmer mistakes in rule definitions. Invalid input
/// values are never reported through this type; see
/// [`ErrorReport`](crate::ErrorReport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Property name is empty or whitespace-only.
    #[error("rule property name cannot be empty")]
    EmptyPropertyName,
    /// `min` or `max` set on a rule with no accepted type.
    #[error("rule '{0}' sets bounds without an accepted type")]
    BoundsWithoutType(String),
    /// `min` greater than `max`.
    #[error("rule '{property}' has min {min} greater than max {max}")]
    InvertedBounds {
        /// Property name.
        property: String,
        /// Configured lower bound.
        min: i64,
        /// Configured upper bound.
        max: i64,
    },
    /// Enum allow-list with no entries.
    #[error("rule '{0}' has an empty enum")]
    EmptyEnum(String),
    /// Two rules for the same property in one scope.
    #[error("duplicate rule for property '{property}' in scope {scope}")]
    DuplicateProperty {
        /// Scope both rules were registered for.
        scope: Scope,
        /// Property name.
        property: String,
    },
    /// Type name outside the closed set.
    #[error("unknown property type: {0}")]
    UnknownPropertyType(String),
    /// Scope name outside the closed set.
    #[error("unknown scope: {0}")]
    UnknownScope(String),
}

impl Rule {
    /// Checks this rule's own configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleError`] found.
    pub fn check(&self) -> Result<(), RuleError> {
        let name = self.property_name();
        if name.trim().is_empty() {
            return Err(RuleError::EmptyPropertyName);
        }

        let (min, max) = (self.min_value(), self.max_value());
        if (min.is_some() || max.is_some()) && self.types().is_empty() {
            return Err(RuleError::BoundsWithoutType(name.to_string()));
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(RuleError::InvertedBounds {
                    property: name.to_string(),
                    min,
                    max,
                });
            }
        }

        if self.allowed_values().is_some_and(<[_]>::is_empty) {
            return Err(RuleError::EmptyEnum(name.to_string()));
        }

        Ok(())
    }
}

/// Validates the rules registered for one scope.
///
/// Reports at most one error per rule, plus one error per duplicated
/// property name.
pub fn validate_rules(scope: Scope, rules: &[Rule]) -> Vec<RuleError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for rule in rules {
        if let Err(err) = rule.check() {
            errors.push(err);
            continue;
        }
        if !seen.insert(rule.property_name()) {
            errors.push(RuleError::DuplicateProperty {
                scope,
                property: rule.property_name().to_string(),
            });
        }
    }

    errors
}
