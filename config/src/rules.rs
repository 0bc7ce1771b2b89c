//! Rule-set definition files.
//!
//! Declares the rules for each scope in YAML or JSON so they can be kept
//! next to the routes they guard.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! query:
//!   - property: page
//!     types: [NUMBER]
//!     min: 1
//!     default: 1
//!   - property: sort
//!     types: [STRING]
//!     enum: [asc, desc]
//! body:
//!   - property: name
//!     required: true
//!     types: [STRING]
//!     max: 64
//! ```
//!
//! A scope that is left out is not validated. A scope given as an empty
//! list accepts no properties at all.

use std::path::Path;

use input_rules_core::{PropertyType, Rule, RuleError, Ruleset, Scope, validate_rules};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::format::FileFormat;

/// Declarative form of a single [`Rule`].
///
/// # Examples
///
/// ```
/// # use input_rules_config::RuleSpec;
/// # use input_rules_core::PropertyType;
/// let spec: RuleSpec = serde_yaml::from_str(
///     "property: age\nrequired: true\ntypes: [NUMBER]\nmax: 120\n",
/// )
/// .unwrap();
/// let rule = spec.to_rule();
/// assert!(rule.is_required());
/// assert_eq!(rule.types(), &[PropertyType::Number]);
/// assert_eq!(rule.max_value(), Some(120));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Property name.
    pub property: String,
    /// Whether the property must be present.
    #[serde(default)]
    pub required: bool,
    /// Accepted types, in match order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<PropertyType>,
    /// Enum allow-list.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    /// Default seeded when absent. An explicit `null` is a configured default.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

// Maps a present key (including `null`) to `Some`; absent keys fall back to
// `#[serde(default)]`.
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl RuleSpec {
    /// Builds the equivalent [`Rule`].
    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(self.property.clone()).with_required(self.required);
        for &ty in &self.types {
            rule = rule.of_type(ty);
        }
        if let Some(allowed) = &self.allowed {
            rule = rule.one_of(allowed.iter().cloned());
        }
        if let Some(min) = self.min {
            rule = rule.min(min);
        }
        if let Some(max) = self.max {
            rule = rule.max(max);
        }
        if let Some(default) = &self.default {
            rule = rule.default(default.clone());
        }
        rule
    }
}

impl From<&Rule> for RuleSpec {
    fn from(rule: &Rule) -> Self {
        Self {
            property: rule.property_name().to_string(),
            required: rule.is_required(),
            types: rule.types().to_vec(),
            allowed: rule.allowed_values().map(<[Value]>::to_vec),
            min: rule.min_value(),
            max: rule.max_value(),
            default: rule.default_value().cloned(),
        }
    }
}

/// A rule-set definition file.
///
/// # Examples
///
/// ```no_run
/// use input_rules_config::RulesetConfig;
///
/// let config = RulesetConfig::load("rules/search.yml").unwrap();
/// let ruleset = config.to_ruleset().unwrap();
/// println!("{} query rule(s)", ruleset.rules(input_rules_core::Scope::Query).len());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesetConfig {
    /// Definition format version (e.g., `"1.0"`).
    pub version: String,
    /// Rules for query parameters; `None` leaves the scope unchecked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<RuleSpec>>,
    /// Rules for body fields; `None` leaves the scope unchecked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<RuleSpec>>,
}

impl RulesetConfig {
    /// Loads a definition from a `.json`, `.yml` or `.yaml` file.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](crate::ConfigError::UnsupportedFormat)
    /// for other extensions, [`IoError`](crate::ConfigError::IoError) if the
    /// file cannot be read, or a JSON/YAML error if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = FileFormat::load(path)?;
        debug!(
            path = %path.display(),
            query = ?config.query.as_ref().map(Vec::len),
            body = ?config.body.as_ref().map(Vec::len),
            "Loaded rule set"
        );
        Ok(config)
    }

    /// Parses a definition from a string in the given format.
    ///
    /// # Errors
    ///
    /// Returns a JSON/YAML error if parsing fails.
    pub fn parse(raw: &str, format: FileFormat) -> Result<Self> {
        format.parse(raw)
    }

    /// Saves the definition, choosing the format from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](crate::ConfigError::UnsupportedFormat),
    /// [`IoError`](crate::ConfigError::IoError), or a serialization error.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let raw = FileFormat::from_path(path)?.render(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Captures the rules registered in `ruleset`.
    pub fn from_ruleset(version: impl Into<String>, ruleset: &Ruleset) -> Self {
        let mut config = Self {
            version: version.into(),
            query: None,
            body: None,
        };
        for scope in ruleset.scopes() {
            let specs = ruleset.rules(scope).iter().map(RuleSpec::from).collect();
            *config.scope_mut(scope) = Some(specs);
        }
        config
    }

    /// Rule specs declared for `scope`, if the scope is present.
    pub fn scope(&self, scope: Scope) -> Option<&[RuleSpec]> {
        match scope {
            Scope::Query => self.query.as_deref(),
            Scope::Body => self.body.as_deref(),
        }
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut Option<Vec<RuleSpec>> {
        match scope {
            Scope::Query => &mut self.query,
            Scope::Body => &mut self.body,
        }
    }

    /// Builds rules per declared scope.
    pub fn rules(&self) -> Vec<(Scope, Vec<Rule>)> {
        Scope::ALL
            .into_iter()
            .filter_map(|scope| {
                self.scope(scope)
                    .map(|specs| (scope, specs.iter().map(RuleSpec::to_rule).collect()))
            })
            .collect()
    }

    /// Collects every rule definition problem without stopping at the first.
    pub fn lint(&self) -> Vec<RuleError> {
        self.rules()
            .iter()
            .flat_map(|(scope, rules)| validate_rules(*scope, rules))
            .collect()
    }

    /// Builds a [`Ruleset`] with every declared scope registered.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRule`](crate::ConfigError::InvalidRule) with the
    /// first rule definition problem found.
    pub fn to_ruleset(&self) -> Result<Ruleset> {
        let mut ruleset = Ruleset::new();
        for (scope, rules) in self.rules() {
            ruleset.add(scope, rules)?;
        }
        Ok(ruleset)
    }
}
