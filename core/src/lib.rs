//! Declarative validation of request input.
//!
//! This crate defines the rule model and the evaluation engine:
//!
//! - [`Rule`]: constraints for one named property (presence, accepted
//!   types, enum allow-list, bounds, default), built with chained calls.
//! - [`Ruleset`]: rules grouped by [`Scope`], evaluated against a
//!   [`RequestInput`] in one pass that collects every violation.
//! - [`ErrorReport`]: violations indexed by scope and property, serialized
//!   as `{ scope: { property: { ERROR_KIND: expected } } }`.
//!
//! Rule definitions are checked up front ([`validate_rules`], [`RuleError`]);
//! invalid input is never an `Err` of the engine itself, only a report.
//!
//! # Example
//!
//! ```
//! use input_rules_core::*;
//! use serde_json::json;
//!
//! let mut ruleset = Ruleset::new();
//! ruleset
//!     .add(
//!         Scope::Query,
//!         [
//!             Rule::new("page").of_type(PropertyType::Number).min(1).default(1),
//!             Rule::new("debug").of_type(PropertyType::Boolean),
//!         ],
//!     )
//!     .unwrap();
//!
//! let mut request = RequestInput::new()
//!     .with_query(ScopeInput::from_pairs(Scope::Query, [("debug", "on")]));
//!
//! assert!(ruleset.evaluate(&mut request).is_ok());
//! // Absent optional property seeded with its default, token coerced.
//! assert_eq!(request.query().get("page"), Some(&json!(1)));
//! assert_eq!(request.query().get("debug"), Some(&json!(true)));
//! ```
//!
//! Nested object schemas are not evaluated: `OBJECT` matches any JSON object
//! without descending into its keys.

mod input;
mod report;
mod rule;
mod ruleset;
mod types;
mod validate;

pub use input::{RequestInput, ScopeInput};
pub use report::{Detail, ErrorKind, ErrorReport, ValidationError};
pub use rule::Rule;
pub use ruleset::Ruleset;
pub use types::{PropertyType, Scope};
pub use validate::{RuleError, validate_rules};
