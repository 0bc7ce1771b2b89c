//! Rule-set definition files and request documents for `input-rules`.
//!
//! This crate loads the declarative side of validation from disk:
//!
//! - [`RulesetConfig`]: per-scope rule definitions in YAML or JSON, turned
//!   into an [`input_rules_core::Ruleset`].
//! - [`RequestDocument`]: captured query and body values, turned into an
//!   [`input_rules_core::RequestInput`].
//!
//! # Quick start
//!
//! ```no_run
//! use input_rules_config::{RequestDocument, RulesetConfig};
//!
//! let mut ruleset = RulesetConfig::load("rules.yml").unwrap().to_ruleset().unwrap();
//! let mut request = RequestDocument::load("request.json").unwrap().into_input();
//!
//! match ruleset.evaluate(&mut request) {
//!     Ok(()) => println!("valid"),
//!     Err(report) => print!("{report}"),
//! }
//! ```

mod error;
mod format;
mod request;
mod rules;

pub use error::{ConfigError, Result};
pub use format::FileFormat;
pub use request::RequestDocument;
pub use rules::{RuleSpec, RulesetConfig};
