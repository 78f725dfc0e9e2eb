//! Static checker for Promise and async/await anti-patterns.
//!
//! The core is a pattern classifier: it takes normalized [`CodeUnit`]s (call
//! chains, function bodies, loops, reject calls, error-first callbacks and
//! promise constructor calls) and runs a [`Ruleset`] over them, producing
//! [`Finding`]s. The JavaScript/TypeScript front end in
//! [`analyzers::javascript`] builds those units from source with tree-sitter.
//!
//! ```no_run
//! use promise_lint::config::load_config;
//! use promise_lint::analyzers::javascript::analyze_source;
//! use std::path::Path;
//!
//! # fn main() -> promise_lint::Result<()> {
//! let config = load_config(Path::new("."))?;
//! let ruleset = config.build_ruleset()?;
//! let settings = config.rule_settings()?;
//! let findings = analyze_source(
//!     "promiseObj.then(doSomething);",
//!     Path::new("app.js"),
//!     &ruleset,
//!     &settings,
//! )?;
//! println!("{}", promise_lint::findings_to_json(&findings).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod analyzers;
pub mod classifier;
pub mod config;
pub mod core;
pub mod errors;
pub mod rules;

pub use crate::classifier::{evaluate, evaluate_all};
pub use crate::config::{load_config, LintConfig};
pub use crate::core::{findings_to_json, CodeUnit, Finding, Severity, Span, UnitKind, Violation};
pub use crate::errors::{LintError, Result};
pub use crate::rules::{ids, Rule, RuleEntry, RuleSettings, Ruleset};
