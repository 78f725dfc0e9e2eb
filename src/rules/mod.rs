//! Rule predicates and the ruleset that orders them.
//!
//! Each rule inspects one [`CodeUnit`] shape and returns at most one
//! [`Violation`]. Rules ignore units of other shapes, never see each other's
//! output, and hold only immutable tuning, so a [`Ruleset`] can be shared
//! across threads.
//!
//! # Example
//!
//! ```rust
//! use promise_lint::rules::{Ruleset, RuleSettings};
//!
//! let ruleset = Ruleset::with_settings(&RuleSettings::default());
//! assert_eq!(ruleset.len(), 12);
//! assert!(ruleset.get("unhandled-rejection-path").is_some());
//! ```

pub mod awaits;
pub mod callback;
pub mod chain;
pub mod constructor;
pub mod continuation;
pub mod loops;
pub mod race;
pub mod reject;

use crate::core::{CallChain, CodeUnit, Severity, UnitKind, Violation};
use crate::errors::{LintError, Result};
use regex::Regex;
use std::collections::HashSet;

pub use awaits::{AwaitNonDeferredRule, RedundantAwaitRule};
pub use callback::UncheckedCallbackErrorRule;
pub use chain::UnhandledRejectionRule;
pub use constructor::AsyncExecutorRule;
pub use continuation::{
    DirectCallbackInvocationRule, ReturnInFinalizerRule, UnreturnedValueRule, WrappedValueRule,
};
pub use loops::SequentialAwaitRule;
pub use race::ReadModifyWriteRaceRule;
pub use reject::NonErrorRejectionRule;

/// Stable rule identifiers.
pub mod ids {
    pub const UNRETURNED_VALUE_IN_CONTINUATION: &str = "unreturned-value-in-continuation";
    pub const UNHANDLED_REJECTION_PATH: &str = "unhandled-rejection-path";
    pub const DIRECT_CALLBACK_INVOCATION_IN_HANDLER: &str =
        "direct-callback-invocation-in-handler";
    pub const WRAPPED_VALUE_IN_CONTINUATION: &str = "wrapped-value-in-continuation";
    pub const RETURN_IN_FINALIZER: &str = "return-in-finalizer";
    pub const ASYNC_CONSTRUCTOR_CALLBACK: &str = "async-constructor-callback";
    pub const SEQUENTIAL_WAIT_IN_LOOP: &str = "sequential-wait-in-loop";
    pub const READ_MODIFY_WRITE_RACE: &str = "read-modify-write-race";
    pub const REDUNDANT_WAIT_BEFORE_RETURN: &str = "redundant-wait-before-return";
    pub const NON_ERROR_REJECTION: &str = "non-error-rejection";
    pub const WAIT_ON_NON_DEFERRED: &str = "wait-on-non-deferred";
    pub const UNCHECKED_CALLBACK_ERROR: &str = "unchecked-callback-error";

    /// Built-in ids in ruleset order.
    pub const ALL: [&str; 12] = [
        UNRETURNED_VALUE_IN_CONTINUATION,
        UNHANDLED_REJECTION_PATH,
        DIRECT_CALLBACK_INVOCATION_IN_HANDLER,
        WRAPPED_VALUE_IN_CONTINUATION,
        RETURN_IN_FINALIZER,
        ASYNC_CONSTRUCTOR_CALLBACK,
        SEQUENTIAL_WAIT_IN_LOOP,
        READ_MODIFY_WRITE_RACE,
        REDUNDANT_WAIT_BEFORE_RETURN,
        NON_ERROR_REJECTION,
        WAIT_ON_NON_DEFERRED,
        UNCHECKED_CALLBACK_ERROR,
    ];
}

/// A pure predicate over one code unit.
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;

    fn default_severity(&self) -> Severity;

    /// `Ok(None)` when the unit complies or is not of this rule's shape.
    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>>;
}

/// Tuning shared by the rules that recognise callbacks.
#[derive(Debug, Clone)]
pub struct RuleSettings {
    /// Identifiers treated as error-first callbacks when called.
    pub callback_names: Vec<String>,
    /// Matches the name of an error-first callback's error parameter.
    pub error_param: Regex,
}

pub const DEFAULT_CALLBACK_NAMES: [&str; 4] = ["callback", "cb", "done", "next"];
pub const DEFAULT_ERROR_PARAM_PATTERN: &str = "^(err|error)$";

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            callback_names: DEFAULT_CALLBACK_NAMES.iter().map(|s| s.to_string()).collect(),
            error_param: default_error_param(),
        }
    }
}

fn default_error_param() -> Regex {
    Regex::new(DEFAULT_ERROR_PARAM_PATTERN).expect("default error parameter pattern is valid")
}

impl RuleSettings {
    pub fn new(callback_names: Vec<String>, error_param_pattern: &str) -> Result<Self> {
        let error_param = Regex::new(error_param_pattern).map_err(|e| {
            LintError::configuration(format!(
                "invalid error parameter pattern '{error_param_pattern}': {e}"
            ))
        })?;
        Ok(Self {
            callback_names,
            error_param,
        })
    }
}

/// A rule together with the severity its findings carry.
pub struct RuleEntry {
    pub rule: Box<dyn Rule>,
    pub severity: Severity,
}

impl RuleEntry {
    pub fn new(rule: Box<dyn Rule>) -> Self {
        let severity = rule.default_severity();
        Self { rule, severity }
    }

    pub fn with_severity(rule: Box<dyn Rule>, severity: Severity) -> Self {
        Self { rule, severity }
    }
}

impl std::fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEntry")
            .field("rule", &self.rule.id())
            .field("severity", &self.severity)
            .finish()
    }
}

/// Ordered, non-empty set of rules with unique ids.
#[derive(Debug)]
pub struct Ruleset {
    entries: Vec<RuleEntry>,
}

impl Ruleset {
    /// Validate and build a ruleset. Fails on an empty list or a repeated id.
    pub fn new(entries: Vec<RuleEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(LintError::configuration("ruleset is empty"));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.rule.id().to_string()) {
                return Err(LintError::configuration(format!(
                    "duplicate rule id '{}'",
                    entry.rule.id()
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn from_rules(rules: Vec<Box<dyn Rule>>) -> Result<Self> {
        Self::new(rules.into_iter().map(RuleEntry::new).collect())
    }

    /// All twelve built-in rules at their default severities.
    pub fn with_settings(settings: &RuleSettings) -> Self {
        Self {
            entries: builtin_rules(settings)
                .into_iter()
                .map(RuleEntry::new)
                .collect(),
        }
    }

    /// Append a rule, keeping ids unique.
    pub fn push(&mut self, entry: RuleEntry) -> Result<()> {
        if self.get(entry.rule.id()).is_some() {
            return Err(LintError::configuration(format!(
                "duplicate rule id '{}'",
                entry.rule.id()
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RuleEntry> {
        self.entries.iter().find(|e| e.rule.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.rule.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::with_settings(&RuleSettings::default())
    }
}

/// Instantiate every built-in rule, in [`ids::ALL`] order.
pub fn builtin_rules(settings: &RuleSettings) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(UnreturnedValueRule),
        Box::new(UnhandledRejectionRule),
        Box::new(DirectCallbackInvocationRule::new(
            settings.callback_names.clone(),
        )),
        Box::new(WrappedValueRule),
        Box::new(ReturnInFinalizerRule),
        Box::new(AsyncExecutorRule),
        Box::new(SequentialAwaitRule),
        Box::new(ReadModifyWriteRaceRule),
        Box::new(RedundantAwaitRule),
        Box::new(NonErrorRejectionRule),
        Box::new(AwaitNonDeferredRule),
        Box::new(UncheckedCallbackErrorRule::new(settings.error_param.clone())),
    ]
}

/// Chains are malformed without at least one stage.
pub(crate) fn require_stages(rule: &str, chain: &CallChain) -> Result<()> {
    if chain.stages.is_empty() {
        return Err(LintError::invalid_unit(
            rule,
            UnitKind::Chain,
            "chain has no stages",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedRule(&'static str);

    impl Rule for NamedRule {
        fn id(&self) -> &str {
            self.0
        }

        fn default_severity(&self) -> Severity {
            Severity::Warning
        }

        fn check(&self, _unit: &CodeUnit) -> Result<Option<Violation>> {
            Ok(None)
        }
    }

    #[test]
    fn test_builtin_ruleset_order_matches_ids() {
        let ruleset = Ruleset::default();
        let rule_ids: Vec<&str> = ruleset.ids().collect();
        assert_eq!(rule_ids, ids::ALL.to_vec());
    }

    #[test]
    fn test_builtin_ruleset_passes_validation() {
        let rules = builtin_rules(&RuleSettings::default());
        assert!(Ruleset::from_rules(rules).is_ok());
    }

    #[test]
    fn test_empty_ruleset_rejected() {
        let err = Ruleset::new(Vec::new()).unwrap_err();
        assert!(matches!(err, LintError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Ruleset::from_rules(vec![Box::new(NamedRule("a")), Box::new(NamedRule("a"))])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate rule id 'a'"));
    }

    #[test]
    fn test_push_rejects_existing_id() {
        let mut ruleset = Ruleset::default();
        assert!(ruleset
            .push(RuleEntry::new(Box::new(NamedRule(ids::RETURN_IN_FINALIZER))))
            .is_err());
        assert!(ruleset.push(RuleEntry::new(Box::new(NamedRule("custom")))).is_ok());
        assert_eq!(ruleset.len(), 13);
    }

    #[test]
    fn test_invalid_error_param_pattern() {
        let err = RuleSettings::new(vec![], "(unclosed").unwrap_err();
        assert!(matches!(err, LintError::Configuration(_)));
    }
}
