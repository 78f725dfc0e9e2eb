//! `.promiselint.toml` configuration.
//!
//! ```toml
//! [rules]
//! disabled = ["redundant-wait-before-return"]
//!
//! [rules.severity]
//! "sequential-wait-in-loop" = "error"
//!
//! [callbacks]
//! names = ["callback", "cb", "done", "next"]
//! error_param = "^(err|error)$"
//! ```
//!
//! Every section is optional. The configuration is turned into a validated
//! [`Ruleset`] once, at startup.

mod loader;

pub use loader::{
    directory_ancestors, find_config_file, load_config, load_config_from_path,
    parse_and_validate_config, CONFIG_FILE_NAME,
};

use crate::core::Severity;
use crate::errors::{LintError, Result};
use crate::rules::{
    builtin_rules, ids, RuleEntry, RuleSettings, Ruleset, DEFAULT_CALLBACK_NAMES,
    DEFAULT_ERROR_PARAM_PATTERN,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintConfig {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub callbacks: CallbackConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Rule ids left out of the ruleset.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Per-rule severity overrides.
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallbackConfig {
    #[serde(default = "default_callback_names")]
    pub names: Vec<String>,
    #[serde(default = "default_error_param")]
    pub error_param: String,
}

fn default_callback_names() -> Vec<String> {
    DEFAULT_CALLBACK_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_error_param() -> String {
    DEFAULT_ERROR_PARAM_PATTERN.to_string()
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            names: default_callback_names(),
            error_param: default_error_param(),
        }
    }
}

impl LintConfig {
    /// Reject ids that name no built-in rule.
    pub fn validate(&self) -> Result<()> {
        let unknown = self
            .rules
            .disabled
            .iter()
            .chain(self.rules.severity.keys())
            .find(|id| !ids::ALL.contains(&id.as_str()));

        match unknown {
            Some(id) => Err(LintError::configuration(format!("unknown rule id '{id}'"))),
            None => Ok(()),
        }
    }

    pub fn rule_settings(&self) -> Result<RuleSettings> {
        RuleSettings::new(self.callbacks.names.clone(), &self.callbacks.error_param)
    }

    /// Build the ruleset: built-in order, minus disabled rules, with
    /// severity overrides applied.
    pub fn build_ruleset(&self) -> Result<Ruleset> {
        self.validate()?;
        let settings = self.rule_settings()?;

        let entries = builtin_rules(&settings)
            .into_iter()
            .filter(|rule| !self.rules.disabled.iter().any(|id| id == rule.id()))
            .map(|rule| match self.rules.severity.get(rule.id()).copied() {
                Some(severity) => RuleEntry::with_severity(rule, severity),
                None => RuleEntry::new(rule),
            })
            .collect();

        Ruleset::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_default_config_builds_full_ruleset() {
        let ruleset = LintConfig::default().build_ruleset().unwrap();
        assert_eq!(ruleset.len(), ids::ALL.len());
    }

    #[test]
    fn test_disabled_and_severity_override() {
        let config = parse_and_validate_config(indoc! {r#"
            [rules]
            disabled = ["redundant-wait-before-return"]

            [rules.severity]
            "sequential-wait-in-loop" = "error"
        "#})
        .unwrap();

        let ruleset = config.build_ruleset().unwrap();
        assert_eq!(ruleset.len(), ids::ALL.len() - 1);
        assert!(ruleset.get(ids::REDUNDANT_WAIT_BEFORE_RETURN).is_none());
        assert_eq!(
            ruleset.get(ids::SEQUENTIAL_WAIT_IN_LOOP).map(|e| e.severity),
            Some(Severity::Error)
        );
        assert_eq!(
            ruleset.get(ids::WAIT_ON_NON_DEFERRED).map(|e| e.severity),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn test_unknown_rule_id_rejected() {
        let config = LintConfig {
            rules: RulesConfig {
                disabled: vec!["no-such-rule".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.build_ruleset().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown rule id 'no-such-rule'"
        );
    }

    #[test]
    fn test_disabling_everything_is_a_configuration_error() {
        let config = LintConfig {
            rules: RulesConfig {
                disabled: ids::ALL.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.build_ruleset(),
            Err(LintError::Configuration(_))
        ));
    }

    #[test]
    fn test_bad_error_param_pattern_rejected() {
        let config = LintConfig {
            callbacks: CallbackConfig {
                error_param: "[".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.build_ruleset().is_err());
    }
}
