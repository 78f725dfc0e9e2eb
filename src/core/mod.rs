//! Core types shared by the rules, the classifier and the front end.

pub mod ast;
pub mod unit;
pub mod visit;

use serde::{Deserialize, Serialize};

pub use unit::{
    AssignOp, Body, CallChain, CallbackDecl, ChainStage, CodeUnit, ConstructorCall, Expr,
    ExprKind, FunctionBody, Literal, LoopBody, LoopKind, RejectCall, RejectCallee, StageKind,
    Stmt, StmtKind, SwitchCase, UnitKind,
};

/// Byte range in the analyzed source, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Severity, &str)] = &[
            (Severity::Warning, "warning"),
            (Severity::Error, "error"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// What a rule reports before the classifier attaches its id and severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
    pub span: Span,
}

impl Violation {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Convert this violation into a finding for the rule that produced it.
    pub fn into_finding(self, rule_id: &str, severity: Severity) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            message: self.message,
            severity,
            span: self.span,
        }
    }
}

/// A single rule hit on a code unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
    pub span: Span,
}

/// Render findings as a pretty-printed JSON array.
pub fn findings_to_json(findings: &[Finding]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finding_serializes_with_camel_case_keys() {
        let finding = Violation::new("no catch", Span::new(3, 17))
            .into_finding("unhandled-rejection-path", Severity::Error);

        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ruleId": "unhandled-rejection-path",
                "message": "no catch",
                "severity": "error",
                "span": { "start": 3, "end": 17 }
            })
        );
    }

    #[test]
    fn test_severity_parse_and_display() {
        assert_eq!("Error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
