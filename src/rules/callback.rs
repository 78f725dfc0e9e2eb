use super::{ids, Rule};
use crate::core::visit::{body_references, expr_references, stmt_references};
use crate::core::{Body, CallbackDecl, CodeUnit, Severity, Span, StmtKind, UnitKind, Violation};
use crate::errors::{LintError, Result};
use regex::Regex;

/// Error-first callbacks must branch on the error before touching results.
pub struct UncheckedCallbackErrorRule {
    error_param: Regex,
}

impl UncheckedCallbackErrorRule {
    pub fn new(error_param: Regex) -> Self {
        Self { error_param }
    }

    /// First statement that reads a result before an `if` tests the error.
    fn unchecked_use(&self, callback: &CallbackDecl, err: &str) -> Option<(String, Span)> {
        let results = &callback.params[1..];

        match &callback.body {
            Body::Expression(expr) => {
                if expr_references(expr, err) {
                    return None;
                }
                first_used(results, |name| expr_references(expr, name))
                    .map(|name| (name.clone(), expr.span))
            }
            Body::Block(stmts) => {
                for stmt in stmts {
                    if let StmtKind::If { condition, .. } = &stmt.kind {
                        if expr_references(condition, err) {
                            return None;
                        }
                    }
                    if let Some(name) = first_used(results, |name| stmt_references(stmt, name)) {
                        return Some((name.clone(), stmt.span));
                    }
                }
                None
            }
        }
    }
}

fn first_used(names: &[String], used: impl Fn(&str) -> bool) -> Option<&String> {
    names.iter().find(|name| used(name.as_str()))
}

impl Rule for UncheckedCallbackErrorRule {
    fn id(&self) -> &str {
        ids::UNCHECKED_CALLBACK_ERROR
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Callback(callback) = unit else {
            return Ok(None);
        };
        let Some(err) = callback.params.first() else {
            return Err(LintError::invalid_unit(
                self.id(),
                UnitKind::Callback,
                "callback declares no parameters",
            ));
        };
        if !self.error_param.is_match(err) {
            return Ok(None);
        }

        if let Some((name, span)) = self.unchecked_use(callback, err) {
            return Ok(Some(Violation::new(
                format!("`{name}` is used before `{err}` is checked"),
                span,
            )));
        }

        if !body_references(&callback.body, err) {
            return Ok(Some(Violation::new(
                format!("error parameter `{err}` is never handled"),
                callback.span,
            )));
        }

        Ok(None)
    }
}
