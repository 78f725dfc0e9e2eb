use super::{ids, Rule};
use crate::core::{CodeUnit, Expr, ExprKind, Literal, RejectCallee, Severity, UnitKind, Violation};
use crate::errors::{LintError, Result};

/// What a rejection reason is, when it can be told from syntax alone.
fn non_error_reason(arg: &Expr) -> Option<&'static str> {
    match &arg.kind {
        ExprKind::Literal(Literal::Str(_)) | ExprKind::Literal(Literal::Template) => {
            Some("a string")
        }
        ExprKind::Literal(Literal::Undefined) => Some("undefined"),
        ExprKind::Literal(_) => Some("a primitive literal"),
        ExprKind::Ident(name) if name == "undefined" => Some("undefined"),
        ExprKind::Object(_) => Some("a plain object"),
        ExprKind::Array(_) => Some("an array"),
        _ => None,
    }
}

/// Rejection reasons must be `Error` instances so stack traces survive.
/// Identifiers and calls are opaque and pass.
pub struct NonErrorRejectionRule;

impl Rule for NonErrorRejectionRule {
    fn id(&self) -> &str {
        ids::NON_ERROR_REJECTION
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::RejectCall(call) = unit else {
            return Ok(None);
        };

        let callee = match &call.callee {
            RejectCallee::ExecutorParam(name) if name.is_empty() => {
                return Err(LintError::invalid_unit(
                    self.id(),
                    UnitKind::RejectCall,
                    "reject call has an empty callee name",
                ));
            }
            RejectCallee::ExecutorParam(name) => name.as_str(),
            RejectCallee::PromiseReject => "Promise.reject",
        };

        let Some(argument) = &call.argument else {
            return Ok(Some(Violation::new(
                format!("{callee}() called without a reason; pass an Error"),
                call.span,
            )));
        };

        Ok(non_error_reason(argument).map(|what| {
            Violation::new(
                format!("{callee}() called with {what}; reject with an Error instance"),
                argument.span,
            )
        }))
    }
}
