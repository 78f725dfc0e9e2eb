//! Rules over the handlers passed to `then`, `catch` and `finally`.

use super::{ids, require_stages, Rule};
use crate::core::visit::{walk_expr, walk_stmt, walk_stmts, Visit};
use crate::core::{
    Body, CallChain, CodeUnit, Expr, ExprKind, FunctionBody, Severity, StageKind, Stmt, StmtKind,
    SwitchCase, Violation,
};
use crate::errors::Result;

/// Collects `return` statements of one function, skipping nested functions.
#[derive(Default)]
struct ReturnCollector<'a> {
    returns: Vec<&'a Stmt>,
}

impl<'a> Visit<'a> for ReturnCollector<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if matches!(stmt.kind, StmtKind::Return(_)) {
            self.returns.push(stmt);
        }
        walk_stmt(self, stmt);
    }
}

fn returns_of(stmts: &[Stmt]) -> Vec<&Stmt> {
    let mut collector = ReturnCollector::default();
    walk_stmts(&mut collector, stmts);
    collector.returns
}

/// Values a handler hands back: the concise body, or every `return <expr>`.
fn returned_values(handler: &FunctionBody) -> Vec<&Expr> {
    match &handler.body {
        Body::Expression(expr) => vec![expr],
        Body::Block(stmts) => returns_of(stmts)
            .into_iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::Return(Some(value)) => Some(value),
                _ => None,
            })
            .collect(),
    }
}

fn handlers_in<'a>(
    chain: &'a CallChain,
    kinds: &'a [StageKind],
) -> impl Iterator<Item = &'a FunctionBody> + 'a {
    chain
        .stages
        .iter()
        .filter(move |stage| kinds.contains(&stage.kind))
        .flat_map(|stage| stage.inline_handlers())
}

/// Whether every path through `stmts` ends in `return <value>` or `throw`.
fn always_exits(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_exits)
}

fn stmt_exits(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(value) => value.is_some(),
        StmtKind::Throw(_) => true,
        StmtKind::If {
            consequence,
            alternative,
            ..
        } => always_exits(consequence) && always_exits(alternative),
        StmtKind::Block(stmts) => always_exits(stmts),
        StmtKind::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            always_exits(finalizer)
                || (always_exits(block) && (handler.is_empty() || always_exits(handler)))
        }
        StmtKind::Switch { cases, .. } => switch_exits(cases),
        _ => false,
    }
}

/// A `switch` exits when it has a `default` and every case reaches a
/// returning body, falling through empty or non-breaking cases, before any
/// `break`.
fn switch_exits(cases: &[SwitchCase]) -> bool {
    if !cases.iter().any(|case| case.test.is_none()) {
        return false;
    }
    // Walk backwards so each case knows whether falling through exits.
    let mut next_exits = false;
    for case in cases.iter().rev() {
        let exits = always_exits(&case.body) || (!breaks_out(&case.body) && next_exits);
        if !exits {
            return false;
        }
        next_exits = exits;
    }
    true
}

/// Whether a `break` in these statements leaves the enclosing `switch`.
fn breaks_out(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::Break => true,
        StmtKind::If {
            consequence,
            alternative,
            ..
        } => breaks_out(consequence) || breaks_out(alternative),
        StmtKind::Block(stmts) => breaks_out(stmts),
        StmtKind::Try {
            block,
            handler,
            finalizer,
            ..
        } => breaks_out(block) || breaks_out(handler) || breaks_out(finalizer),
        _ => false,
    })
}

pub struct UnreturnedValueRule;

impl Rule for UnreturnedValueRule {
    fn id(&self) -> &str {
        ids::UNRETURNED_VALUE_IN_CONTINUATION
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Chain(chain) = unit else {
            return Ok(None);
        };
        require_stages(self.id(), chain)?;

        for handler in handlers_in(chain, &[StageKind::Then]) {
            let Some(stmts) = handler.block() else {
                continue;
            };

            let bare_return = returns_of(stmts)
                .into_iter()
                .find(|stmt| matches!(stmt.kind, StmtKind::Return(None)));
            if let Some(stmt) = bare_return {
                return Ok(Some(Violation::new(
                    "then() handler has a bare `return;`; return a value or throw",
                    stmt.span,
                )));
            }

            if !always_exits(stmts) {
                return Ok(Some(Violation::new(
                    "then() handler can finish without returning a value or throwing",
                    handler.span,
                )));
            }
        }

        Ok(None)
    }
}

struct CallbackCallFinder<'a, 'n> {
    names: &'n [String],
    found: Option<&'a Expr>,
}

impl<'a> Visit<'a> for CallbackCallFinder<'a, '_> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if self.found.is_some() {
            return;
        }
        if let Some(name) = expr.called_ident() {
            if self.names.iter().any(|n| n == name) {
                self.found = Some(expr);
                return;
            }
        }
        walk_expr(self, expr);
    }
}

pub struct DirectCallbackInvocationRule {
    callback_names: Vec<String>,
}

impl DirectCallbackInvocationRule {
    pub fn new(callback_names: Vec<String>) -> Self {
        Self { callback_names }
    }
}

impl Rule for DirectCallbackInvocationRule {
    fn id(&self) -> &str {
        ids::DIRECT_CALLBACK_INVOCATION_IN_HANDLER
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Chain(chain) = unit else {
            return Ok(None);
        };
        require_stages(self.id(), chain)?;

        for handler in handlers_in(chain, &[StageKind::Then, StageKind::Catch]) {
            let mut finder = CallbackCallFinder {
                names: &self.callback_names,
                found: None,
            };
            match &handler.body {
                Body::Expression(expr) => finder.visit_expr(expr),
                Body::Block(stmts) => walk_stmts(&mut finder, stmts),
            }

            if let Some(call) = finder.found {
                let name = call.called_ident().unwrap_or("callback");
                return Ok(Some(Violation::new(
                    format!(
                        "`{name}` is called inside a promise handler; an exception it throws \
                         re-enters the chain. Defer it with setImmediate/setTimeout"
                    ),
                    call.span,
                )));
            }
        }

        Ok(None)
    }
}

pub struct WrappedValueRule;

impl Rule for WrappedValueRule {
    fn id(&self) -> &str {
        ids::WRAPPED_VALUE_IN_CONTINUATION
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Chain(chain) = unit else {
            return Ok(None);
        };
        require_stages(self.id(), chain)?;

        for handler in handlers_in(chain, &[StageKind::Then, StageKind::Catch]) {
            for value in returned_values(handler) {
                let message = match value.static_call_on("Promise") {
                    Some("resolve") => {
                        "Handler returns Promise.resolve(...); return the value directly"
                    }
                    Some("reject") => "Handler returns Promise.reject(...); throw instead",
                    _ => continue,
                };
                return Ok(Some(Violation::new(message, value.span)));
            }
        }

        Ok(None)
    }
}

pub struct ReturnInFinalizerRule;

impl Rule for ReturnInFinalizerRule {
    fn id(&self) -> &str {
        ids::RETURN_IN_FINALIZER
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Chain(chain) = unit else {
            return Ok(None);
        };
        require_stages(self.id(), chain)?;

        for handler in handlers_in(chain, &[StageKind::Finally]) {
            let Some(stmts) = handler.block() else {
                continue;
            };
            if let Some(stmt) = returns_of(stmts).first() {
                return Ok(Some(Violation::new(
                    "finally() handler returns; its value is ignored",
                    stmt.span,
                )));
            }
        }

        Ok(None)
    }
}

/// Exposed for the chain rule: whether the expression is a function value.
pub(crate) fn is_handler(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Function(_) | ExprKind::Ident(_) | ExprKind::Member { .. })
}
