//! Rules about what an `await` is applied to and where it sits.

use super::{ids, Rule};
use crate::core::visit::{
    walk_body, walk_expr, walk_stmt, walk_stmts, AwaitCollector, Visit,
};
use crate::core::{
    Body, CodeUnit, Expr, ExprKind, FunctionBody, Severity, Span, Stmt, StmtKind, Violation,
};
use crate::errors::Result;
use std::collections::HashSet;

/// Finds `return await x` outside the protected part of a `try`.
#[derive(Default)]
struct ReturnAwaitFinder<'a> {
    found: Option<&'a Stmt>,
}

impl<'a> Visit<'a> for ReturnAwaitFinder<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if self.found.is_some() {
            return;
        }
        match &stmt.kind {
            StmtKind::Return(Some(value)) if matches!(value.kind, ExprKind::Await(_)) => {
                self.found = Some(stmt);
            }
            // Awaiting is what makes a rejection reach the catch/finally.
            StmtKind::Try {
                handler, finalizer, ..
            } => {
                if finalizer.is_empty() {
                    walk_stmts(self, handler);
                }
                walk_stmts(self, finalizer);
            }
            _ => walk_stmt(self, stmt),
        }
    }
}

/// `const v = await x; return v;` as the closing statements.
fn await_then_return_local(stmts: &[Stmt]) -> Option<&Stmt> {
    let [.., declare, ret] = stmts else {
        return None;
    };
    let StmtKind::Declare {
        name,
        init: Some(init),
    } = &declare.kind
    else {
        return None;
    };
    let StmtKind::Return(Some(returned)) = &ret.kind else {
        return None;
    };

    let awaited = matches!(init.kind, ExprKind::Await(_));
    (awaited && returned.as_ident() == Some(name.as_str())).then_some(declare)
}

fn redundant_await(function: &FunctionBody) -> Option<(&'static str, Span)> {
    match &function.body {
        Body::Expression(expr) => matches!(expr.kind, ExprKind::Await(_))
            .then_some(("async arrow returns `await x`; return `x` directly", expr.span)),
        Body::Block(stmts) => {
            let mut finder = ReturnAwaitFinder::default();
            walk_stmts(&mut finder, stmts);
            if let Some(stmt) = finder.found {
                return Some(("`return await x` outside try; return `x` directly", stmt.span));
            }
            await_then_return_local(stmts).map(|declare| {
                (
                    "value is awaited only to be returned; return the promise directly",
                    declare.span,
                )
            })
        }
    }
}

pub struct RedundantAwaitRule;

impl Rule for RedundantAwaitRule {
    fn id(&self) -> &str {
        ids::REDUNDANT_WAIT_BEFORE_RETURN
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Function(function) = unit else {
            return Ok(None);
        };
        if !function.is_async {
            return Ok(None);
        }

        Ok(redundant_await(function).map(|(message, span)| Violation::new(message, span)))
    }
}

/// Names assigned anywhere in a function, closures included.
#[derive(Default)]
struct AssignedNames<'a> {
    names: HashSet<&'a str>,
}

impl<'a> Visit<'a> for AssignedNames<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if let ExprKind::Assign { target, .. } = &expr.kind {
            if let Some(name) = target.as_ident() {
                self.names.insert(name);
            }
        }
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, function: &'a FunctionBody) {
        walk_body(self, &function.body);
    }
}

/// Locals initialised from a value that cannot be a promise and never
/// assigned afterwards.
struct PlainLocals<'a> {
    reassigned: HashSet<&'a str>,
    names: HashSet<&'a str>,
}

impl<'a> PlainLocals<'a> {
    fn of(body: &'a Body) -> Self {
        let mut assigned = AssignedNames::default();
        walk_body(&mut assigned, body);

        let mut locals = Self {
            reassigned: assigned.names,
            names: HashSet::new(),
        };
        walk_body(&mut locals, body);
        locals
    }
}

impl<'a> Visit<'a> for PlainLocals<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if let StmtKind::Declare {
            name,
            init: Some(init),
        } = &stmt.kind
        {
            if !self.reassigned.contains(name.as_str()) && is_plain_value(init, &self.names) {
                self.names.insert(name);
            }
        }
        walk_stmt(self, stmt);
    }
}

/// Whether the expression syntactically evaluates to a non-thenable value.
fn is_plain_value(expr: &Expr, plain_locals: &HashSet<&str>) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Array(_) | ExprKind::Object(_) => true,
        ExprKind::Ident(name) => name == "undefined" || plain_locals.contains(name.as_str()),
        ExprKind::Binary { op, .. } => !matches!(op.as_str(), "&&" | "||" | "??" | ","),
        ExprKind::Unary { .. } => true,
        _ => false,
    }
}

fn describe(expr: &Expr) -> &'static str {
    match &expr.kind {
        ExprKind::Array(_) => "an array literal (use Promise.all)",
        ExprKind::Object(_) => "an object literal",
        ExprKind::Literal(_) => "a literal",
        ExprKind::Ident(_) => "a variable holding a plain value",
        _ => "an expression that is never a promise",
    }
}

pub struct AwaitNonDeferredRule;

impl Rule for AwaitNonDeferredRule {
    fn id(&self) -> &str {
        ids::WAIT_ON_NON_DEFERRED
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Function(function) = unit else {
            return Ok(None);
        };

        let plain = PlainLocals::of(&function.body);

        let mut awaits = AwaitCollector::default();
        walk_body(&mut awaits, &function.body);

        for await_expr in awaits.awaits {
            let ExprKind::Await(operand) = &await_expr.kind else {
                continue;
            };
            if is_plain_value(operand, &plain.names) {
                return Ok(Some(Violation::new(
                    format!("await applied to {}", describe(operand)),
                    await_expr.span,
                )));
            }
        }

        Ok(None)
    }
}
