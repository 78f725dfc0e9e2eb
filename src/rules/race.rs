use super::{ids, Rule};
use crate::core::visit::{expr_contains_await, expr_references, walk_expr, walk_stmt, Visit};
use crate::core::{
    Body, CodeUnit, Expr, ExprKind, FunctionBody, LoopBody, Severity, Stmt, StmtKind, Violation,
};
use crate::errors::Result;
use std::collections::HashSet;

/// Names declared directly in one statement list.
fn declared_in(stmts: &[Stmt]) -> HashSet<&str> {
    stmts
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::Declare { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

/// Finds an assignment to a name not bound in any enclosing scope of the
/// function. Each statement list is a block scope; loop bindings and the
/// catch parameter are visible only in their own body.
struct RacyAssignFinder<'a> {
    scopes: Vec<HashSet<&'a str>>,
    found: Option<(&'a Expr, &'a str)>,
}

impl<'a> RacyAssignFinder<'a> {
    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn scoped(&mut self, mut scope: HashSet<&'a str>, stmts: &'a [Stmt]) {
        scope.extend(declared_in(stmts));
        self.scopes.push(scope);
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn block(&mut self, stmts: &'a [Stmt]) {
        self.scoped(HashSet::new(), stmts);
    }
}

impl<'a> Visit<'a> for RacyAssignFinder<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if self.found.is_some() {
            return;
        }
        match &stmt.kind {
            StmtKind::If {
                condition,
                consequence,
                alternative,
            } => {
                self.visit_expr(condition);
                self.block(consequence);
                self.block(alternative);
            }
            StmtKind::Block(stmts) => self.block(stmts),
            StmtKind::Try {
                block,
                handler_param,
                handler,
                finalizer,
            } => {
                self.block(block);
                self.scoped(handler_param.iter().map(String::as_str).collect(), handler);
                self.block(finalizer);
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.visit_expr(discriminant);
                let scope = cases.iter().flat_map(|case| declared_in(&case.body)).collect();
                self.scopes.push(scope);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test);
                    }
                    for stmt in &case.body {
                        self.visit_stmt(stmt);
                    }
                }
                self.scopes.pop();
            }
            StmtKind::Other { exprs, stmts } => {
                for expr in exprs {
                    self.visit_expr(expr);
                }
                self.block(stmts);
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_loop(&mut self, body: &'a LoopBody) {
        self.scopes
            .push(body.bindings.iter().map(String::as_str).collect());
        for expr in &body.header {
            self.visit_expr(expr);
        }
        self.block(&body.body);
        self.scopes.pop();
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        if self.found.is_some() {
            return;
        }
        if let ExprKind::Assign { target, op, value } = &expr.kind {
            if let Some(name) = target.root_ident() {
                let reads_before_await = op.is_compound() || expr_references(value, name);
                if !self.is_local(name) && reads_before_await && expr_contains_await(value) {
                    self.found = Some((expr, name));
                    return;
                }
            }
        }
        walk_expr(self, expr);
    }
}

fn find_racy_assignment(function: &FunctionBody) -> Option<(&Expr, &str)> {
    let mut finder = RacyAssignFinder {
        scopes: vec![function.params.iter().map(String::as_str).collect()],
        found: None,
    };
    match &function.body {
        Body::Expression(expr) => finder.visit_expr(expr),
        Body::Block(stmts) => finder.block(stmts),
    }
    finder.found
}

/// `total += await fetchValue()` in an async function reads `total` before
/// suspending and writes it after; concurrent calls overwrite each other.
pub struct ReadModifyWriteRaceRule;

impl Rule for ReadModifyWriteRaceRule {
    fn id(&self) -> &str {
        ids::READ_MODIFY_WRITE_RACE
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Function(function) = unit else {
            return Ok(None);
        };
        if !function.is_async {
            return Ok(None);
        }

        Ok(find_racy_assignment(function).map(|(assign, name)| {
            Violation::new(
                format!(
                    "`{name}` is read before an await and written after it; \
                     concurrent calls lose updates. Await into a local first"
                ),
                assign.span,
            )
        }))
    }
}
