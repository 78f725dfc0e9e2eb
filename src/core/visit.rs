//! Read-only traversal over unit bodies, in the style of `syn::visit`.
//!
//! Nested functions are separate scopes: the default [`Visit::visit_function`]
//! does not descend into them. Override it to opt in.

use super::unit::{Body, Expr, ExprKind, FunctionBody, LoopBody, Stmt, StmtKind};

pub trait Visit<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }

    fn visit_loop(&mut self, body: &'a LoopBody) {
        walk_loop(self, body);
    }

    fn visit_function(&mut self, _function: &'a FunctionBody) {}
}

pub fn walk_stmts<'a, V: Visit<'a> + ?Sized>(visitor: &mut V, stmts: &'a [Stmt]) {
    for stmt in stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_body<'a, V: Visit<'a> + ?Sized>(visitor: &mut V, body: &'a Body) {
    match body {
        Body::Expression(expr) => visitor.visit_expr(expr),
        Body::Block(stmts) => walk_stmts(visitor, stmts),
    }
}

pub fn walk_stmt<'a, V: Visit<'a> + ?Sized>(visitor: &mut V, stmt: &'a Stmt) {
    match &stmt.kind {
        StmtKind::Expr(expr) | StmtKind::Throw(expr) => visitor.visit_expr(expr),
        StmtKind::Declare { init, .. } => {
            if let Some(init) = init {
                visitor.visit_expr(init);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::If {
            condition,
            consequence,
            alternative,
        } => {
            visitor.visit_expr(condition);
            walk_stmts(visitor, consequence);
            walk_stmts(visitor, alternative);
        }
        StmtKind::Loop(body) => visitor.visit_loop(body),
        StmtKind::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            walk_stmts(visitor, block);
            walk_stmts(visitor, handler);
            walk_stmts(visitor, finalizer);
        }
        StmtKind::Block(stmts) => walk_stmts(visitor, stmts),
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            visitor.visit_expr(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    visitor.visit_expr(test);
                }
                walk_stmts(visitor, &case.body);
            }
        }
        StmtKind::Break => {}
        StmtKind::Other { exprs, stmts } => {
            for expr in exprs {
                visitor.visit_expr(expr);
            }
            walk_stmts(visitor, stmts);
        }
    }
}

pub fn walk_loop<'a, V: Visit<'a> + ?Sized>(visitor: &mut V, body: &'a LoopBody) {
    for expr in &body.header {
        visitor.visit_expr(expr);
    }
    walk_stmts(visitor, &body.body);
}

pub fn walk_expr<'a, V: Visit<'a> + ?Sized>(visitor: &mut V, expr: &'a Expr) {
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::Literal(_) => {}
        ExprKind::Array(items) | ExprKind::Object(items) | ExprKind::Opaque(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        ExprKind::Call { callee, args } | ExprKind::New {
            constructor: callee,
            args,
        } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Member { object, .. } => visitor.visit_expr(object),
        ExprKind::Await(inner) => visitor.visit_expr(inner),
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Function(function) => visitor.visit_function(function),
        ExprKind::Assign { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
    }
}

struct AwaitFinder<'a> {
    first: Option<&'a Expr>,
}

impl<'a> Visit<'a> for AwaitFinder<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if self.first.is_some() {
            return;
        }
        if matches!(expr.kind, ExprKind::Await(_)) {
            self.first = Some(expr);
            return;
        }
        walk_expr(self, expr);
    }
}

/// First `await` in the statements, outside nested functions.
pub fn first_await(stmts: &[Stmt]) -> Option<&Expr> {
    let mut finder = AwaitFinder { first: None };
    walk_stmts(&mut finder, stmts);
    finder.first
}

pub fn expr_contains_await(expr: &Expr) -> bool {
    let mut finder = AwaitFinder { first: None };
    finder.visit_expr(expr);
    finder.first.is_some()
}

/// Collects every `await` expression outside nested functions.
#[derive(Default)]
pub struct AwaitCollector<'a> {
    pub awaits: Vec<&'a Expr>,
}

impl<'a> Visit<'a> for AwaitCollector<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if matches!(expr.kind, ExprKind::Await(_)) {
            self.awaits.push(expr);
        }
        walk_expr(self, expr);
    }
}

struct IdentFinder<'n> {
    name: &'n str,
    found: bool,
}

impl<'a> Visit<'a> for IdentFinder<'_> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if self.found {
            return;
        }
        if expr.as_ident() == Some(self.name) {
            self.found = true;
            return;
        }
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, function: &'a FunctionBody) {
        // Closures capture the enclosing scope, so a use inside one still counts.
        if !function.params.iter().any(|p| p == self.name) {
            walk_body(self, &function.body);
        }
    }
}

/// Whether `name` is read anywhere in the expression, closures included.
pub fn expr_references(expr: &Expr, name: &str) -> bool {
    let mut finder = IdentFinder { name, found: false };
    finder.visit_expr(expr);
    finder.found
}

/// Whether `name` is read anywhere in the statement, closures included.
pub fn stmt_references(stmt: &Stmt, name: &str) -> bool {
    let mut finder = IdentFinder { name, found: false };
    finder.visit_stmt(stmt);
    finder.found
}

pub fn body_references(body: &Body, name: &str) -> bool {
    let mut finder = IdentFinder { name, found: false };
    walk_body(&mut finder, body);
    finder.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Span;

    fn sp() -> Span {
        Span::default()
    }

    fn await_of(name: &str) -> Expr {
        Expr::new(ExprKind::Await(Box::new(Expr::ident(name, sp()))), sp())
    }

    #[test]
    fn test_first_await_skips_nested_functions() {
        let nested = Expr::new(
            ExprKind::Function(Box::new(FunctionBody {
                name: None,
                params: vec![],
                is_async: true,
                body: Body::Expression(await_of("inner")),
                span: sp(),
            })),
            sp(),
        );
        let stmts = vec![Stmt::new(StmtKind::Expr(nested), sp())];
        assert!(first_await(&stmts).is_none());

        let stmts = vec![Stmt::new(StmtKind::Expr(await_of("outer")), sp())];
        assert!(first_await(&stmts).is_some());
    }

    #[test]
    fn test_references_sees_into_closures_unless_shadowed() {
        let closure = |param: &str| {
            Expr::new(
                ExprKind::Function(Box::new(FunctionBody {
                    name: None,
                    params: vec![param.to_string()],
                    is_async: false,
                    body: Body::Expression(Expr::ident("data", sp())),
                    span: sp(),
                })),
                sp(),
            )
        };
        assert!(expr_references(&closure("x"), "data"));
        assert!(!expr_references(&closure("data"), "data"));
    }
}
