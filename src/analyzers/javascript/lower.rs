//! Lowering of tree-sitter JavaScript/TypeScript nodes into the unit IR.
//!
//! Lowering never fails. Node kinds the rules have no use for become
//! [`ExprKind::Opaque`] or [`StmtKind::Other`] holding their lowered children,
//! and error-recovery nodes are treated the same way. Nesting deeper than
//! [`MAX_NESTING_DEPTH`] is cut off into an empty `Opaque`/`Other` node so the
//! IR stays shallow enough to walk recursively.

use super::parser::{node_span, node_text};
use crate::core::{
    AssignOp, Body, CallChain, ChainStage, Expr, ExprKind, FunctionBody, Literal, LoopBody,
    LoopKind, Span, StageKind, Stmt, StmtKind, SwitchCase,
};
use std::cell::Cell;
use tree_sitter::Node;

/// Expression and statement levels lowered below one function or chain.
pub(crate) const MAX_NESTING_DEPTH: usize = 256;

pub(crate) const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
];

pub(crate) const LOOP_KINDS: &[&str] = &[
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
];

pub(crate) fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

fn first_named<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    named_children(node).into_iter().next()
}

/// True when `node` has an anonymous child token spelled `token`.
pub(crate) fn has_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn is_statement_kind(kind: &str) -> bool {
    kind.ends_with("_statement") || kind.ends_with("_declaration") || kind == "statement_block"
}

/// Strip the quotes from a string literal's source text.
fn string_contents(text: &str) -> String {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

pub struct Lowerer<'s> {
    source: &'s str,
    depth: Cell<usize>,
    truncated: Cell<bool>,
}

/// Leaves one nesting level when dropped.
struct DepthGuard<'l> {
    depth: &'l Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

impl<'s> Lowerer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            depth: Cell::new(0),
            truncated: Cell::new(false),
        }
    }

    /// Whether some subtree was cut off at [`MAX_NESTING_DEPTH`].
    pub fn truncated(&self) -> bool {
        self.truncated.get()
    }

    fn descend(&self) -> Option<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING_DEPTH {
            self.truncated.set(true);
            return None;
        }
        self.depth.set(depth + 1);
        Some(DepthGuard { depth: &self.depth })
    }

    pub fn text(&self, node: &Node) -> &'s str {
        node_text(node, self.source)
    }

    fn field_expr(&self, node: &Node, field: &str) -> Expr {
        match node.child_by_field_name(field) {
            Some(child) => self.expr(child),
            None => Expr::new(ExprKind::Opaque(Vec::new()), node_span(node)),
        }
    }

    fn field_text(&self, node: &Node, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|child| self.text(&child).to_string())
            .unwrap_or_default()
    }

    fn children_exprs(&self, node: &Node) -> Vec<Expr> {
        named_children(node)
            .into_iter()
            .map(|child| self.expr(child))
            .collect()
    }

    pub fn expr(&self, node: Node) -> Expr {
        let span = node_span(&node);
        let Some(_level) = self.descend() else {
            return Expr::new(ExprKind::Opaque(Vec::new()), span);
        };
        let kind = match node.kind() {
            "identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "private_property_identifier"
            | "this"
            | "super" => ExprKind::Ident(self.text(&node).to_string()),
            "undefined" => ExprKind::Literal(Literal::Undefined),
            "string" => ExprKind::Literal(Literal::Str(string_contents(self.text(&node)))),
            "template_string" => ExprKind::Literal(Literal::Template),
            "number" => ExprKind::Literal(Literal::Number(self.text(&node).to_string())),
            "true" => ExprKind::Literal(Literal::Bool(true)),
            "false" => ExprKind::Literal(Literal::Bool(false)),
            "null" => ExprKind::Literal(Literal::Null),
            "regex" => ExprKind::Literal(Literal::Regex),
            "parenthesized_expression" => match first_named(&node) {
                Some(inner) => return self.expr(inner),
                None => ExprKind::Opaque(Vec::new()),
            },
            "array" => ExprKind::Array(self.children_exprs(&node)),
            "object" => ExprKind::Object(
                named_children(&node)
                    .into_iter()
                    .map(|member| match member.kind() {
                        "pair" => self.field_expr(&member, "value"),
                        _ => self.expr(member),
                    })
                    .collect(),
            ),
            "call_expression" => ExprKind::Call {
                callee: Box::new(self.field_expr(&node, "function")),
                args: self.arguments(&node),
            },
            "member_expression" => ExprKind::Member {
                object: Box::new(self.field_expr(&node, "object")),
                property: self.field_text(&node, "property"),
            },
            "subscript_expression" => ExprKind::Member {
                object: Box::new(self.field_expr(&node, "object")),
                property: format!("[{}]", self.field_text(&node, "index")),
            },
            "new_expression" => ExprKind::New {
                constructor: Box::new(self.field_expr(&node, "constructor")),
                args: self.arguments(&node),
            },
            "await_expression" => match first_named(&node) {
                Some(inner) => ExprKind::Await(Box::new(self.expr(inner))),
                None => ExprKind::Opaque(Vec::new()),
            },
            kind if FUNCTION_KINDS.contains(&kind) => {
                ExprKind::Function(Box::new(self.function(node)))
            }
            "assignment_expression" => ExprKind::Assign {
                target: Box::new(self.field_expr(&node, "left")),
                op: AssignOp::Plain,
                value: Box::new(self.field_expr(&node, "right")),
            },
            "augmented_assignment_expression" => ExprKind::Assign {
                target: Box::new(self.field_expr(&node, "left")),
                op: AssignOp::Compound(self.field_text(&node, "operator")),
                value: Box::new(self.field_expr(&node, "right")),
            },
            "binary_expression" => ExprKind::Binary {
                op: self.field_text(&node, "operator"),
                left: Box::new(self.field_expr(&node, "left")),
                right: Box::new(self.field_expr(&node, "right")),
            },
            "unary_expression" => ExprKind::Unary {
                op: self.field_text(&node, "operator"),
                operand: Box::new(self.field_expr(&node, "argument")),
            },
            // TS wrappers that do not change the runtime value.
            "as_expression" | "satisfies_expression" | "non_null_expression" => {
                match first_named(&node) {
                    Some(inner) => return self.expr(inner),
                    None => ExprKind::Opaque(Vec::new()),
                }
            }
            _ => ExprKind::Opaque(self.children_exprs(&node)),
        };
        Expr::new(kind, span)
    }

    /// Lowered arguments of a call or `new` expression.
    pub fn arguments(&self, call: &Node) -> Vec<Expr> {
        match call.child_by_field_name("arguments") {
            Some(args) if args.kind() == "arguments" => self.children_exprs(&args),
            // tagged template
            Some(args) => vec![self.expr(args)],
            None => Vec::new(),
        }
    }

    pub fn function(&self, node: Node) -> FunctionBody {
        let body = match node.child_by_field_name("body") {
            Some(body) if body.kind() == "statement_block" => Body::Block(self.block(body)),
            Some(body) => Body::Expression(self.expr(body)),
            None => Body::Block(Vec::new()),
        };

        FunctionBody {
            name: node
                .child_by_field_name("name")
                .map(|name| self.text(&name).to_string()),
            params: self.params(&node),
            is_async: has_token(&node, "async"),
            body,
            span: node_span(&node),
        }
    }

    /// Every name bound by a function's parameter list, in order.
    pub fn params(&self, function: &Node) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(param) = function.child_by_field_name("parameter") {
            self.bindings(param, &mut names);
        } else if let Some(params) = function.child_by_field_name("parameters") {
            for param in named_children(&params) {
                self.bindings(param, &mut names);
            }
        }
        names
    }

    /// The first parameter, when it is a plain identifier.
    pub fn first_param_ident(&self, function: &Node) -> Option<String> {
        let first = match function.child_by_field_name("parameter") {
            Some(param) => param,
            None => first_named(&function.child_by_field_name("parameters")?)?,
        };
        let first = match first.kind() {
            "required_parameter" | "optional_parameter" => first.child_by_field_name("pattern")?,
            _ => first,
        };
        (first.kind() == "identifier").then(|| self.text(&first).to_string())
    }

    /// Identifiers bound by a parameter or declaration pattern.
    pub fn bindings(&self, node: Node, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                out.push(self.text(&node).to_string())
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.bindings(left, out);
                }
            }
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.bindings(value, out);
                }
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(pattern) = node.child_by_field_name("pattern") {
                    self.bindings(pattern, out);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for child in named_children(&node) {
                    self.bindings(child, out);
                }
            }
            _ => {}
        }
    }

    pub fn block(&self, node: Node) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        for child in named_children(&node) {
            self.stmt_into(child, &mut stmts);
        }
        stmts
    }

    /// A branch or loop body: a block's statements, or the single statement.
    fn branch(&self, node: Option<Node>) -> Vec<Stmt> {
        match node {
            Some(node) if node.kind() == "statement_block" => self.block(node),
            Some(node) => {
                let mut stmts = Vec::new();
                self.stmt_into(node, &mut stmts);
                stmts
            }
            None => Vec::new(),
        }
    }

    fn stmt_into(&self, node: Node, out: &mut Vec<Stmt>) {
        let span = node_span(&node);
        let Some(_level) = self.descend() else {
            out.push(Stmt::new(
                StmtKind::Other {
                    exprs: Vec::new(),
                    stmts: Vec::new(),
                },
                span,
            ));
            return;
        };
        let kind = match node.kind() {
            "expression_statement" => match first_named(&node) {
                Some(expr) => StmtKind::Expr(self.expr(expr)),
                None => return,
            },
            "lexical_declaration" | "variable_declaration" => {
                self.declarations(&node, out);
                return;
            }
            "return_statement" => StmtKind::Return(first_named(&node).map(|e| self.expr(e))),
            "throw_statement" => StmtKind::Throw(match first_named(&node) {
                Some(expr) => self.expr(expr),
                None => Expr::new(ExprKind::Opaque(Vec::new()), span),
            }),
            "if_statement" => StmtKind::If {
                condition: self.field_expr(&node, "condition"),
                consequence: self.branch(node.child_by_field_name("consequence")),
                alternative: self.branch(
                    node.child_by_field_name("alternative")
                        .and_then(|clause| first_named(&clause)),
                ),
            },
            kind if LOOP_KINDS.contains(&kind) => StmtKind::Loop(Box::new(self.loop_body(node))),
            "try_statement" => {
                let handler = node.child_by_field_name("handler");
                StmtKind::Try {
                    block: self.branch(node.child_by_field_name("body")),
                    handler_param: handler
                        .and_then(|clause| clause.child_by_field_name("parameter"))
                        .and_then(|param| {
                            let mut names = Vec::new();
                            self.bindings(param, &mut names);
                            names.into_iter().next()
                        }),
                    handler: self.branch(handler.and_then(|c| c.child_by_field_name("body"))),
                    finalizer: self.branch(
                        node.child_by_field_name("finalizer")
                            .and_then(|clause| clause.child_by_field_name("body")),
                    ),
                }
            }
            "statement_block" => StmtKind::Block(self.block(node)),
            "switch_statement" => StmtKind::Switch {
                discriminant: self.field_expr(&node, "value"),
                cases: node
                    .child_by_field_name("body")
                    .map(|body| {
                        named_children(&body)
                            .into_iter()
                            .filter(|clause| {
                                matches!(clause.kind(), "switch_case" | "switch_default")
                            })
                            .map(|clause| self.switch_case(clause))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            "break_statement" => StmtKind::Break,
            "function_declaration" | "generator_function_declaration" => {
                StmtKind::Expr(self.expr(node))
            }
            "empty_statement" => return,
            _ => {
                let mut exprs = Vec::new();
                let mut stmts = Vec::new();
                self.collect_other(node, &mut exprs, &mut stmts);
                StmtKind::Other { exprs, stmts }
            }
        };
        out.push(Stmt::new(kind, span));
    }

    fn switch_case(&self, clause: Node) -> SwitchCase {
        let test = clause.child_by_field_name("value");
        let mut body = Vec::new();
        for child in named_children(&clause) {
            if test.is_some_and(|test| test.id() == child.id()) {
                continue;
            }
            self.stmt_into(child, &mut body);
        }
        SwitchCase {
            test: test.map(|test| self.expr(test)),
            body,
        }
    }

    /// One statement per declarator. Destructuring declares each bound name
    /// without an initializer, followed by the initializer as an expression.
    fn declarations(&self, node: &Node, out: &mut Vec<Stmt>) {
        for declarator in named_children(node) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let span = node_span(&declarator);
            let init = declarator
                .child_by_field_name("value")
                .map(|value| self.expr(value));
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };

            if name.kind() == "identifier" {
                out.push(Stmt::new(
                    StmtKind::Declare {
                        name: self.text(&name).to_string(),
                        init,
                    },
                    span,
                ));
                continue;
            }

            let mut names = Vec::new();
            self.bindings(name, &mut names);
            out.extend(
                names
                    .into_iter()
                    .map(|name| Stmt::new(StmtKind::Declare { name, init: None }, span)),
            );
            if let Some(init) = init {
                out.push(Stmt::new(StmtKind::Expr(init), span));
            }
        }
    }

    fn collect_other(&self, node: Node, exprs: &mut Vec<Expr>, stmts: &mut Vec<Stmt>) {
        for child in named_children(&node) {
            let kind = child.kind();
            if is_statement_kind(kind) {
                self.stmt_into(child, stmts);
            } else if kind == "class_body" {
                self.collect_other(child, exprs, stmts);
            } else {
                exprs.push(self.expr(child));
            }
        }
    }

    pub fn loop_body(&self, node: Node) -> LoopBody {
        let mut bindings = Vec::new();
        let mut header = Vec::new();

        let kind = match node.kind() {
            "for_statement" => {
                if let Some(init) = node.child_by_field_name("initializer") {
                    let mut init_stmts = Vec::new();
                    self.stmt_into(init, &mut init_stmts);
                    for stmt in init_stmts {
                        match stmt.kind {
                            StmtKind::Declare { name, init } => {
                                bindings.push(name);
                                header.extend(init);
                            }
                            StmtKind::Expr(expr) => header.push(expr),
                            _ => {}
                        }
                    }
                }
                match node.child_by_field_name("condition") {
                    Some(cond) if cond.kind() == "expression_statement" => {
                        header.extend(first_named(&cond).map(|e| self.expr(e)));
                    }
                    Some(cond) if cond.kind() != "empty_statement" => header.push(self.expr(cond)),
                    _ => {}
                }
                if let Some(increment) = node.child_by_field_name("increment") {
                    header.push(self.expr(increment));
                }
                LoopKind::For
            }
            "for_in_statement" => {
                if let Some(left) = node.child_by_field_name("left") {
                    if node.child_by_field_name("kind").is_some() {
                        self.bindings(left, &mut bindings);
                    } else {
                        header.push(self.expr(left));
                    }
                }
                if let Some(right) = node.child_by_field_name("right") {
                    header.push(self.expr(right));
                }
                let operator = self.field_text(&node, "operator");
                if has_token(&node, "await") {
                    LoopKind::ForAwaitOf
                } else if operator == "of" {
                    LoopKind::ForOf
                } else {
                    LoopKind::ForIn
                }
            }
            "do_statement" => {
                header.push(self.field_expr(&node, "condition"));
                LoopKind::DoWhile
            }
            _ => {
                header.push(self.field_expr(&node, "condition"));
                LoopKind::While
            }
        };

        LoopBody {
            kind,
            bindings,
            header,
            body: self.branch(node.child_by_field_name("body")),
            span: node_span(&node),
        }
    }

    /// Unwind `recv.a(..).b(..)` into its receiver and stages.
    pub fn chain(&self, call: Node) -> Option<CallChain> {
        let mut stages = Vec::new();
        let mut current = call;

        while current.kind() == "call_expression" {
            let Some(function) = current.child_by_field_name("function") else {
                break;
            };
            if function.kind() != "member_expression" {
                break;
            }
            let (Some(object), Some(property)) = (
                function.child_by_field_name("object"),
                function.child_by_field_name("property"),
            ) else {
                break;
            };
            stages.push(ChainStage {
                kind: StageKind::from_method(self.text(&property)),
                args: self.arguments(&current),
                span: Span::new(property.start_byte(), current.end_byte()),
            });
            current = object;
        }

        if stages.is_empty() {
            return None;
        }
        stages.reverse();

        Some(CallChain {
            receiver: self.expr(current),
            stages,
            span: node_span(&call),
            value_used: value_is_used(&call),
        })
    }
}

/// Whether an expression's value flows anywhere, i.e. it is not an
/// expression statement of its own.
fn value_is_used(node: &Node) -> bool {
    let mut current = *node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "parenthesized_expression" => current = parent,
            "expression_statement" => return false,
            _ => return true,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::javascript::parser::parse_source;
    use crate::core::ast::JsLanguageVariant;
    use std::path::Path;

    fn lower_program(source: &str) -> Vec<Stmt> {
        let ast =
            parse_source(source, Path::new("t.js"), JsLanguageVariant::JavaScript).unwrap();
        Lowerer::new(source).block(ast.tree.root_node())
    }

    fn single_expr(source: &str) -> Expr {
        match lower_program(source).remove(0).kind {
            StmtKind::Expr(expr) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            single_expr("'An error occurred';").kind,
            ExprKind::Literal(Literal::Str("An error occurred".to_string()))
        );
        assert_eq!(
            single_expr("42;").kind,
            ExprKind::Literal(Literal::Number("42".to_string()))
        );
        assert_eq!(
            single_expr("`x ${y}`;").kind,
            ExprKind::Literal(Literal::Template)
        );
        assert_eq!(
            single_expr("undefined;").kind,
            ExprKind::Literal(Literal::Undefined)
        );
    }

    #[test]
    fn test_await_and_member_call() {
        let expr = single_expr("await Promise.resolve(1);");
        let ExprKind::Await(inner) = expr.kind else {
            panic!("expected await");
        };
        assert_eq!(inner.static_call_on("Promise"), Some("resolve"));
    }

    #[test]
    fn test_compound_assignment() {
        let expr = single_expr("total += await getTotalCount();");
        let ExprKind::Assign { target, op, value } = expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(target.as_ident(), Some("total"));
        assert_eq!(op, AssignOp::Compound("+=".to_string()));
        assert!(matches!(value.kind, ExprKind::Await(_)));
    }

    #[test]
    fn test_async_arrow_function() {
        let expr = single_expr("(async (a, { b, c: d }, ...rest) => a);");
        let function = expr.as_function().unwrap();
        assert!(function.is_async);
        assert_eq!(function.params, vec!["a", "b", "d", "rest"]);
        assert!(matches!(function.body, Body::Expression(_)));
    }

    #[test]
    fn test_declarations_and_return() {
        let stmts = lower_program("async function f() { const v = await g(); return v; }");
        let StmtKind::Expr(expr) = &stmts[0].kind else {
            panic!("expected function");
        };
        let function = expr.as_function().unwrap();
        assert_eq!(function.name.as_deref(), Some("f"));
        let body = function.block().unwrap();
        assert!(matches!(&body[0].kind, StmtKind::Declare { name, init: Some(_) } if name == "v"));
        assert!(matches!(&body[1].kind, StmtKind::Return(Some(e)) if e.as_ident() == Some("v")));
    }

    #[test]
    fn test_for_await_loop() {
        let stmts = lower_program("async function f() { for await (const x of xs) { use(x); } }");
        let StmtKind::Expr(expr) = &stmts[0].kind else {
            panic!("expected function");
        };
        let body = expr.as_function().unwrap().block().unwrap();
        let StmtKind::Loop(loop_body) = &body[0].kind else {
            panic!("expected loop");
        };
        assert_eq!(loop_body.kind, LoopKind::ForAwaitOf);
        assert_eq!(loop_body.bindings, vec!["x"]);
        assert_eq!(loop_body.body.len(), 1);
    }

    #[test]
    fn test_try_catch_finally() {
        let stmts = lower_program("try { a(); } catch (err) { b(err); } finally { c(); }");
        let StmtKind::Try {
            block,
            handler_param,
            handler,
            finalizer,
        } = &stmts[0].kind
        else {
            panic!("expected try");
        };
        assert_eq!(block.len(), 1);
        assert_eq!(handler_param.as_deref(), Some("err"));
        assert_eq!(handler.len(), 1);
        assert_eq!(finalizer.len(), 1);
    }

    #[test]
    fn test_switch_cases() {
        let stmts = lower_program("switch (r) { case 1: a(); break; default: return 2; }");
        let StmtKind::Switch {
            discriminant,
            cases,
        } = &stmts[0].kind
        else {
            panic!("expected switch");
        };
        assert_eq!(discriminant.as_ident(), Some("r"));
        assert_eq!(cases.len(), 2);
        assert!(cases[0].test.is_some());
        assert_eq!(cases[0].body.len(), 2);
        assert!(matches!(cases[0].body[1].kind, StmtKind::Break));
        assert!(cases[1].test.is_none());
        assert!(matches!(cases[1].body[0].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn test_deep_nesting_is_cut_off() {
        let source = format!("{};", vec!["1"; 5000].join(" + "));
        let ast =
            parse_source(&source, Path::new("t.js"), JsLanguageVariant::JavaScript).unwrap();
        let lowerer = Lowerer::new(&source);
        let stmts = lowerer.block(ast.tree.root_node());

        assert!(lowerer.truncated());
        assert_eq!(stmts.len(), 1);
        let StmtKind::Expr(expr) = &stmts[0].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_shallow_source_is_not_cut_off() {
        let source = "a(b(c(d)));";
        let ast =
            parse_source(source, Path::new("t.js"), JsLanguageVariant::JavaScript).unwrap();
        let lowerer = Lowerer::new(source);
        lowerer.block(ast.tree.root_node());
        assert!(!lowerer.truncated());
    }

    #[test]
    fn test_chain_unwinding() {
        let source = "promiseObj.then(doSomething).catch(onError);";
        let ast =
            parse_source(source, Path::new("t.js"), JsLanguageVariant::JavaScript).unwrap();
        let statement = ast.tree.root_node().named_child(0).unwrap();
        let call = statement.named_child(0).unwrap();

        let chain = Lowerer::new(source).chain(call).unwrap();
        assert_eq!(chain.receiver.as_ident(), Some("promiseObj"));
        let kinds: Vec<StageKind> = chain.stages.iter().map(|s| s.kind.clone()).collect();
        assert_eq!(kinds, vec![StageKind::Then, StageKind::Catch]);
        assert_eq!(chain.span, Span::new(0, source.len() - 1));
        assert!(!chain.value_used);
    }
}
