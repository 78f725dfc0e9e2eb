//! Walks a parsed file and collects every code unit the rules inspect.

use super::lower::{named_children, Lowerer, FUNCTION_KINDS, LOOP_KINDS};
use super::parser::{node_line, node_span};
use crate::core::ast::JsAst;
use crate::core::{
    CallbackDecl, CodeUnit, ConstructorCall, RejectCall, RejectCallee, StageKind,
};
use crate::rules::RuleSettings;
use tracing::{trace, warn};
use tree_sitter::Node;

/// Code units of a file in source order: a unit is emitted when its node is
/// entered, so enclosing units come before the units nested in them.
pub fn extract_units(ast: &JsAst, settings: &RuleSettings) -> Vec<CodeUnit> {
    let mut extractor = UnitExtractor {
        lowerer: Lowerer::new(&ast.source),
        settings,
        units: Vec::new(),
    };
    extractor.visit(ast.tree.root_node());

    if extractor.lowerer.truncated() {
        warn!(
            path = %ast.path.display(),
            "nesting too deep; the innermost code was not inspected"
        );
    }
    extractor.units
}

struct UnitExtractor<'a> {
    lowerer: Lowerer<'a>,
    settings: &'a RuleSettings,
    units: Vec<CodeUnit>,
}

impl UnitExtractor<'_> {
    /// Pre-order walk over an explicit stack; syntax nesting is unbounded.
    fn visit(&mut self, root: Node) {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            let kind = node.kind();
            match kind {
                "call_expression" => self.call(node),
                "new_expression" => self.constructor(node),
                kind if FUNCTION_KINDS.contains(&kind) => self.function(node),
                kind if LOOP_KINDS.contains(&kind) => {
                    let unit = CodeUnit::Loop(self.lowerer.loop_body(node));
                    self.push(&node, unit);
                }
                _ => {}
            }

            pending.extend(named_children(&node).into_iter().rev());
        }
    }

    fn push(&mut self, node: &Node, unit: CodeUnit) {
        trace!(kind = %unit.kind(), line = node_line(node), "extracted unit");
        self.units.push(unit);
    }

    fn call(&mut self, node: Node) {
        if is_chain_head(&node) {
            if let Some(chain) = self.lowerer.chain(node) {
                let is_promise_chain = chain.stages.iter().any(|stage| {
                    matches!(
                        stage.kind,
                        StageKind::Then | StageKind::Catch | StageKind::Finally
                    )
                });
                if is_promise_chain {
                    self.push(&node, CodeUnit::Chain(chain));
                }
            }
        }

        let is_promise_reject = node
            .child_by_field_name("function")
            .is_some_and(|function| self.is_member(&function, "Promise", "reject"));
        if is_promise_reject {
            let unit = CodeUnit::RejectCall(RejectCall {
                callee: RejectCallee::PromiseReject,
                argument: self.lowerer.arguments(&node).into_iter().next(),
                span: node_span(&node),
            });
            self.push(&node, unit);
        }
    }

    /// `object.property`, spelled exactly.
    fn is_member(&self, node: &Node, object: &str, property: &str) -> bool {
        node.kind() == "member_expression"
            && node
                .child_by_field_name("object")
                .is_some_and(|o| self.lowerer.text(&o) == object)
            && node
                .child_by_field_name("property")
                .is_some_and(|p| self.lowerer.text(&p) == property)
    }

    fn constructor(&mut self, node: Node) {
        let Some(constructor) = node.child_by_field_name("constructor") else {
            return;
        };
        let name = self.lowerer.text(&constructor);
        if name != "Promise" {
            return;
        }

        // `new Promise()` without an executor throws at runtime; there is no
        // unit to check.
        let Some(executor) = node
            .child_by_field_name("arguments")
            .and_then(|args| named_children(&args).into_iter().next())
        else {
            return;
        };
        let unit = CodeUnit::ConstructorCall(ConstructorCall {
            constructor: name.to_string(),
            executor: Some(self.lowerer.expr(executor)),
            span: node_span(&node),
        });
        self.push(&node, unit);

        if !FUNCTION_KINDS.contains(&executor.kind()) {
            return;
        }
        let params = self.lowerer.params(&executor);
        let Some(reject) = params.get(1) else {
            return;
        };
        if let Some(body) = executor.child_by_field_name("body") {
            self.reject_calls(body, reject);
        }
    }

    /// Calls of the executor's reject parameter, including from nested
    /// closures that do not rebind the name.
    fn reject_calls(&mut self, body: Node, reject: &str) {
        let mut pending = vec![body];
        while let Some(node) = pending.pop() {
            if FUNCTION_KINDS.contains(&node.kind())
                && self.lowerer.params(&node).iter().any(|p| p == reject)
            {
                continue;
            }

            if node.kind() == "call_expression" {
                let calls_reject = node
                    .child_by_field_name("function")
                    .is_some_and(|f| f.kind() == "identifier" && self.lowerer.text(&f) == reject);
                if calls_reject {
                    let unit = CodeUnit::RejectCall(RejectCall {
                        callee: RejectCallee::ExecutorParam(reject.to_string()),
                        argument: self.lowerer.arguments(&node).into_iter().next(),
                        span: node_span(&node),
                    });
                    self.push(&node, unit);
                }
            }

            pending.extend(named_children(&node).into_iter().rev());
        }
    }

    fn function(&mut self, node: Node) {
        let function = self.lowerer.function(node);

        // `catch((err) => ..)` receives a rejection reason, not an
        // error-first callback's arguments.
        let error_first = !self.is_stage_handler(&node)
            && self
                .lowerer
                .first_param_ident(&node)
                .is_some_and(|first| self.settings.error_param.is_match(&first));
        let callback = error_first.then(|| CallbackDecl {
            name: function.name.clone(),
            params: function.params.clone(),
            body: function.body.clone(),
            span: function.span,
        });

        self.push(&node, CodeUnit::Function(function));
        if let Some(callback) = callback {
            self.push(&node, CodeUnit::Callback(callback));
        }
    }

    /// Whether `function` is passed directly to `.then`, `.catch` or
    /// `.finally`.
    fn is_stage_handler(&self, function: &Node) -> bool {
        let Some(args) = function.parent().filter(|p| p.kind() == "arguments") else {
            return false;
        };
        let Some(callee) = args
            .parent()
            .filter(|call| call.kind() == "call_expression")
            .and_then(|call| call.child_by_field_name("function"))
        else {
            return false;
        };
        callee.kind() == "member_expression"
            && callee.child_by_field_name("property").is_some_and(|property| {
                matches!(self.lowerer.text(&property), "then" | "catch" | "finally")
            })
    }
}

/// The outermost call of a `a.b().c()` chain: not itself the object of a
/// member access that is being called.
fn is_chain_head(call: &Node) -> bool {
    let Some(parent) = call.parent() else {
        return true;
    };
    if parent.kind() != "member_expression"
        || parent.child_by_field_name("object").map(|n| n.id()) != Some(call.id())
    {
        return true;
    }
    !parent
        .parent()
        .is_some_and(|grand| grand.kind() == "call_expression")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::javascript::parser::parse_source;
    use crate::core::ast::JsLanguageVariant;
    use crate::core::{Body, ExprKind, LoopKind, UnitKind};
    use indoc::indoc;
    use std::path::Path;

    fn units(source: &str) -> Vec<CodeUnit> {
        let ast =
            parse_source(source, Path::new("t.js"), JsLanguageVariant::JavaScript).unwrap();
        extract_units(&ast, &RuleSettings::default())
    }

    fn kinds(units: &[CodeUnit]) -> Vec<UnitKind> {
        units.iter().map(CodeUnit::kind).collect()
    }

    #[test]
    fn test_chain_is_one_unit() {
        let units = units("promiseObj.then(doSomething).then(other).catch(onError);");
        assert_eq!(kinds(&units), vec![UnitKind::Chain]);
        let CodeUnit::Chain(chain) = &units[0] else {
            unreachable!()
        };
        assert_eq!(chain.stages.len(), 3);
        assert!(!chain.value_used);
    }

    #[test]
    fn test_plain_method_calls_are_not_chains() {
        assert!(units("console.log(items.map(f).join(','));").is_empty());
    }

    #[test]
    fn test_returned_chain_marks_value_used() {
        let units = units("function f() { return fetchData().then(parse); }");
        let chain = units
            .iter()
            .find_map(|u| match u {
                CodeUnit::Chain(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert!(chain.value_used);
    }

    #[test]
    fn test_handlers_become_function_units_after_their_chain() {
        let units = units("promiseObj.then((res) => { console.log(res); });");
        assert_eq!(kinds(&units), vec![UnitKind::Chain, UnitKind::Function]);
    }

    #[test]
    fn test_promise_constructor_and_reject_calls() {
        let units = units(indoc! {r#"
            new Promise((resolve, reject) => {
              reject("An error occurred");
              setTimeout(() => reject(new Error("late")), 10);
            });
        "#});
        assert_eq!(
            kinds(&units),
            vec![
                UnitKind::ConstructorCall,
                UnitKind::RejectCall,
                UnitKind::RejectCall,
                UnitKind::Function,
                UnitKind::Function,
            ]
        );
        let CodeUnit::RejectCall(first) = &units[1] else {
            unreachable!()
        };
        assert_eq!(
            first.callee,
            RejectCallee::ExecutorParam("reject".to_string())
        );
        assert!(first.argument.is_some());
    }

    #[test]
    fn test_promise_without_executor_is_skipped() {
        assert!(units("const p = new Promise();").is_empty());
    }

    #[test]
    fn test_shadowed_reject_is_not_collected() {
        let units = units(indoc! {r#"
            new Promise((resolve, reject) => {
              run((reject) => reject("inner"));
            });
        "#});
        assert!(!units.iter().any(|u| u.kind() == UnitKind::RejectCall));
    }

    #[test]
    fn test_promise_reject_call() {
        let units = units("Promise.reject('bad thing');");
        let CodeUnit::RejectCall(call) = &units[0] else {
            panic!("expected reject call, got {:?}", units);
        };
        assert_eq!(call.callee, RejectCallee::PromiseReject);
        assert!(matches!(
            call.argument.as_ref().map(|a| &a.kind),
            Some(ExprKind::Literal(_))
        ));
    }

    #[test]
    fn test_error_first_function_is_also_a_callback() {
        let units = units("function callback(err, data) { console.log(data); }");
        assert_eq!(kinds(&units), vec![UnitKind::Function, UnitKind::Callback]);
        let CodeUnit::Callback(callback) = &units[1] else {
            unreachable!()
        };
        assert_eq!(callback.name.as_deref(), Some("callback"));
        assert_eq!(callback.params, vec!["err", "data"]);
        assert!(matches!(callback.body, Body::Block(_)));
    }

    #[test]
    fn test_catch_handler_is_not_a_callback() {
        let caught = units("p.then(a).catch((err) => { console.error('failed'); });");
        assert_eq!(kinds(&caught), vec![UnitKind::Chain, UnitKind::Function]);

        let handled = units("p.then((error, extra) => extra);");
        assert!(!handled.iter().any(|u| u.kind() == UnitKind::Callback));
    }

    #[test]
    fn test_error_first_argument_of_other_calls_is_a_callback() {
        let units = units("fs.readFile(path, (err, data) => { use(data); });");
        assert_eq!(kinds(&units), vec![UnitKind::Function, UnitKind::Callback]);
    }

    #[test]
    fn test_deeply_nested_source_is_walked() {
        let source = format!(
            "async function f() {{ const x = {}; await g(x); }}",
            vec!["1"; 5000].join(" + ")
        );
        let units = units(&source);
        assert_eq!(kinds(&units), vec![UnitKind::Function]);
    }

    #[test]
    fn test_loops_are_units() {
        let units = units(indoc! {r#"
            for (const item of items) { await process(item); }
            while (running) { tick(); }
        "#});
        let loop_kinds: Vec<LoopKind> = units
            .iter()
            .filter_map(|u| match u {
                CodeUnit::Loop(l) => Some(l.kind),
                _ => None,
            })
            .collect();
        assert_eq!(loop_kinds, vec![LoopKind::ForOf, LoopKind::While]);
    }
}
