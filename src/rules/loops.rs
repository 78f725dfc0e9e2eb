use super::{ids, Rule};
use crate::core::visit::first_await;
use crate::core::{CodeUnit, LoopKind, Severity, Violation};
use crate::errors::Result;

/// An `await` in a loop body serializes work that could run concurrently.
/// Reported once per loop, at the first `await`. `for await` loops iterate an
/// async source on purpose and are skipped.
pub struct SequentialAwaitRule;

impl Rule for SequentialAwaitRule {
    fn id(&self) -> &str {
        ids::SEQUENTIAL_WAIT_IN_LOOP
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Loop(body) = unit else {
            return Ok(None);
        };
        if body.kind == LoopKind::ForAwaitOf {
            return Ok(None);
        }

        Ok(first_await(&body.body).map(|await_expr| {
            Violation::new(
                "await inside a loop runs each iteration sequentially; \
                 collect the promises and await Promise.all after the loop",
                await_expr.span,
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Expr, ExprKind, LoopBody, Span, Stmt, StmtKind};

    fn await_stmt(at: usize) -> Stmt {
        Stmt::new(
            StmtKind::Expr(Expr::new(
                ExprKind::Await(Box::new(Expr::ident("task", Span::new(at + 6, at + 10)))),
                Span::new(at, at + 10),
            )),
            Span::new(at, at + 11),
        )
    }

    fn loop_unit(kind: LoopKind, body: Vec<Stmt>) -> CodeUnit {
        CodeUnit::Loop(LoopBody {
            kind,
            bindings: vec!["item".to_string()],
            header: vec![Expr::ident("items", Span::default())],
            body,
            span: Span::new(0, 100),
        })
    }

    #[test]
    fn test_one_finding_regardless_of_await_count() {
        let unit = loop_unit(
            LoopKind::ForOf,
            vec![await_stmt(20), await_stmt(40), await_stmt(60)],
        );
        let violation = SequentialAwaitRule.check(&unit).unwrap().unwrap();
        assert_eq!(violation.span, Span::new(20, 30));
    }

    #[test]
    fn test_loop_without_await_passes() {
        let unit = loop_unit(LoopKind::While, vec![]);
        assert_eq!(SequentialAwaitRule.check(&unit).unwrap(), None);
    }

    #[test]
    fn test_for_await_skipped() {
        let unit = loop_unit(LoopKind::ForAwaitOf, vec![await_stmt(20)]);
        assert_eq!(SequentialAwaitRule.check(&unit).unwrap(), None);
    }
}
