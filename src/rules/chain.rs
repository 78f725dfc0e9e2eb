use super::continuation::is_handler;
use super::{ids, require_stages, Rule};
use crate::core::{CodeUnit, Severity, StageKind, Violation};
use crate::errors::Result;

/// A chain with `then` stages must end in rejection handling: a `catch` after
/// the last `then`, or a last `then` that passes a rejection handler.
/// `finally` re-raises and does not count. Chains whose promise is handed on
/// (returned, awaited, stored) are left to the code that receives it.
pub struct UnhandledRejectionRule;

impl Rule for UnhandledRejectionRule {
    fn id(&self) -> &str {
        ids::UNHANDLED_REJECTION_PATH
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::Chain(chain) = unit else {
            return Ok(None);
        };
        require_stages(self.id(), chain)?;
        if chain.value_used {
            return Ok(None);
        }

        let Some((last_then, then_stage)) = chain.stages_of(StageKind::Then).last() else {
            return Ok(None);
        };

        let caught_later = chain.stages[last_then + 1..]
            .iter()
            .any(|stage| stage.kind == StageKind::Catch);
        let handles_rejection = then_stage.args.get(1).is_some_and(is_handler);

        if caught_later || handles_rejection {
            return Ok(None);
        }

        Ok(Some(Violation::new(
            "Promise chain has no catch() after its last then(); rejections go unhandled",
            chain.span,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallChain, ChainStage, Expr, ExprKind, Literal, Span};

    fn sp() -> Span {
        Span::default()
    }

    fn chain(stages: Vec<(StageKind, Vec<Expr>)>) -> CodeUnit {
        CodeUnit::Chain(CallChain {
            receiver: Expr::ident("fetchData", sp()),
            stages: stages
                .into_iter()
                .map(|(kind, args)| ChainStage {
                    kind,
                    args,
                    span: sp(),
                })
                .collect(),
            span: Span::new(0, 42),
            value_used: false,
        })
    }

    fn handler(name: &str) -> Expr {
        Expr::ident(name, sp())
    }

    #[test]
    fn test_then_without_catch_flagged() {
        let unit = chain(vec![(StageKind::Then, vec![handler("doSomething")])]);
        let violation = UnhandledRejectionRule.check(&unit).unwrap().unwrap();
        assert_eq!(violation.span, Span::new(0, 42));
    }

    #[test]
    fn test_then_then_catch_passes() {
        let unit = chain(vec![
            (StageKind::Then, vec![handler("a")]),
            (StageKind::Then, vec![handler("b")]),
            (StageKind::Catch, vec![handler("onError")]),
        ]);
        assert_eq!(UnhandledRejectionRule.check(&unit).unwrap(), None);
    }

    #[test]
    fn test_catch_before_last_then_flagged() {
        let unit = chain(vec![
            (StageKind::Then, vec![handler("a")]),
            (StageKind::Catch, vec![handler("onError")]),
            (StageKind::Then, vec![handler("b")]),
        ]);
        assert!(UnhandledRejectionRule.check(&unit).unwrap().is_some());
    }

    #[test]
    fn test_finally_does_not_handle_rejection() {
        let unit = chain(vec![
            (StageKind::Then, vec![handler("a")]),
            (StageKind::Finally, vec![handler("cleanup")]),
        ]);
        assert!(UnhandledRejectionRule.check(&unit).unwrap().is_some());
    }

    #[test]
    fn test_two_argument_then_passes() {
        let unit = chain(vec![(
            StageKind::Then,
            vec![handler("onOk"), handler("onError")],
        )]);
        assert_eq!(UnhandledRejectionRule.check(&unit).unwrap(), None);

        let null_second = chain(vec![(
            StageKind::Then,
            vec![
                handler("onOk"),
                Expr::new(ExprKind::Literal(Literal::Null), sp()),
            ],
        )]);
        assert!(UnhandledRejectionRule.check(&null_second).unwrap().is_some());
    }

    #[test]
    fn test_returned_chain_is_left_to_caller() {
        let mut unit = chain(vec![(StageKind::Then, vec![handler("a")])]);
        if let CodeUnit::Chain(c) = &mut unit {
            c.value_used = true;
        }
        assert_eq!(UnhandledRejectionRule.check(&unit).unwrap(), None);
    }

    #[test]
    fn test_chain_without_then_is_ignored() {
        let unit = chain(vec![(StageKind::Catch, vec![handler("onError")])]);
        assert_eq!(UnhandledRejectionRule.check(&unit).unwrap(), None);
    }
}
