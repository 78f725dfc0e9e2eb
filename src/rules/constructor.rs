use super::{ids, Rule};
use crate::core::{CodeUnit, Severity, UnitKind, Violation};
use crate::errors::{LintError, Result};

/// `new Promise(async (resolve, reject) => ...)`: a throw inside the async
/// executor rejects the executor's own promise, not the constructed one.
pub struct AsyncExecutorRule;

impl Rule for AsyncExecutorRule {
    fn id(&self) -> &str {
        ids::ASYNC_CONSTRUCTOR_CALLBACK
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, unit: &CodeUnit) -> Result<Option<Violation>> {
        let CodeUnit::ConstructorCall(call) = unit else {
            return Ok(None);
        };
        if call.constructor != "Promise" {
            return Ok(None);
        }

        let executor = call.executor.as_ref().ok_or_else(|| {
            LintError::invalid_unit(
                self.id(),
                UnitKind::ConstructorCall,
                "Promise constructor call has no executor",
            )
        })?;

        match executor.as_function() {
            Some(function) if function.is_async => Ok(Some(Violation::new(
                "Promise executor is an async function; errors it throws are lost",
                function.span,
            ))),
            _ => Ok(None),
        }
    }
}
