//! Pattern classifier: runs every rule of a ruleset over code units.
//!
//! Evaluation is pure. The same unit and ruleset always yield the same
//! findings, in ruleset order, and a rule's findings never depend on which
//! other rules are present.

use crate::core::{CodeUnit, Finding};
use crate::errors::Result;
use crate::rules::Ruleset;
use rayon::prelude::*;
use tracing::{debug, debug_span, trace};

/// Evaluate one unit against every rule, collecting findings in ruleset order.
///
/// Fails with [`LintError::InvalidUnit`](crate::errors::LintError::InvalidUnit)
/// as soon as a rule reports the unit malformed.
pub fn evaluate(unit: &CodeUnit, rules: &Ruleset) -> Result<Vec<Finding>> {
    let _span = debug_span!("evaluate", kind = %unit.kind(), start = unit.span().start).entered();

    let mut findings = Vec::new();
    for entry in rules.iter() {
        let id = entry.rule.id();
        match entry.rule.check(unit)? {
            Some(violation) => {
                trace!(rule = id, message = %violation.message, "rule matched");
                findings.push(violation.into_finding(id, entry.severity));
            }
            None => trace!(rule = id, "rule passed"),
        }
    }

    debug!(findings = findings.len(), "unit evaluated");
    Ok(findings)
}

/// Evaluate units in parallel. Findings are concatenated in input order; the
/// first malformed unit in input order fails the whole batch.
pub fn evaluate_all(units: &[CodeUnit], rules: &Ruleset) -> Result<Vec<Finding>> {
    let per_unit: Vec<Result<Vec<Finding>>> =
        units.par_iter().map(|unit| evaluate(unit, rules)).collect();

    let mut findings = Vec::new();
    for result in per_unit {
        findings.extend(result?);
    }

    debug!(
        units = units.len(),
        findings = findings.len(),
        "batch evaluated"
    );
    Ok(findings)
}
