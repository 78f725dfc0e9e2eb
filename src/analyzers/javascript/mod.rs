//! JavaScript/TypeScript front end.
//!
//! Parses a source file with tree-sitter, lowers it into [`CodeUnit`]s and
//! runs the classifier over them.

pub mod extract;
mod lower;
pub mod parser;

pub use extract::extract_units;
pub use parser::{detect_variant, has_parse_errors, parse_source};

use crate::classifier::evaluate_all;
use crate::core::{CodeUnit, Finding};
use crate::errors::{LintError, Result};
use crate::rules::{RuleSettings, Ruleset};
use parser::node_line;
use std::path::Path;
use tracing::{debug, debug_span};
use tree_sitter::Node;

/// Parse `content` and extract its code units. The dialect follows the file
/// extension of `path`.
pub fn units_from_source(
    content: &str,
    path: &Path,
    settings: &RuleSettings,
) -> Result<Vec<CodeUnit>> {
    let variant = detect_variant(path);
    let ast = parse_source(content, path, variant)
        .map_err(|e| LintError::parse(path, format!("{e:#}")))?;

    if has_parse_errors(&ast.tree) {
        let line = first_error_line(ast.tree.root_node());
        return Err(LintError::parse(path, format!("syntax error at line {line}")));
    }

    Ok(extract_units(&ast, settings))
}

/// Lint one source file.
pub fn analyze_source(
    content: &str,
    path: &Path,
    ruleset: &Ruleset,
    settings: &RuleSettings,
) -> Result<Vec<Finding>> {
    let _span = debug_span!("analyze_source", path = %path.display()).entered();

    let units = units_from_source(content, path, settings)?;
    debug!(units = units.len(), "extracted code units");

    evaluate_all(&units, ruleset)
}

/// Line of the first `ERROR` or missing node, descending only into
/// subtrees that contain one.
fn first_error_line(root: Node) -> usize {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return node_line(&node);
        }
        let mut cursor = node.walk();
        let next = node
            .children(&mut cursor)
            .find(|child| child.has_error() || child.is_missing());
        match next {
            Some(child) => node = child,
            None => return node_line(&node),
        }
    }
}
