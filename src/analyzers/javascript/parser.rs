//! tree-sitter entry point for the four JavaScript dialects, plus the node
//! helpers the lowering and extraction passes share.

use crate::core::ast::{JsAst, JsLanguageVariant};
use crate::core::Span;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

impl JsLanguageVariant {
    fn grammar(self) -> Language {
        match self {
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Dialect for `path`, by extension. Unknown extensions are plain JavaScript.
pub fn detect_variant(path: &Path) -> JsLanguageVariant {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(JsLanguageVariant::from_extension)
        .unwrap_or(JsLanguageVariant::JavaScript)
}

/// Build a syntax tree for `content`. A tree with recovered syntax errors is
/// still returned; see [`has_parse_errors`].
pub fn parse_source(content: &str, path: &Path, variant: JsLanguageVariant) -> Result<JsAst> {
    let mut parser = Parser::new();
    parser
        .set_language(&variant.grammar())
        .with_context(|| format!("loading the {variant:?} grammar"))?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| anyhow!("tree-sitter returned no tree"))?;

    Ok(JsAst {
        tree,
        source: content.to_owned(),
        path: path.to_owned(),
        language_variant: variant,
    })
}

pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

pub fn node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

pub fn node_span(node: &Node) -> Span {
    let range = node.byte_range();
    Span::new(range.start, range.end)
}

/// 1-based line of the node's first byte.
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}
