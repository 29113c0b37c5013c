//! Structural parser for tool source text
//!
//! Tools are authored in Python. This module turns one tool's source into a
//! tree-sitter syntax tree and exposes the small set of structural queries
//! the analyzers need (tool-call sites, imports, primary-function
//! parameters, error checks).

pub mod python;

use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, Tree};

/// A successfully parsed tool source
pub struct ParsedSource {
    source: String,
    tree: Tree,
}

impl ParsedSource {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Text of a node, or "" if it is not valid UTF-8
    pub fn text(&self, node: &Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

impl std::fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedSource")
            .field("len", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

/// Parse Python source.
///
/// Fails on malformed source: tree-sitter always recovers a tree, so any
/// ERROR or MISSING node is treated as a parse failure.
pub fn parse_source(source: &str) -> Result<ParsedSource> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .context("Failed to set Python language")?;

    let tree = parser
        .parse(source, None)
        .context("Failed to parse Python source")?;

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = first_error_position(&root).unwrap_or((1, 1));
        anyhow::bail!("syntax error at line {}, column {}", line, column);
    }

    Ok(ParsedSource {
        source: source.to_string(),
        tree,
    })
}

/// 1-based position of the first ERROR or MISSING node
fn first_error_position(node: &Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        return Some((pos.row + 1, pos.column + 1));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(pos) = first_error_position(&child) {
                return Some(pos);
            }
        }
    }
    None
}

/// Count lines of code: non-blank lines that are not `#` comments
pub fn count_loc(source: &str) -> u32 {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count() as u32
}
