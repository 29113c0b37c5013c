//! Code complexity analyzer
//!
//! Walks the syntax tree once and classifies control-flow constructs:
//!
//! | Construct | Cyclomatic | Cognitive |
//! |---|---|---|
//! | function definition | +1 | - |
//! | `if` / `elif`, `for` / `async for`, `while` | +1 | nesting + 1 |
//! | `try` statement, `except` handler, `with` / `async with` block | +1 | - |
//! | boolean compound (`a and b or c`) | operands - 1 | - |
//!
//! Nesting increases only when descending into the body of a conditional,
//! loop or scope block (`with`, `try`, `except`, `else`, `finally`), never for
//! plain sequential statements or function bodies.

use crate::models::ComplexityMetrics;
use crate::parsers::{self, ParsedSource};
use tracing::warn;
use tree_sitter::Node;

/// Kinds whose `block` children are one nesting level deeper
const NESTING_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "else_clause",
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
    "except_clause",
    "except_group_clause",
    "finally_clause",
];

/// Compute code metrics for an already-parsed tool
pub fn analyze(parsed: &ParsedSource) -> ComplexityMetrics {
    let mut metrics = ComplexityMetrics {
        lines_of_code: parsers::count_loc(parsed.source()),
        ..Default::default()
    };
    visit(&parsed.root(), 0, &mut metrics);
    metrics
}

/// Parse and analyze source text. Malformed source yields all-zero metrics.
pub fn analyze_source(source: &str) -> ComplexityMetrics {
    match parsers::parse_source(source) {
        Ok(parsed) => analyze(&parsed),
        Err(e) => {
            warn!("Code analysis skipped: {}", e);
            ComplexityMetrics::default()
        }
    }
}

fn visit(node: &Node, nesting: u32, metrics: &mut ComplexityMetrics) {
    let kind = node.kind();
    match kind {
        "function_definition" | "async_function_definition" => {
            metrics.cyclomatic += 1;
            metrics.function_count += 1;
        }
        "if_statement" | "elif_clause" => {
            metrics.cyclomatic += 1;
            metrics.cognitive += nesting + 1;
            metrics.branch_count += 1;
        }
        // `async for` parses as a for_statement with an `async` token
        "for_statement" | "while_statement" => {
            metrics.cyclomatic += 1;
            metrics.cognitive += nesting + 1;
            metrics.loop_count += 1;
        }
        "try_statement" | "except_clause" | "except_group_clause" | "with_statement" => {
            metrics.cyclomatic += 1;
        }
        // Binary in tree-sitter: `a and b and c` is two nested operators,
        // i.e. operands - 1 in total
        "boolean_operator" => {
            metrics.cyclomatic += 1;
        }
        _ => {}
    }

    let opens_scope = NESTING_KINDS.contains(&kind);
    for child in node.children(&mut node.walk()) {
        if opens_scope && child.kind() == "block" {
            let depth = nesting + 1;
            metrics.nesting_depth = metrics.nesting_depth.max(depth);
            visit(&child, depth, metrics);
        } else {
            visit(&child, nesting, metrics);
        }
    }
}
