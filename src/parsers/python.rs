//! Python structural queries used by the analyzers

use super::ParsedSource;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tree_sitter::Node;

/// Method name of the composition handle that invokes another tool
pub const TOOL_CALL_METHOD: &str = "call_tool";

/// Name of the conventional tool entry function
pub const ENTRY_FUNCTION: &str = "execute";

pub fn is_function(node: &Node) -> bool {
    matches!(node.kind(), "function_definition" | "async_function_definition")
}

/// Tool names invoked as `<handle>.call_tool("<name>", ...)`, in source order,
/// duplicates included.
///
/// Only a plain string literal as the first positional argument is
/// recognized. Names built at run time (variables, f-strings with
/// interpolation, concatenation) are not tracked.
pub fn tool_calls(parsed: &ParsedSource) -> Vec<String> {
    let mut calls = Vec::new();
    collect_tool_calls(&parsed.root(), parsed, &mut calls);
    calls
}

fn collect_tool_calls(node: &Node, parsed: &ParsedSource, calls: &mut Vec<String>) {
    if node.kind() == "call" {
        if let Some(name) = literal_tool_call(node, parsed) {
            calls.push(name);
        }
    }

    for child in node.children(&mut node.walk()) {
        collect_tool_calls(&child, parsed, calls);
    }
}

fn literal_tool_call(call: &Node, parsed: &ParsedSource) -> Option<String> {
    let function = call.child_by_field_name("function")?;
    if function.kind() != "attribute" {
        return None;
    }
    let method = function.child_by_field_name("attribute")?;
    if parsed.text(&method) != TOOL_CALL_METHOD {
        return None;
    }

    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "argument_list" {
        return None;
    }
    let first = arguments
        .named_children(&mut arguments.walk())
        .find(|n| n.kind() != "comment")?;
    string_literal(&first, parsed)
}

/// Value of a string node without interpolation
fn string_literal(node: &Node, parsed: &ParsedSource) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut value = String::new();
    for child in node.named_children(&mut node.walk()) {
        match child.kind() {
            "string_start" | "string_end" => {}
            "string_content" => value.push_str(parsed.text(&child)),
            _ => return None,
        }
    }

    (!value.is_empty()).then_some(value)
}

/// Distinct top-level module names imported anywhere in the source
pub fn imports(parsed: &ParsedSource) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();
    collect_imports(&parsed.root(), parsed, &mut modules);
    modules
}

fn collect_imports(node: &Node, parsed: &ParsedSource, modules: &mut BTreeSet<String>) {
    match node.kind() {
        "import_statement" => {
            // import a.b, c as d
            for child in node.named_children(&mut node.walk()) {
                let module = match child.kind() {
                    "dotted_name" => Some(child),
                    "aliased_import" => child.child_by_field_name("name"),
                    _ => None,
                };
                if let Some(root) = module.and_then(|m| module_root(parsed.text(&m))) {
                    modules.insert(root);
                }
            }
        }
        "import_from_statement" => {
            // from a.b import c / from .a import b
            if let Some(module) = node.child_by_field_name("module_name") {
                if let Some(root) = module_root(parsed.text(&module)) {
                    modules.insert(root);
                }
            }
        }
        _ => {
            for child in node.children(&mut node.walk()) {
                collect_imports(&child, parsed, modules);
            }
        }
    }
}

/// `pandas.core` -> `pandas`, `.utils.x` -> `utils`, `.` -> none
fn module_root(path: &str) -> Option<String> {
    path.trim_start_matches('.')
        .split('.')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The tool's primary function: a top-level `execute` if present, otherwise
/// the first top-level function.
pub fn primary_function<'a>(parsed: &'a ParsedSource) -> Option<Node<'a>> {
    let root = parsed.root();
    let mut first = None;

    for node in root.named_children(&mut root.walk()) {
        let func = if is_function(&node) {
            Some(node)
        } else if node.kind() == "decorated_definition" {
            node.child_by_field_name("definition").filter(is_function)
        } else {
            None
        };

        let Some(func) = func else { continue };
        let is_entry = func
            .child_by_field_name("name")
            .is_some_and(|n| parsed.text(&n) == ENTRY_FUNCTION);
        if is_entry {
            return Some(func);
        }
        first.get_or_insert(func);
    }

    first
}

/// Number of named parameters of a function definition (splats excluded)
pub fn parameter_count(func: &Node) -> u32 {
    let Some(params) = func.child_by_field_name("parameters") else {
        return 0;
    };
    params
        .named_children(&mut params.walk())
        .filter(|p| {
            matches!(
                p.kind(),
                "identifier" | "typed_parameter" | "default_parameter" | "typed_default_parameter"
            )
        })
        .count() as u32
}

fn error_keywords() -> &'static Regex {
    static ERROR_KEYWORDS: OnceLock<Regex> = OnceLock::new();
    ERROR_KEYWORDS.get_or_init(|| {
        Regex::new(r"(?i)error|exception|valid|isinstance|fail|success").expect("valid regex")
    })
}

/// Exception handlers plus conditionals whose test mentions an
/// error/validity keyword
pub fn error_check_count(parsed: &ParsedSource) -> u32 {
    let mut count = 0;
    count_error_checks(&parsed.root(), parsed, &mut count);
    count
}

fn count_error_checks(node: &Node, parsed: &ParsedSource, count: &mut u32) {
    match node.kind() {
        "except_clause" | "except_group_clause" => *count += 1,
        "if_statement" | "elif_clause" => {
            let mentions_error = node
                .child_by_field_name("condition")
                .is_some_and(|c| error_keywords().is_match(parsed.text(&c)));
            if mentions_error {
                *count += 1;
            }
        }
        _ => {}
    }

    for child in node.children(&mut node.walk()) {
        count_error_checks(&child, parsed, count);
    }
}
