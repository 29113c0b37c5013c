//! Compositional complexity analyzer
//!
//! Derives per-tool metrics from the cohort's static [`DependencyGraph`].
//! All values are relative to the cohort the graph was built from.
//!
//! Only literal tool names are visible here: a tool that picks its callee at
//! run time (`context.call_tool(name, ...)`) has no edge for that call.

use crate::graph::DependencyGraph;
use crate::models::CompositionMetrics;
use std::collections::HashMap;

/// Metrics for one tool. Unknown names get all zeros.
pub fn analyze(graph: &DependencyGraph, name: &str) -> CompositionMetrics {
    let fan_in = graph.fan_in(name);
    CompositionMetrics {
        fan_out: graph.fan_out(name),
        fan_in,
        dependency_depth: graph.dependency_depth(name),
        reuse_frequency: fan_in,
    }
}

/// Metrics for every tool in the graph
pub fn analyze_all<'a>(
    graph: &DependencyGraph,
    names: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, CompositionMetrics> {
    names
        .into_iter()
        .map(|name| (name.to_string(), analyze(graph, name)))
        .collect()
}
