//! Static call-dependency graph of a cohort
//!
//! Nodes are the cohort's tool names. There is an edge `A -> B` iff A's
//! source contains a literal `call_tool("B", ...)` site and B is in the
//! cohort. Parallel edges are collapsed; self-loops are kept as data.
//!
//! Depth computation is cycle-safe: a node already on the current DFS path
//! contributes 0, so cyclic cohorts terminate in O(V+E).

use crate::cohort::Cohort;
use crate::parsers::{self, python};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Graph with the given nodes and no edges
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut dg = Self::default();
        for name in names {
            let name = name.into();
            if !dg.index.contains_key(&name) {
                let idx = dg.graph.add_node(name.clone());
                dg.index.insert(name, idx);
            }
        }
        dg
    }

    /// Build from per-tool call-site lists. Calls to names outside the node
    /// set are dropped.
    pub fn from_calls<'a>(
        names: impl IntoIterator<Item = &'a str>,
        calls: impl IntoIterator<Item = (&'a str, &'a [String])>,
    ) -> Self {
        let mut dg = Self::new(names);
        for (caller, callees) in calls {
            for callee in callees {
                if !dg.add_dependency(caller, callee) {
                    debug!("Ignoring call from '{}' to unknown tool '{}'", caller, callee);
                }
            }
        }
        dg
    }

    /// Parse every tool of the cohort and build its graph. Tools whose source
    /// does not parse contribute no outgoing edges.
    pub fn from_cohort(cohort: &Cohort) -> Self {
        let calls: Vec<(&str, Vec<String>)> = cohort
            .tools()
            .iter()
            .map(|tool| {
                let sites = parsers::parse_source(&tool.source_text)
                    .map(|parsed| python::tool_calls(&parsed))
                    .unwrap_or_default();
                (tool.name.as_str(), sites)
            })
            .collect();

        Self::from_calls(
            cohort.names(),
            calls.iter().map(|(name, sites)| (*name, sites.as_slice())),
        )
    }

    /// Add `caller -> callee`. Returns false if either end is not a node.
    pub fn add_dependency(&mut self, caller: &str, callee: &str) -> bool {
        match (self.index.get(caller), self.index.get(callee)) {
            (Some(&from), Some(&to)) => {
                self.graph.update_edge(from, to, ());
                true
            }
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Distinct tools called by `name`, sorted
    pub fn callees(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Distinct tools calling `name`, sorted
    pub fn callers(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return vec![];
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }

    /// Distinct outgoing edges (a self-loop counts)
    pub fn fan_out(&self, name: &str) -> u32 {
        self.index
            .get(name)
            .map_or(0, |&idx| self.graph.edges_directed(idx, Direction::Outgoing).count() as u32)
    }

    /// Distinct incoming edges from other tools (a self-loop does not count)
    pub fn fan_in(&self, name: &str) -> u32 {
        self.index.get(name).map_or(0, |&idx| {
            self.graph
                .edges_directed(idx, Direction::Incoming)
                .filter(|e| e.source() != idx)
                .count() as u32
        })
    }

    /// Length of the longest outgoing call path from `name`
    pub fn dependency_depth(&self, name: &str) -> u32 {
        let Some(&start) = self.index.get(name) else {
            return 0;
        };
        let mut on_path = HashSet::new();
        let mut memo = HashMap::new();
        self.longest_path(start, &mut on_path, &mut memo)
    }

    fn longest_path(
        &self,
        node: NodeIndex,
        on_path: &mut HashSet<NodeIndex>,
        memo: &mut HashMap<NodeIndex, u32>,
    ) -> u32 {
        // Revisiting a node on the current path means a cycle
        if on_path.contains(&node) {
            return 0;
        }
        if let Some(&depth) = memo.get(&node) {
            return depth;
        }

        on_path.insert(node);
        let mut best = 0;
        for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
            best = best.max(1 + self.longest_path(next, on_path, memo));
        }
        on_path.remove(&node);

        memo.insert(node, best);
        best
    }

    /// Groups of mutually dependent tools: strongly connected components with
    /// more than one member, plus tools that call themselves. Each group is
    /// sorted; groups are sorted by their first member.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut names: Vec<String> = scc.into_iter().map(|i| self.graph[i].clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Adjacency as sorted name lists, including tools with no callees
    pub fn adjacency(&self) -> BTreeMap<String, Vec<String>> {
        self.index
            .keys()
            .map(|name| {
                let callees = self.callees(name).into_iter().map(str::to_string).collect();
                (name.clone(), callees)
            })
            .collect()
    }

    /// All edges as sorted `(caller, callee)` pairs
    pub fn edges(&self) -> BTreeSet<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].clone(), self.graph[e.target()].clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(names: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut g = DependencyGraph::new(names.iter().copied());
        for (a, b) in edges {
            assert!(g.add_dependency(a, b));
        }
        g
    }

    #[test]
    fn test_chain_depth_and_fans() {
        let g = graph(&["a", "b", "c"], &[("b", "a"), ("c", "b"), ("c", "a")]);
        assert_eq!(g.dependency_depth("a"), 0);
        assert_eq!(g.dependency_depth("b"), 1);
        assert_eq!(g.dependency_depth("c"), 2);
        assert_eq!(g.fan_in("a"), 2);
        assert_eq!(g.fan_in("b"), 1);
        assert_eq!(g.fan_out("c"), 2);
        assert!(g.cycles().is_empty());
    }

    #[test]
    fn test_parallel_edges_collapse() {
        let g = graph(&["a", "b"], &[("b", "a"), ("b", "a"), ("b", "a")]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.fan_out("b"), 1);
        assert_eq!(g.fan_in("a"), 1);
    }

    #[test]
    fn test_two_cycle_terminates() {
        let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert_eq!(g.dependency_depth("a"), 2);
        assert_eq!(g.dependency_depth("b"), 2);
        assert_eq!(g.cycles(), vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&["a"], &[("a", "a")]);
        assert_eq!(g.dependency_depth("a"), 1);
        assert_eq!(g.fan_out("a"), 1);
        assert_eq!(g.fan_in("a"), 0);
        assert_eq!(g.cycles(), vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_diamond_uses_longest_branch() {
        // c -> a -> d, c -> b -> a
        let g = graph(&["a", "b", "c", "d"], &[("c", "a"), ("a", "d"), ("c", "b"), ("b", "a")]);
        assert_eq!(g.dependency_depth("c"), 3);
    }

    #[test]
    fn test_unknown_callee_dropped() {
        let calls = vec![("a".to_string(), vec!["ghost".to_string(), "b".to_string()])];
        let g = DependencyGraph::from_calls(
            ["a", "b"],
            calls.iter().map(|(n, c)| (n.as_str(), c.as_slice())),
        );
        assert_eq!(g.callees("a"), vec!["b"]);
        assert!(!g.contains("ghost"));
    }

    #[test]
    fn test_large_ring_terminates() {
        let names: Vec<String> = (0..500).map(|i| format!("t{}", i)).collect();
        let mut g = DependencyGraph::new(names.iter().cloned());
        for i in 0..500 {
            g.add_dependency(&names[i], &names[(i + 1) % 500]);
        }
        assert_eq!(g.dependency_depth("t0"), 500);
        assert_eq!(g.cycles().len(), 1);
    }
}
