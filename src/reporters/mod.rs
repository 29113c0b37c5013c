//! Output reporters for cohort analyses
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

use crate::graph::DependencyGraph;
use crate::models::{CohortSummary, ToolAnalysis};
use crate::scoring::lite::LiteScore;
use crate::scoring::CohortAnalysis;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// A scored cohort, tools ranked by descending `tci_raw`
#[derive(Debug, Serialize)]
pub struct CohortReport<'a> {
    pub summary: CohortSummary,
    pub tools: Vec<&'a ToolAnalysis>,
    pub cycles: Vec<Vec<String>>,
}

impl<'a> CohortReport<'a> {
    pub fn new(analysis: &'a CohortAnalysis) -> Self {
        Self {
            summary: analysis.summary(),
            tools: analysis.ranked(),
            cycles: analysis.graph.cycles(),
        }
    }
}

/// The static dependency graph of a cohort
#[derive(Debug, Serialize)]
pub struct GraphReport {
    pub tools: usize,
    pub edge_count: usize,
    /// caller -> callees
    pub edges: BTreeMap<String, Vec<String>>,
    pub cycles: Vec<Vec<String>>,
}

impl GraphReport {
    pub fn new(graph: &DependencyGraph) -> Self {
        Self {
            tools: graph.node_count(),
            edge_count: graph.edge_count(),
            edges: graph.adjacency(),
            cycles: graph.cycles(),
        }
    }
}

pub fn render_cohort(analysis: &CohortAnalysis, format: OutputFormat) -> Result<String> {
    let report = CohortReport::new(analysis);
    match format {
        OutputFormat::Text => Ok(text::render_cohort(&report)),
        OutputFormat::Json => json::render(&report),
    }
}

pub fn render_graph(graph: &DependencyGraph, format: OutputFormat) -> Result<String> {
    let report = GraphReport::new(graph);
    match format {
        OutputFormat::Text => Ok(text::render_graph(&report)),
        OutputFormat::Json => json::render(&report),
    }
}

/// Render TCI-lite scores, highest first
pub fn render_lite(scores: &[LiteScore], format: OutputFormat) -> Result<String> {
    let mut ranked: Vec<&LiteScore> = scores.iter().collect();
    ranked.sort_by(|a, b| b.tci_lite.total_cmp(&a.tci_lite).then_with(|| a.name.cmp(&b.name)));
    match format {
        OutputFormat::Text => Ok(text::render_lite(&ranked)),
        OutputFormat::Json => json::render(&ranked),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::scoring::{analyze_cohort, ScoringOptions};
    use crate::tool::Tool;

    /// Three tools: `leaf`, `mid` calling leaf, a broken one, and a pair
    /// calling each other
    pub(crate) fn test_analysis() -> CohortAnalysis {
        let cohort = Cohort::new(vec![
            Tool::new("leaf", "def execute(parameters):\n    return {}\n", "Agent_1"),
            Tool::new(
                "mid",
                "def execute(parameters, context=None):\n    if parameters:\n        return context.call_tool(\"leaf\", parameters)\n    return {}\n",
                "Agent_2",
            ),
            Tool::new("broken", "def execute(:\n", "Agent_3"),
            Tool::new("ping", "def execute(p, context=None):\n    return context.call_tool(\"pong\", p)\n", "Agent_1"),
            Tool::new("pong", "def execute(p, context=None):\n    return context.call_tool(\"ping\", p)\n", "Agent_1"),
        ]);
        analyze_cohort(
            &cohort,
            &ScoringOptions {
                probe: false,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").expect("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").expect("json"), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_graph_report() {
        let analysis = test_analysis();
        let report = GraphReport::new(&analysis.graph);
        assert_eq!(report.tools, 5);
        assert_eq!(report.edge_count, 3);
        assert_eq!(report.edges["mid"], vec!["leaf"]);
        assert_eq!(report.cycles, vec![vec!["ping".to_string(), "pong".to_string()]]);
    }

    #[test]
    fn test_cohort_report_is_ranked() {
        let analysis = test_analysis();
        let report = CohortReport::new(&analysis);
        let raw: Vec<f64> = report.tools.iter().map(|t| t.score.tci_raw).collect();
        assert!(raw.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(report.summary.failed_tools, 1);
    }
}
