//! Complexity combiner (TCI)
//!
//! Scoring runs in two phases:
//!
//! 1. **Per tool, in parallel.** Parse once, then code metrics, interface
//!    probing and TCI-lite. Each tool is isolated: a parse failure or a panic
//!    flags that tool with an [`AnalysisError`] and zeroes it.
//! 2. **Cohort-wide, after the join.** Build the static dependency graph from
//!    every tool's call sites, derive composition metrics, combine the three
//!    axes into `tci_raw`, and normalize against the cohort maximum. No
//!    `tci_normalized` is computed before every raw score exists.

pub mod lite;

use crate::analyzers::{code, composition, interface, AnalysisError};
use crate::cohort::Cohort;
use crate::graph::DependencyGraph;
use crate::models::{CohortSummary, ComplexityMetrics, InterfaceMetrics, Score, ToolAnalysis};
use crate::parsers::{self, python};
use crate::tool::{panic_message, Tool};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// TCI-lite at or above this is "high complexity"
pub const HIGH_LITE_THRESHOLD: f64 = 7.0;
/// TCI-lite at or above this (and below high) is "medium complexity"
pub const MEDIUM_LITE_THRESHOLD: f64 = 3.0;

/// Axis weights (alpha, beta, gamma)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TciWeights {
    pub code: f64,
    pub interface: f64,
    pub composition: f64,
}

impl Default for TciWeights {
    fn default() -> Self {
        Self {
            code: 1.0,
            interface: 1.0,
            composition: 1.0,
        }
    }
}

impl TciWeights {
    /// All weights finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.code, self.interface, self.composition]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }

    pub fn combine(&self, code: f64, interface: f64, composition: f64) -> f64 {
        self.code * code + self.interface * interface + self.composition * composition
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringOptions {
    pub weights: TciWeights,
    /// Run dynamic interface probing; when off every tool gets zero
    /// interface metrics
    pub probe: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            weights: TciWeights::default(),
            probe: true,
        }
    }
}

/// Result of one scoring pass over a cohort
#[derive(Debug, Clone)]
pub struct CohortAnalysis {
    /// One entry per tool, in cohort order
    pub tools: Vec<ToolAnalysis>,
    /// The static graph composition metrics were derived from
    pub graph: DependencyGraph,
}

impl CohortAnalysis {
    pub fn get(&self, name: &str) -> Option<&ToolAnalysis> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn scores(&self) -> BTreeMap<String, Score> {
        self.tools.iter().map(|t| (t.name.clone(), t.score)).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AnalysisError> {
        self.tools.iter().filter_map(|t| t.error.as_ref())
    }

    /// Tools by descending `tci_raw`, ties by name
    pub fn ranked(&self) -> Vec<&ToolAnalysis> {
        let mut ranked: Vec<&ToolAnalysis> = self.tools.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .tci_raw
                .total_cmp(&a.score.tci_raw)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
    }

    pub fn summary(&self) -> CohortSummary {
        summarize(&self.tools)
    }
}

/// Per-tool output of the parallel phase
struct LocalAnalysis {
    analysis: ToolAnalysis,
    calls: Vec<String>,
}

/// Score every tool of `cohort` with the given weights and probing on
pub fn score_cohort(cohort: &Cohort, weights: &TciWeights) -> BTreeMap<String, Score> {
    let options = ScoringOptions {
        weights: *weights,
        probe: true,
    };
    analyze_cohort(cohort, &options).scores()
}

/// Full scoring pass. Invalid weights are replaced with the defaults.
pub fn analyze_cohort(cohort: &Cohort, options: &ScoringOptions) -> CohortAnalysis {
    let start = Instant::now();

    let weights = if options.weights.is_valid() {
        options.weights
    } else {
        warn!(
            "Ignoring weights {:?}: must be finite and non-negative",
            options.weights
        );
        TciWeights::default()
    };

    let locals: Vec<LocalAnalysis> = cohort
        .tools()
        .par_iter()
        .map(|tool| analyze_tool_isolated(tool, options.probe))
        .collect();

    // Join point: the graph needs every tool's call sites
    let graph = DependencyGraph::from_calls(
        cohort.names(),
        locals
            .iter()
            .map(|l| (l.analysis.name.as_str(), l.calls.as_slice())),
    );
    let compositions = composition::analyze_all(&graph, cohort.names());

    let mut tools: Vec<ToolAnalysis> = locals
        .into_iter()
        .map(|local| {
            let mut analysis = local.analysis;
            if !analysis.is_failed() {
                analysis.composition = compositions
                    .get(&analysis.name)
                    .copied()
                    .unwrap_or_default();
                analysis.score = combine(&analysis, &weights);
            }
            analysis
        })
        .collect();

    normalize(&mut tools);

    let failed = tools.iter().filter(|t| t.is_failed()).count();
    info!(
        "Scored {} tools ({} failed, {} dependency edges) in {:?}",
        tools.len(),
        failed,
        graph.edge_count(),
        start.elapsed()
    );

    CohortAnalysis { tools, graph }
}

/// Analyze one tool, turning a panic anywhere in the analyzers into a
/// flagged zero analysis
fn analyze_tool_isolated(tool: &Tool, probe: bool) -> LocalAnalysis {
    match catch_unwind(AssertUnwindSafe(|| analyze_tool(tool, probe))) {
        Ok(local) => local,
        Err(panic_info) => {
            let message = panic_message(panic_info.as_ref());
            error!("Analysis of tool '{}' panicked: {}", tool.name, message);
            LocalAnalysis {
                analysis: ToolAnalysis::failed(
                    &tool.name,
                    &tool.creator_id,
                    AnalysisError::Panicked {
                        tool: tool.name.clone(),
                        message,
                    },
                ),
                calls: Vec::new(),
            }
        }
    }
}

fn analyze_tool(tool: &Tool, probe: bool) -> LocalAnalysis {
    let parsed = match parsers::parse_source(&tool.source_text) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Tool '{}' could not be parsed: {}", tool.name, e);
            return LocalAnalysis {
                analysis: ToolAnalysis::failed(
                    &tool.name,
                    &tool.creator_id,
                    AnalysisError::Parse {
                        tool: tool.name.clone(),
                        message: e.to_string(),
                    },
                ),
                calls: Vec::new(),
            };
        }
    };

    let code: ComplexityMetrics = code::analyze(&parsed);
    let interface: InterfaceMetrics = if probe {
        interface::analyze(tool)
    } else {
        InterfaceMetrics::default()
    };
    let tci_lite = lite::tci_lite(&parsed);
    let calls = python::tool_calls(&parsed);

    debug!(
        "Tool '{}': cyclomatic={} loc={} calls={} lite={}",
        tool.name,
        code.cyclomatic,
        code.lines_of_code,
        calls.len(),
        tci_lite
    );

    LocalAnalysis {
        analysis: ToolAnalysis {
            name: tool.name.clone(),
            creator_id: tool.creator_id.clone(),
            code,
            interface,
            tci_lite,
            ..Default::default()
        },
        calls,
    }
}

fn combine(analysis: &ToolAnalysis, weights: &TciWeights) -> Score {
    let code_complexity = analysis.code.score();
    let interface_complexity = analysis.interface.score();
    let compositional_complexity = analysis.composition.score();
    Score {
        code_complexity,
        interface_complexity,
        compositional_complexity,
        tci_raw: weights.combine(code_complexity, interface_complexity, compositional_complexity),
        tci_normalized: 0.0,
    }
}

/// Set `tci_normalized = tci_raw / max(tci_raw)`, or 0 everywhere when the
/// maximum is not positive
pub fn normalize(tools: &mut [ToolAnalysis]) {
    let max = tools
        .iter()
        .map(|t| t.score.tci_raw)
        .fold(0.0_f64, f64::max);

    for tool in tools.iter_mut() {
        tool.score.tci_normalized = if max > 0.0 {
            tool.score.tci_raw / max
        } else {
            0.0
        };
    }
}

/// Aggregate statistics. Score statistics and complexity buckets cover the
/// successfully analyzed tools only.
pub fn summarize(tools: &[ToolAnalysis]) -> CohortSummary {
    let analyzed: Vec<&ToolAnalysis> = tools.iter().filter(|t| !t.is_failed()).collect();
    let mut summary = CohortSummary {
        total_tools: tools.len(),
        failed_tools: tools.len() - analyzed.len(),
        ..Default::default()
    };
    if analyzed.is_empty() {
        return summary;
    }

    let n = analyzed.len() as f64;
    let mean = |f: fn(&ToolAnalysis) -> f64| analyzed.iter().map(|t| f(t)).sum::<f64>() / n;

    summary.tci_mean = mean(|t| t.score.tci_raw);
    summary.code_mean = mean(|t| t.score.code_complexity);
    summary.interface_mean = mean(|t| t.score.interface_complexity);
    summary.compositional_mean = mean(|t| t.score.compositional_complexity);
    summary.tci_max = analyzed
        .iter()
        .map(|t| t.score.tci_raw)
        .fold(f64::NEG_INFINITY, f64::max);
    summary.tci_min = analyzed
        .iter()
        .map(|t| t.score.tci_raw)
        .fold(f64::INFINITY, f64::min);

    for tool in &analyzed {
        if tool.tci_lite >= HIGH_LITE_THRESHOLD {
            summary.high_complexity_tools += 1;
        } else if tool.tci_lite >= MEDIUM_LITE_THRESHOLD {
            summary.medium_complexity_tools += 1;
        } else {
            summary.low_complexity_tools += 1;
        }
    }

    summary
}
