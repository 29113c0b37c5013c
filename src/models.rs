//! Core data models for tool complexity analysis
//!
//! Per-axis metrics, the combined score, and the per-tool / per-cohort
//! analysis records handed to ranking and reporting collaborators.

use crate::analyzers::AnalysisError;
use serde::{Deserialize, Serialize};

/// Static code metrics for one tool (code axis only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub cyclomatic: u32,
    pub cognitive: u32,
    pub nesting_depth: u32,
    pub lines_of_code: u32,
    pub function_count: u32,
    pub branch_count: u32,
    pub loop_count: u32,
}

impl ComplexityMetrics {
    /// Weighted code-axis composite
    pub fn score(&self) -> f64 {
        0.3 * f64::from(self.cyclomatic)
            + 0.2 * f64::from(self.cognitive)
            + 0.2 * f64::from(self.nesting_depth)
            + 0.15 * (f64::from(self.lines_of_code) / 10.0)
            + 0.1 * f64::from(self.branch_count)
            + 0.05 * f64::from(self.loop_count)
    }
}

/// Dynamic interface metrics from probing a tool's entry point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMetrics {
    /// `[0, 5]`
    pub param_complexity: f64,
    /// `[0, 3]`
    pub return_complexity: f64,
    /// `0`, `0.5` or `1`
    pub error_handling: f64,
    /// `0` or `1`
    pub context_usage: f64,
}

impl InterfaceMetrics {
    pub fn score(&self) -> f64 {
        0.4 * self.param_complexity
            + 0.3 * self.return_complexity
            + 0.2 * self.error_handling
            + 0.1 * self.context_usage
    }
}

/// Cohort-relative composition metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionMetrics {
    pub fan_out: u32,
    pub fan_in: u32,
    pub dependency_depth: u32,
    pub reuse_frequency: u32,
}

/// Reuse frequency above this contributes nothing extra to the composite
pub const REUSE_CAP: u32 = 5;

impl CompositionMetrics {
    pub fn score(&self) -> f64 {
        0.4 * f64::from(self.dependency_depth)
            + 0.3 * f64::from(self.fan_out)
            + 0.2 * f64::from(self.fan_in)
            + 0.1 * f64::from(self.reuse_frequency.min(REUSE_CAP))
    }
}

/// Combined score for one tool.
///
/// `tci_normalized` is relative to the largest `tci_raw` of the cohort it was
/// computed in and cannot be compared across cohorts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub code_complexity: f64,
    pub interface_complexity: f64,
    pub compositional_complexity: f64,
    pub tci_raw: f64,
    pub tci_normalized: f64,
}

/// Everything known about one tool after a scoring pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolAnalysis {
    pub name: String,
    pub creator_id: String,
    pub code: ComplexityMetrics,
    pub interface: InterfaceMetrics,
    pub composition: CompositionMetrics,
    pub score: Score,
    /// TCI-lite on a 0-10 scale, computed without cohort context
    pub tci_lite: f64,
    /// Set when the tool could not be analyzed; all metrics are then zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
}

impl ToolAnalysis {
    /// All-zero analysis flagged with `error`
    pub fn failed(name: &str, creator_id: &str, error: AnalysisError) -> Self {
        Self {
            name: name.to_string(),
            creator_id: creator_id.to_string(),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate statistics over a scored cohort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub total_tools: usize,
    pub failed_tools: usize,
    pub tci_mean: f64,
    pub tci_max: f64,
    pub tci_min: f64,
    pub code_mean: f64,
    pub interface_mean: f64,
    pub compositional_mean: f64,
    /// TCI-lite >= 7
    pub high_complexity_tools: usize,
    /// 3 <= TCI-lite < 7
    pub medium_complexity_tools: usize,
    /// TCI-lite < 3
    pub low_complexity_tools: usize,
}
