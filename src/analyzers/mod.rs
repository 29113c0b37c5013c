//! Per-axis complexity analyzers
//!
//! - [`code`]: static metrics from the syntax tree
//! - [`interface`]: dynamic probing of the entry point
//! - [`composition`]: cohort-wide call-dependency metrics
//!
//! Analyzer failures are local to one tool. They are reported as
//! [`AnalysisError`] values on that tool's analysis and never abort the rest
//! of the cohort.

pub mod code;
pub mod composition;
pub mod interface;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a tool received an all-zero analysis
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("failed to parse tool '{tool}': {message}")]
    Parse { tool: String, message: String },

    #[error("analysis of tool '{tool}' panicked: {message}")]
    Panicked { tool: String, message: String },
}

impl AnalysisError {
    pub fn tool(&self) -> &str {
        match self {
            AnalysisError::Parse { tool, .. } | AnalysisError::Panicked { tool, .. } => tool,
        }
    }
}
