//! Toolcraft - tool complexity scoring and recursive tool composition
//!
//! Agents in a simulated population author small callable tools. This crate
//! answers two questions about them:
//!
//! - **How complex is each tool?** Static code metrics, dynamic interface
//!   probing and cohort-relative composition metrics are combined into a
//!   Tool Complexity Index (TCI), normalized across the cohort.
//! - **How do tools call each other safely?** An [`execution::ExecutionContext`]
//!   lets one tool invoke another with a depth bound, cycle detection and
//!   utility rewards credited back to tool creators.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolcraft::{Cohort, Tool, scoring::{score_cohort, TciWeights}};
//! use toolcraft::execution::new_root_context;
//!
//! let cohort = Arc::new(Cohort::new(tools));
//! let scores = score_cohort(&cohort, &TciWeights::default());
//!
//! let mut ctx = new_root_context(Arc::clone(&cohort), "Agent_1", 5);
//! let result = ctx.call_tool("square", serde_json::json!({"number": 8}));
//! let rewards = ctx.get_total_rewards();
//! ```

pub mod analyzers;
pub mod cohort;
pub mod config;
pub mod execution;
pub mod graph;
pub mod models;
pub mod parsers;
pub mod reporters;
pub mod scoring;
pub mod tool;

pub use cohort::Cohort;
pub use tool::{Tool, ToolEntry, ToolMetadata};
