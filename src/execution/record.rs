//! Call records and read-only execution projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Caller name used for calls made directly by the agent
pub const ROOT_CALLER: &str = "root";

/// One attempted tool call that reached execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub tool_name: String,
    pub parameters: Value,
    pub caller_agent_id: String,
    /// Stack length of the calling context
    pub depth: usize,
    /// Call stack of the calling context, outermost first
    pub stack_snapshot: Vec<String>,
    pub result: Value,
    pub success: bool,
}

impl CallRecord {
    /// The tool that made this call, or [`ROOT_CALLER`]
    pub fn caller(&self) -> &str {
        self.stack_snapshot.last().map_or(ROOT_CALLER, String::as_str)
    }
}

/// Snapshot of what one context has accumulated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub calling_agent: String,
    pub call_stack: Vec<String>,
    pub tools_used: Vec<String>,
    pub total_calls: u64,
    pub call_depth: usize,
    pub utility_rewards: BTreeMap<String, i64>,
    pub trace: Vec<CallRecord>,
}

/// Caller -> callees realized in a trace, callees in first-call order
pub fn realized_dependencies(trace: &[CallRecord]) -> BTreeMap<String, Vec<String>> {
    let mut deps: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in trace {
        let callees = deps.entry(record.caller().to_string()).or_default();
        if !callees.contains(&record.tool_name) {
            callees.push(record.tool_name.clone());
        }
    }
    deps
}
