//! Composition execution context
//!
//! Lets a tool invoke other tools while enforcing a recursion bound and
//! refusing re-entry of any tool already on the active call stack. Every
//! call runs in a fresh child context; once the call returns, the child's
//! rewards, usage counts and trace are merged into the parent. A root
//! context is owned by exactly one agent action and shares nothing mutable
//! with any other root.
//!
//! # Call lifecycle
//!
//! ```text
//! call_tool(name, params)
//!   stack full?           -> MaxDepthReached     (nothing recorded)
//!   name on stack?        -> CircularDependency  (nothing recorded)
//!   name not in cohort?   -> ToolNotFound        (nothing recorded)
//!   run entry in child    -> returned | failed   (recorded, merged)
//! ```
//!
//! A returned result is successful only if it says `"success": true`.
//! Successful calls bump the tool's usage count and, when the tool's creator
//! is neither the root agent nor `system`, credit the creator with
//! `max(1, floor(energy_gain / 3))`.

mod error;
mod record;

pub use error::CallError;
pub use record::{realized_dependencies, CallRecord, ExecutionSummary, ROOT_CALLER};

use crate::cohort::Cohort;
use crate::tool::Tool;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Default recursion bound for a root context
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Result field a tool uses to report its primary reward
pub const PRIMARY_REWARD_FIELD: &str = "energy_gain";

/// Create the root context for one agent action
pub fn new_root_context(
    cohort: Arc<Cohort>,
    calling_agent_id: impl Into<String>,
    max_depth: usize,
) -> ExecutionContext {
    ExecutionContext::new_root(cohort, calling_agent_id, max_depth)
}

#[derive(Debug)]
pub struct ExecutionContext {
    cohort: Arc<Cohort>,
    /// The agent whose action owns the root; inherited unchanged by children
    calling_agent_id: String,
    call_stack: Vec<String>,
    max_depth: usize,
    utility_rewards: BTreeMap<String, i64>,
    usage_counts: BTreeMap<String, u64>,
    trace: Vec<CallRecord>,
}

impl ExecutionContext {
    pub fn new_root(cohort: Arc<Cohort>, calling_agent_id: impl Into<String>, max_depth: usize) -> Self {
        Self {
            cohort,
            calling_agent_id: calling_agent_id.into(),
            call_stack: Vec::new(),
            max_depth,
            utility_rewards: BTreeMap::new(),
            usage_counts: BTreeMap::new(),
            trace: Vec::new(),
        }
    }

    /// Copy of the fixed parts with `name` pushed and empty accumulators
    fn child(&self, name: &str) -> Self {
        let mut call_stack = self.call_stack.clone();
        call_stack.push(name.to_string());
        Self {
            cohort: Arc::clone(&self.cohort),
            calling_agent_id: self.calling_agent_id.clone(),
            call_stack,
            max_depth: self.max_depth,
            utility_rewards: BTreeMap::new(),
            usage_counts: BTreeMap::new(),
            trace: Vec::new(),
        }
    }

    /// Invoke the tool `name` with `params`.
    ///
    /// `Ok` carries whatever the tool returned, including its own
    /// `"success": false` results. `Err` means the call never produced a tool
    /// result; [`CallError::to_value`] turns it into a failure object.
    pub fn call_tool(&mut self, name: &str, params: Value) -> Result<Value, CallError> {
        if self.call_stack.len() >= self.max_depth {
            debug!("Refusing '{}': depth {} at limit {}", name, self.call_stack.len(), self.max_depth);
            return Err(CallError::MaxDepthReached {
                max_depth: self.max_depth,
            });
        }

        if self.is_recursive_call(name) {
            let mut path = self.call_stack.clone();
            path.push(name.to_string());
            debug!("Refusing '{}': circular call {}", name, path.join(" -> "));
            return Err(CallError::CircularDependency { path });
        }

        let cohort = Arc::clone(&self.cohort);
        let Some(tool) = cohort.get(name) else {
            debug!("Refusing '{}': not in cohort", name);
            return Err(CallError::ToolNotFound {
                name: name.to_string(),
            });
        };

        let mut child = self.child(name);
        let timestamp = Utc::now();

        let outcome = match tool.invoke(&params, Some(&mut child)) {
            Ok(value) => Ok(value),
            Err(description) => {
                debug!("Tool '{}' raised: {}", name, description);
                Err(CallError::ExecutionError {
                    name: name.to_string(),
                    description,
                })
            }
        };

        let (recorded, success) = match &outcome {
            Ok(value) => (value.clone(), is_success(value)),
            Err(e) => (e.to_value(), false),
        };

        if success {
            *child.usage_counts.entry(name.to_string()).or_insert(0) += 1;
            if let Ok(value) = &outcome {
                self.credit_creator(&mut child, tool, value);
            }
        }

        let record = CallRecord {
            timestamp,
            tool_name: name.to_string(),
            parameters: params,
            caller_agent_id: self.calling_agent_id.clone(),
            depth: self.call_stack.len(),
            stack_snapshot: self.call_stack.clone(),
            result: recorded,
            success,
        };

        // The call's own record precedes the records of the calls it made
        let nested = std::mem::take(&mut child.trace);
        child.trace.push(record);
        child.trace.extend(nested);

        self.merge(child);
        outcome
    }

    fn credit_creator(&self, child: &mut ExecutionContext, tool: &Tool, result: &Value) {
        if !tool.has_rewardable_creator() || tool.creator_id == self.calling_agent_id {
            return;
        }

        let reward = utility_reward(primary_reward(result));
        *child.utility_rewards.entry(tool.creator_id.clone()).or_insert(0) += reward;
        info!(
            "Utility reward: {} gets +{} for '{}' used by {}",
            tool.creator_id, reward, tool.name, self.calling_agent_id
        );
    }

    /// Fold a finished child into this context
    fn merge(&mut self, child: ExecutionContext) {
        for (agent, reward) in child.utility_rewards {
            *self.utility_rewards.entry(agent).or_insert(0) += reward;
        }
        for (tool, count) in child.usage_counts {
            *self.usage_counts.entry(tool).or_insert(0) += count;
        }
        self.trace.extend(child.trace);
    }

    /// Accumulated utility rewards per creator
    pub fn get_total_rewards(&self) -> BTreeMap<String, i64> {
        self.utility_rewards.clone()
    }

    pub fn get_execution_summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            calling_agent: self.calling_agent_id.clone(),
            call_stack: self.call_stack.clone(),
            tools_used: self.usage_counts.keys().cloned().collect(),
            total_calls: self.usage_counts.values().sum(),
            call_depth: self.call_stack.len(),
            utility_rewards: self.utility_rewards.clone(),
            trace: self.trace.clone(),
        }
    }

    /// Caller -> callee edges realized by the calls in this context's trace
    pub fn get_dependency_graph(&self) -> BTreeMap<String, Vec<String>> {
        realized_dependencies(&self.trace)
    }

    pub fn is_recursive_call(&self, name: &str) -> bool {
        self.call_stack.iter().any(|n| n == name)
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn calling_agent(&self) -> &str {
        &self.calling_agent_id
    }

    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn usage_counts(&self) -> &BTreeMap<String, u64> {
        &self.usage_counts
    }

    pub fn trace(&self) -> &[CallRecord] {
        &self.trace
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionContext(agent={}, depth={}, stack={})",
            self.calling_agent_id,
            self.call_stack.len(),
            self.call_stack.join(" -> ")
        )
    }
}

/// A returned value is a success only when it explicitly says so
fn is_success(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool) == Some(true)
}

/// The numeric primary reward a result reports, floored; 0 if absent
fn primary_reward(value: &Value) -> i64 {
    match value.get(PRIMARY_REWARD_FIELD) {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f.floor() as i64))
            .unwrap_or(0),
        None => 0,
    }
}

/// A third of the primary reward, rounded down, never less than 1
fn utility_reward(primary: i64) -> i64 {
    primary.div_euclid(3).max(1)
}
