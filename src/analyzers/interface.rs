//! Interface complexity analyzer
//!
//! Probes a tool's entry point with a fixed, ordered battery of synthetic
//! inputs and scores what comes back. Every probe is isolated: a probe whose
//! invocation fails or panics contributes zero and the remaining probes
//! still run.
//!
//! The context-usage probe compares a bare call with a call that receives a
//! composition handle. Tools with nondeterministic output (randomness,
//! clocks) can read as context-sensitive here.

use crate::cohort::Cohort;
use crate::execution::{ExecutionContext, DEFAULT_MAX_DEPTH};
use crate::models::InterfaceMetrics;
use crate::tool::Tool;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Agent id the context-usage probe runs as
pub const PROBE_AGENT: &str = "interface-probe";

const PARAM_COMPLEXITY_CAP: f64 = 5.0;
const RETURN_COMPLEXITY_CAP: f64 = 3.0;

/// The synthetic inputs, in invocation order: empty, flat small collection,
/// several scalars plus a collection, deeply nested structure.
pub fn probe_battery() -> [Value; 4] {
    [
        json!({}),
        json!({"data": [1, 2, 3]}),
        json!({"a": 5, "b": 10, "name": "probe", "items": [1, 2, 3, 4, 5]}),
        json!({
            "config": {
                "nested": {
                    "deep": {
                        "value": 42,
                        "tags": ["x", {"y": [1, 2, {"z": true}]}]
                    }
                }
            }
        }),
    ]
}

/// Parameters of the wrong shape for any reasonable tool
pub fn invalid_params() -> Value {
    json!({"a": "not-a-number", "b": null, "data": 42, "items": "not-a-list"})
}

/// Probe `tool`. Tools without an entry point score zero.
pub fn analyze(tool: &Tool) -> InterfaceMetrics {
    if tool.entry.is_none() {
        debug!("Interface probing skipped for '{}': no entry point", tool.name);
        return InterfaceMetrics::default();
    }

    let battery = probe_battery();
    let results: Vec<Option<Value>> = battery
        .iter()
        .enumerate()
        .map(|(i, params)| match tool.invoke(params, None) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Probe {} of '{}' failed: {}", i + 1, tool.name, e);
                None
            }
        })
        .collect();

    InterfaceMetrics {
        param_complexity: param_complexity(&battery, &results),
        return_complexity: return_complexity(&results),
        error_handling: error_handling(tool),
        context_usage: context_usage(tool, &battery[1]),
    }
}

/// Size of a value in its compact JSON form
pub fn structural_size(value: &Value) -> usize {
    serde_json::to_string(value).map_or(0, |s| s.len())
}

/// Nesting depth: scalars are 0, a container is one more than its deepest
/// element
pub fn nesting_depth(value: &Value) -> u32 {
    match value {
        Value::Object(map) => 1 + map.values().map(nesting_depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(nesting_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// `successful * (mean input size of the successful probes / 100)`, capped
fn param_complexity(inputs: &[Value], results: &[Option<Value>]) -> f64 {
    let sizes: Vec<usize> = inputs
        .iter()
        .zip(results)
        .filter(|(_, r)| r.is_some())
        .map(|(input, _)| structural_size(input))
        .collect();

    if sizes.is_empty() {
        return 0.0;
    }
    let successful = sizes.len() as f64;
    let avg_size = sizes.iter().sum::<usize>() as f64 / successful;
    (successful * (avg_size / 100.0)).min(PARAM_COMPLEXITY_CAP)
}

/// Mean per-result structure score over the probes that returned
fn return_complexity(results: &[Option<Value>]) -> f64 {
    let scores: Vec<f64> = results.iter().flatten().map(result_structure_score).collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn result_structure_score(value: &Value) -> f64 {
    let key_count = value.as_object().map_or(0, |m| m.len());
    let score = key_count as f64 * 0.2 + f64::from(nesting_depth(value)) * 0.5;
    score.min(RETURN_COMPLEXITY_CAP)
}

/// 1.0 for a structured failure with an `error` field, 0.5 for any other
/// object or array, 0.0 for a scalar or a raised error
fn error_handling(tool: &Tool) -> f64 {
    match tool.invoke(&invalid_params(), None) {
        Ok(Value::Object(map)) => {
            if map.get("error").is_some_and(|e| !e.is_null()) {
                1.0
            } else {
                0.5
            }
        }
        Ok(Value::Array(_)) => 0.5,
        Ok(_) => 0.0,
        Err(e) => {
            debug!("Error-handling probe of '{}' raised: {}", tool.name, e);
            0.0
        }
    }
}

/// 1.0 if passing a composition handle changes the output
fn context_usage(tool: &Tool, params: &Value) -> f64 {
    let without = tool.invoke(params, None);

    let mut probe_ctx = ExecutionContext::new_root(Arc::new(Cohort::empty()), PROBE_AGENT, DEFAULT_MAX_DEPTH);
    let with = tool.invoke(params, Some(&mut probe_ctx));

    match (without, with) {
        (Ok(a), Ok(b)) => {
            if a != b {
                1.0
            } else {
                0.0
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            debug!("Context-usage probe of '{}' raised: {}", tool.name, e);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_entry_scores_zero() {
        let tool = Tool::new("source_only", "def execute(p): pass", "x");
        assert_eq!(analyze(&tool), InterfaceMetrics::default());
    }

    #[test]
    fn test_always_raising_tool() {
        let tool = Tool::new("raiser", "", "x").with_fn(|_p, _ctx| anyhow::bail!("nope"));
        let m = analyze(&tool);
        assert_eq!(m, InterfaceMetrics::default());
    }

    #[test]
    fn test_echo_tool_metrics() {
        let tool = Tool::new("echo", "", "x").with_fn(|p, _ctx| Ok(p.clone()));
        let m = analyze(&tool);

        let battery = probe_battery();
        let sizes: Vec<f64> = battery.iter().map(|v| structural_size(v) as f64).collect();
        let avg = sizes.iter().sum::<f64>() / 4.0;
        assert!(approx(m.param_complexity, (4.0 * avg / 100.0).min(5.0)));

        let expected_return: f64 = battery
            .iter()
            .map(|v| {
                let keys = v.as_object().map_or(0, |o| o.len()) as f64;
                (keys * 0.2 + f64::from(nesting_depth(v)) * 0.5).min(3.0)
            })
            .sum::<f64>()
            / 4.0;
        assert!(approx(m.return_complexity, expected_return));

        // echoes the invalid params back: an object with no error field
        assert!(approx(m.error_handling, 0.5));
        assert!(approx(m.context_usage, 0.0));
    }

    #[test]
    fn test_structured_error_reporting() {
        let tool = Tool::new("validator", "", "x").with_fn(|p, _ctx| {
            if p.get("a").and_then(Value::as_i64).is_none() && p.get("a").is_some() {
                return Ok(json!({"success": false, "error": "a must be a number"}));
            }
            Ok(json!({"success": true, "result": 1}))
        });
        assert!(approx(analyze(&tool).error_handling, 1.0));
    }

    #[test]
    fn test_context_sensitive_tool() {
        let tool = Tool::new("composer", "", "x").with_fn(|_p, ctx| match ctx {
            Some(ctx) => {
                let inner = ctx.call_tool("multiply", json!({"a": 2, "b": 3}));
                Ok(json!({"success": inner.is_ok()}))
            }
            None => Ok(json!({"success": true, "standalone": true})),
        });
        assert!(approx(analyze(&tool).context_usage, 1.0));
    }

    #[test]
    fn test_partial_failures_only_drop_their_probe() {
        // Fails only on the empty input
        let tool = Tool::new("picky", "", "x").with_fn(|p, _ctx| {
            if p.as_object().is_some_and(|o| o.is_empty()) {
                anyhow::bail!("empty input");
            }
            Ok(json!({"ok": true}))
        });
        let m = analyze(&tool);

        let battery = probe_battery();
        let avg = battery[1..].iter().map(|v| structural_size(v) as f64).sum::<f64>() / 3.0;
        assert!(approx(m.param_complexity, (3.0 * avg / 100.0).min(5.0)));
        // {"ok": true}: one key, depth one
        assert!(approx(m.return_complexity, 0.2 + 0.5));
    }

    #[test]
    fn test_panicking_probe_is_contained() {
        let tool = Tool::new("panicky", "", "x").with_fn(|_p, _ctx| panic!("probe panic"));
        assert_eq!(analyze(&tool), InterfaceMetrics::default());
    }

    #[test]
    fn test_collection_results_handle_bad_input() {
        let listing = Tool::new("listing", "", "x").with_fn(|_p, _ctx| Ok(json!(["a", "b"])));
        assert!(approx(analyze(&listing).error_handling, 0.5));

        let scalar = Tool::new("scalar", "", "x").with_fn(|_p, _ctx| Ok(json!(7)));
        assert!(approx(analyze(&scalar).error_handling, 0.0));
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth(&json!(1)), 0);
        assert_eq!(nesting_depth(&json!({})), 1);
        assert_eq!(nesting_depth(&json!({"a": [1, {"b": 2}]})), 3);
    }
}
