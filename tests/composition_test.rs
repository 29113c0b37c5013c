//! Execution context contract tests
//!
//! Depth bound, cycle refusal, reward conservation and trace ordering,
//! exercised through the public API only.

use serde_json::{json, Value};
use std::sync::Arc;
use toolcraft::execution::{new_root_context, CallError, ROOT_CALLER};
use toolcraft::{Cohort, Tool};

/// `t1 -> t2 -> ... -> t{len}`. Each tool reports its callee's result (or
/// failure object) under `inner`.
fn chain(len: usize) -> Vec<Tool> {
    (1..=len)
        .map(|i| {
            let next = (i < len).then(|| format!("t{}", i + 1));
            Tool::new(format!("t{i}"), "", "X").with_fn(move |_p, ctx| {
                let Some(next) = &next else {
                    return Ok(json!({"success": true, "reached": i}));
                };
                let ctx = ctx.ok_or_else(|| anyhow::anyhow!("no composition handle"))?;
                let inner = match ctx.call_tool(next, json!({})) {
                    Ok(v) => v,
                    Err(e) => e.to_value(),
                };
                Ok(json!({"success": true, "inner": inner}))
            })
        })
        .collect()
}

fn nth_inner(mut value: &Value, n: usize) -> &Value {
    for _ in 0..n {
        value = &value["inner"];
    }
    value
}

#[test]
fn test_depth_bound_fails_exactly_at_call_k_plus_one() {
    for k in 1..=6 {
        let cohort = Arc::new(Cohort::new(chain(k + 1)));
        let mut ctx = new_root_context(cohort, "Y", k);

        let result = ctx.call_tool("t1", json!({})).expect("t1 runs");
        let failure = nth_inner(&result, k);
        assert_eq!(failure["error"], json!("MAX_DEPTH_REACHED"), "k = {k}");
        assert_eq!(failure["success"], json!(false));

        // calls 1..=k executed and were recorded, call k+1 was not
        assert_eq!(ctx.trace().len(), k, "k = {k}");
        assert_eq!(ctx.usage_counts().len(), k);
        assert!(!ctx.usage_counts().contains_key(&format!("t{}", k + 1)));
        assert_eq!(ctx.trace().last().map(|r| r.depth), Some(k - 1));
    }
}

#[test]
fn test_chain_within_bound_succeeds() {
    let k = 4;
    let cohort = Arc::new(Cohort::new(chain(k)));
    let mut ctx = new_root_context(cohort, "Y", k);

    let result = ctx.call_tool("t1", json!({})).expect("t1 runs");
    assert_eq!(nth_inner(&result, k - 1)["reached"], json!(k));
    assert_eq!(ctx.get_execution_summary().total_calls, k as u64);
}

#[test]
fn test_cycle_refused_without_breaking_caller() {
    let a = Tool::new("A", "", "X").with_fn(|_p, ctx| {
        let ctx = ctx.ok_or_else(|| anyhow::anyhow!("no composition handle"))?;
        let from_b = ctx.call_tool("B", json!({}))?;
        Ok(json!({"success": true, "from_b": from_b}))
    });
    let b = Tool::new("B", "", "X").with_fn(|_p, ctx| {
        let ctx = ctx.ok_or_else(|| anyhow::anyhow!("no composition handle"))?;
        match ctx.call_tool("A", json!({})) {
            Ok(_) => Ok(json!({"success": true, "called_back": true})),
            Err(e) => Ok(json!({"success": true, "refused": e.code(), "message": e.to_string()})),
        }
    });
    let mut ctx = new_root_context(Arc::new(Cohort::new(vec![a, b])), "Y", 5);

    let result = ctx.call_tool("A", json!({})).expect("A succeeds");
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["from_b"]["refused"], json!("CIRCULAR_DEPENDENCY"));
    assert_eq!(
        result["from_b"]["message"],
        json!("Circular dependency detected: A -> B -> A")
    );

    let names: Vec<&str> = ctx.trace().iter().map(|r| r.tool_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_cycle_error_value() {
    let selfish = Tool::new("loop", "", "X").with_fn(|_p, ctx| {
        let ctx = ctx.ok_or_else(|| anyhow::anyhow!("no composition handle"))?;
        let err = ctx
            .call_tool("loop", json!({}))
            .expect_err("self call must be refused");
        assert_eq!(
            err,
            CallError::CircularDependency {
                path: vec!["loop".to_string(), "loop".to_string()]
            }
        );
        Ok(json!({"success": true}))
    });
    let mut ctx = new_root_context(Arc::new(Cohort::new(vec![selfish])), "Y", 5);
    assert!(ctx.call_tool("loop", json!({})).is_ok());
}

fn energy_tool(name: &str, creator: &str, energy: i64) -> Tool {
    Tool::new(name, "", creator).with_fn(move |_p, _ctx| {
        Ok(json!({"success": true, "result": "done", "energy_gain": energy}))
    })
}

#[test]
fn test_reward_conservation() {
    let cohort = Arc::new(Cohort::new(vec![energy_tool("T", "X", 9)]));

    let mut by_y = new_root_context(Arc::clone(&cohort), "Y", 5);
    by_y.call_tool("T", json!({})).expect("Y uses T");
    assert_eq!(by_y.get_total_rewards().get("X"), Some(&3));

    let mut by_x = new_root_context(Arc::clone(&cohort), "X", 5);
    by_x.call_tool("T", json!({})).expect("X uses T");
    assert_eq!(by_x.get_total_rewards().get("X").copied().unwrap_or(0), 0);

    let mut by_z = new_root_context(Arc::clone(&cohort), "Z", 5);
    by_z.call_tool("T", json!({})).expect("Z uses T");

    let total: i64 = [&by_y, &by_x, &by_z]
        .iter()
        .filter_map(|ctx| ctx.get_total_rewards().get("X").copied())
        .sum();
    assert_eq!(total, 6);
}

#[test]
fn test_repeated_use_accumulates() {
    let cohort = Arc::new(Cohort::new(vec![energy_tool("T", "X", 9)]));
    let mut ctx = new_root_context(cohort, "Y", 5);
    ctx.call_tool("T", json!({})).expect("first use");
    ctx.call_tool("T", json!({})).expect("second use");
    assert_eq!(ctx.get_total_rewards().get("X"), Some(&6));
    assert_eq!(ctx.usage_counts().get("T"), Some(&2));
}

#[test]
fn test_nested_rewards_merge_to_root() {
    let (r_a, r_b) = (7_i64, 12_i64);
    let a = energy_tool("A", "X", r_a);
    let b = Tool::new("B", "", "X").with_fn(move |_p, ctx| {
        let ctx = ctx.ok_or_else(|| anyhow::anyhow!("no composition handle"))?;
        let inner = ctx.call_tool("A", json!({"n": 1}))?;
        Ok(json!({"success": true, "result": inner["result"].clone(), "energy_gain": r_b}))
    });
    let mut ctx = new_root_context(Arc::new(Cohort::new(vec![a, b])), "Y", 5);

    ctx.call_tool("B", json!({})).expect("B succeeds");

    let expected = (r_b / 3).max(1) + (r_a / 3).max(1);
    assert_eq!(ctx.get_total_rewards().get("X"), Some(&expected));
    assert_eq!(ctx.get_total_rewards().len(), 1);

    let summary = ctx.get_execution_summary();
    assert_eq!(summary.tools_used, vec!["A", "B"]);
    assert_eq!(summary.total_calls, 2);
    assert_eq!(summary.call_depth, 0);
    assert_eq!(summary.calling_agent, "Y");

    let graph = ctx.get_dependency_graph();
    assert_eq!(graph[ROOT_CALLER], vec!["B"]);
    assert_eq!(graph["B"], vec!["A"]);
}

#[test]
fn test_failures_stay_local_to_their_call() {
    let flaky = Tool::new("flaky", "", "X").with_fn(|_p, _ctx| anyhow::bail!("disk on fire"));
    let caller = Tool::new("caller", "", "Z").with_fn(|_p, ctx| {
        let ctx = ctx.ok_or_else(|| anyhow::anyhow!("no composition handle"))?;
        let first = ctx.call_tool("flaky", json!({}));
        let second = ctx.call_tool("missing", json!({}));
        let third = ctx.call_tool("ok", json!({}))?;
        Ok(json!({
            "success": true,
            "errors": [
                first.err().map(|e| e.code()),
                second.err().map(|e| e.code()),
            ],
            "third": third,
        }))
    });
    let cohort = Arc::new(Cohort::new(vec![flaky, caller, energy_tool("ok", "X", 3)]));
    let mut ctx = new_root_context(cohort, "Y", 5);

    let result = ctx.call_tool("caller", json!({})).expect("caller succeeds");
    assert_eq!(result["errors"], json!(["EXECUTION_ERROR", "TOOL_NOT_FOUND"]));
    assert_eq!(result["third"]["success"], json!(true));

    // caller, flaky (failed), ok; the missing tool never executed
    let names: Vec<&str> = ctx.trace().iter().map(|r| r.tool_name.as_str()).collect();
    assert_eq!(names, vec!["caller", "flaky", "ok"]);
    assert!(!ctx.trace()[1].success);

    let rewards = ctx.get_total_rewards();
    assert_eq!(rewards.get("Z"), Some(&1));
    assert_eq!(rewards.get("X"), Some(&1));
}

#[test]
fn test_concurrent_roots_share_nothing() {
    let cohort = Arc::new(Cohort::new(vec![energy_tool("T", "X", 30)]));
    let handles: Vec<_> = ["A1", "A2", "A3", "A4"]
        .into_iter()
        .map(|agent| {
            let cohort = Arc::clone(&cohort);
            std::thread::spawn(move || {
                let mut ctx = new_root_context(cohort, agent, 5);
                for _ in 0..10 {
                    ctx.call_tool("T", json!({})).expect("call");
                }
                ctx.get_total_rewards()
            })
        })
        .collect();

    for handle in handles {
        let rewards = handle.join().expect("thread finished");
        assert_eq!(rewards.get("X"), Some(&100));
    }
}
