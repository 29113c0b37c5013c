//! Failure taxonomy for tool-to-tool calls

use serde_json::{json, Value};
use thiserror::Error;

/// Why a `call_tool` did not produce a tool result.
///
/// These are ordinary values for the caller; none of them unwinds past the
/// context that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Maximum recursion depth ({max_depth}) reached")]
    MaxDepthReached { max_depth: usize },

    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("Tool \"{name}\" not found in registry")]
    ToolNotFound { name: String },

    #[error("Error executing tool \"{name}\": {description}")]
    ExecutionError { name: String, description: String },
}

impl CallError {
    /// Stable code used in structured failure objects
    pub fn code(&self) -> &'static str {
        match self {
            CallError::MaxDepthReached { .. } => "MAX_DEPTH_REACHED",
            CallError::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            CallError::ToolNotFound { .. } => "TOOL_NOT_FOUND",
            CallError::ExecutionError { .. } => "EXECUTION_ERROR",
        }
    }

    /// The structured failure object a tool can return as its own result
    pub fn to_value(&self) -> Value {
        json!({
            "success": false,
            "result": self.to_string(),
            "energy_gain": 0,
            "error": self.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_message_shows_path() {
        let err = CallError::CircularDependency {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> a");
        assert_eq!(err.code(), "CIRCULAR_DEPENDENCY");
    }

    #[test]
    fn test_failure_object_shape() {
        let v = CallError::ToolNotFound { name: "ghost".into() }.to_value();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["error"], json!("TOOL_NOT_FOUND"));
        assert_eq!(v["energy_gain"], json!(0));
        assert!(v["result"].as_str().is_some_and(|s| s.contains("ghost")));
    }
}
