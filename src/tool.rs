//! Tool records and the entry-point contract
//!
//! A tool is a named unit of logic with two faces: its source text, which is
//! only ever analyzed, and its entry point, which is what actually runs when
//! the tool is probed or called through an [`ExecutionContext`].

use crate::execution::ExecutionContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Creator id used for built-in tools. Never receives utility rewards.
pub const SYSTEM_CREATOR: &str = "system";

/// The callable side of a tool.
///
/// `ctx` is the composition handle: `Some` when the tool runs inside an
/// execution context and may call other tools, `None` when it is invoked
/// bare. Returning `Err` means the tool raised.
pub trait ToolEntry: Send + Sync {
    fn execute(&self, params: &Value, ctx: Option<&mut ExecutionContext>) -> anyhow::Result<Value>;
}

impl<F> ToolEntry for F
where
    F: Fn(&Value, Option<&mut ExecutionContext>) -> anyhow::Result<Value> + Send + Sync,
{
    fn execute(&self, params: &Value, ctx: Option<&mut ExecutionContext>) -> anyhow::Result<Value> {
        self(params, ctx)
    }
}

/// Descriptive metadata supplied by the tool-storage collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_in_round: u32,
}

/// One tool in a cohort. Immutable once constructed.
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub source_text: String,
    pub entry: Option<Arc<dyn ToolEntry>>,
    pub creator_id: String,
    pub metadata: ToolMetadata,
}

impl Tool {
    /// Create a tool with source text only (no entry point)
    pub fn new(
        name: impl Into<String>,
        source_text: impl Into<String>,
        creator_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_text: source_text.into(),
            entry: None,
            creator_id: creator_id.into(),
            metadata: ToolMetadata::default(),
        }
    }

    /// Attach an entry point
    pub fn with_entry(mut self, entry: impl ToolEntry + 'static) -> Self {
        self.entry = Some(Arc::new(entry));
        self
    }

    /// Attach a closure entry point. The `Fn` bound lets closure signatures be
    /// inferred at the call site.
    pub fn with_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Value, Option<&mut ExecutionContext>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.with_entry(f)
    }

    pub fn with_metadata(mut self, metadata: ToolMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether this tool's creator is eligible for utility rewards at all
    pub fn has_rewardable_creator(&self) -> bool {
        !self.creator_id.is_empty() && self.creator_id != SYSTEM_CREATOR
    }

    /// Run the entry point, converting errors and panics into a description.
    ///
    /// Returns `Err` with a message when the tool has no entry point, returned
    /// `Err`, or panicked.
    pub fn invoke(&self, params: &Value, ctx: Option<&mut ExecutionContext>) -> Result<Value, String> {
        let Some(entry) = self.entry.as_ref() else {
            return Err(format!("tool '{}' has no entry point", self.name));
        };

        match catch_unwind(AssertUnwindSafe(|| entry.execute(params, ctx))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(format!("{:#}", e)),
            Err(panic_info) => Err(panic_message(panic_info.as_ref())),
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("creator_id", &self.creator_id)
            .field("has_entry", &self.entry.is_some())
            .field("source_len", &self.source_text.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("Panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("Panic: {}", s)
    } else {
        "Panic: unknown payload".to_string()
    }
}
