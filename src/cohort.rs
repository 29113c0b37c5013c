//! Cohort snapshots
//!
//! A cohort is the explicit, immutable set of tools that one scoring pass or
//! one agent action sees. It replaces any ambient tool registry: callers build
//! it once and share it (behind an `Arc`) with the scorer and every root
//! execution context.

use crate::tool::{Tool, ToolMetadata, SYSTEM_CREATOR};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Ordered, name-indexed set of tools
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl Cohort {
    /// Build a cohort. A later tool with an already-seen name replaces the
    /// earlier one in place, keeping names unique.
    pub fn new(tools: impl IntoIterator<Item = Tool>) -> Self {
        let mut cohort = Self::default();
        for tool in tools {
            match cohort.index.get(&tool.name) {
                Some(&i) => {
                    warn!("Duplicate tool name '{}' in cohort, keeping the later one", tool.name);
                    cohort.tools[i] = tool;
                }
                None => {
                    cohort.index.insert(tool.name.clone(), cohort.tools.len());
                    cohort.tools.push(tool);
                }
            }
        }
        cohort
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// One entry of a directory's `index.json`
#[derive(Debug, Default, Deserialize)]
struct IndexEntry {
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_in_round: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ToolIndex {
    #[serde(default)]
    tools: HashMap<String, IndexEntry>,
}

/// Load every `*.py` file directly under `dir` as a source-only tool.
///
/// The tool name is the file stem; `__init__.py` is skipped. If the
/// directory has an `index.json`, creator and metadata are taken from it,
/// otherwise tools are attributed to `system`. Tools are ordered by name.
pub fn load_dir(dir: &Path) -> Result<Cohort> {
    if !dir.is_dir() {
        anyhow::bail!("Tools directory not found: {}", dir.display());
    }

    let index = load_index(dir);
    let mut tools = Vec::new();

    let walker = ignore::WalkBuilder::new(dir)
        .max_depth(Some(1))
        .hidden(false)
        .git_ignore(false)
        .build();

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if name == "__init__" {
            continue;
        }

        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tool file: {}", path.display()))?;

        let (creator, metadata) = match index.tools.get(name) {
            Some(info) => (
                info.created_by.clone().unwrap_or_else(|| SYSTEM_CREATOR.to_string()),
                ToolMetadata {
                    description: info.description.clone(),
                    created_in_round: info.created_in_round,
                },
            ),
            None => (SYSTEM_CREATOR.to_string(), ToolMetadata::default()),
        };

        tools.push(Tool::new(name, source, creator).with_metadata(metadata));
    }

    tools.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Loaded {} tools from {}", tools.len(), dir.display());
    Ok(Cohort::new(tools))
}

fn load_index(dir: &Path) -> ToolIndex {
    let index_path = dir.join("index.json");
    if !index_path.exists() {
        return ToolIndex::default();
    }

    let parsed = std::fs::read_to_string(&index_path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str::<ToolIndex>(&content).map_err(Into::into));

    match parsed {
        Ok(index) => index,
        Err(e) => {
            warn!("Failed to load {}: {}", index_path.display(), e);
            ToolIndex::default()
        }
    }
}
