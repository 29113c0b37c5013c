//! Configuration (`toolcraft.toml`)
//!
//! Looked up in the analyzed cohort directory. Every section and key is
//! optional:
//!
//! ```toml
//! [weights]
//! code = 1.0
//! interface = 1.0
//! composition = 1.0
//!
//! [execution]
//! max_depth = 5
//!
//! [probe]
//! enabled = true
//! ```
//!
//! A missing file means defaults. An unreadable or invalid file is logged and
//! also means defaults; it never stops an analysis.

use crate::cohort::Cohort;
use crate::execution::{ExecutionContext, DEFAULT_MAX_DEPTH};
use crate::scoring::{ScoringOptions, TciWeights};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// File name looked up in a cohort directory
pub const CONFIG_FILE: &str = "toolcraft.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolcraftConfig {
    pub weights: TciWeights,
    pub execution: ExecutionConfig,
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Recursion bound for root execution contexts
    pub max_depth: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Dynamic interface probing
    pub enabled: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ToolcraftConfig {
    pub fn scoring_options(&self) -> ScoringOptions {
        ScoringOptions {
            weights: self.weights,
            probe: self.probe.enabled,
        }
    }

    /// Root execution context bounded by the configured `max_depth`
    pub fn root_context(&self, cohort: Arc<Cohort>, calling_agent_id: &str) -> ExecutionContext {
        ExecutionContext::new_root(cohort, calling_agent_id, self.execution.max_depth)
    }

    /// Replace invalid weights with the defaults
    fn sanitize(mut self, origin: &Path) -> Self {
        if !self.weights.is_valid() {
            warn!(
                "Ignoring weights in {}: must be finite and non-negative, got {:?}",
                origin.display(),
                self.weights
            );
            self.weights = TciWeights::default();
        }
        self
    }
}

/// Load `toolcraft.toml` from `dir`, falling back to defaults
pub fn load_config(dir: &Path) -> ToolcraftConfig {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!("No {} in {}, using defaults", CONFIG_FILE, dir.display());
        return ToolcraftConfig::default();
    }

    match load_config_file(&path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {:#}", path.display(), e);
            ToolcraftConfig::default()
        }
    }
}

/// Load a specific config file. Errors are returned, not defaulted.
pub fn load_config_file(path: &Path) -> Result<ToolcraftConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ToolcraftConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config.sanitize(path))
}
