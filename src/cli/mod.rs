//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use toolcraft::cohort;
use toolcraft::config::{self, ToolcraftConfig};
use toolcraft::graph::DependencyGraph;
use toolcraft::reporters::{self, OutputFormat};
use toolcraft::scoring::{self, lite};
use tracing::info;

/// Toolcraft - tool complexity scoring
#[derive(Parser, Debug)]
#[command(name = "toolcraft")]
#[command(
    version,
    about = "Score the complexity of agent-authored tools and map how they call each other",
    after_help = "\
Examples:
  toolcraft score ./tools                      Rank every tool by TCI
  toolcraft score ./tools --format json        JSON output for scripting
  toolcraft score ./tools --composition 2.0    Weight the composition axis double
  toolcraft graph ./tools                      Static call edges and cycles
  toolcraft lite ./tools                       TCI-lite only"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a directory of tools and rank them by TCI
    Score {
        /// Directory of *.py tool files
        path: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Code axis weight
        #[arg(long)]
        code: Option<f64>,

        /// Interface axis weight
        #[arg(long)]
        interface: Option<f64>,

        /// Composition axis weight
        #[arg(long)]
        composition: Option<f64>,

        /// Skip dynamic interface probing
        #[arg(long)]
        no_probe: bool,

        /// Config file (default: <DIR>/toolcraft.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the static tool dependency graph and its cycles
    Graph {
        /// Directory of *.py tool files
        path: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// TCI-lite for every tool, without cohort context
    Lite {
        /// Directory of *.py tool files
        path: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Score {
            path,
            format,
            output,
            code,
            interface,
            composition,
            no_probe,
            config,
        } => {
            let mut config = resolve_config(config.as_deref(), &path)?;
            apply_overrides(&mut config, code, interface, composition, no_probe)?;
            run_score(&path, &config, format.parse()?, output.as_deref())
        }
        Commands::Graph { path, format, output } => run_graph(&path, format.parse()?, output.as_deref()),
        Commands::Lite { path, format, output } => run_lite(&path, format.parse()?, output.as_deref()),
    }
}

/// An explicit `--config` must load; the directory's own file falls back to
/// defaults
fn resolve_config(explicit: Option<&Path>, dir: &Path) -> Result<ToolcraftConfig> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => Ok(config::load_config(dir)),
    }
}

fn apply_overrides(
    config: &mut ToolcraftConfig,
    code: Option<f64>,
    interface: Option<f64>,
    composition: Option<f64>,
    no_probe: bool,
) -> Result<()> {
    if let Some(w) = code {
        config.weights.code = w;
    }
    if let Some(w) = interface {
        config.weights.interface = w;
    }
    if let Some(w) = composition {
        config.weights.composition = w;
    }
    if no_probe {
        config.probe.enabled = false;
    }
    anyhow::ensure!(
        config.weights.is_valid(),
        "weights must be finite and non-negative, got {:?}",
        config.weights
    );
    Ok(())
}

fn run_score(path: &Path, config: &ToolcraftConfig, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let cohort = cohort::load_dir(path)?;
    info!("Loaded {} tools from {}", cohort.len(), path.display());

    let analysis = scoring::analyze_cohort(&cohort, &config.scoring_options());
    emit(reporters::render_cohort(&analysis, format)?, output)
}

fn run_graph(path: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let cohort = cohort::load_dir(path)?;
    let graph = DependencyGraph::from_cohort(&cohort);
    emit(reporters::render_graph(&graph, format)?, output)
}

fn run_lite(path: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let cohort = cohort::load_dir(path)?;
    let scores = lite::lite_cohort(&cohort);
    emit(reporters::render_lite(&scores, format)?, output)
}

fn emit(rendered: String, output: Option<&Path>) -> Result<()> {
    match output {
        Some(out) => {
            std::fs::write(out, rendered).with_context(|| format!("Failed to write {}", out.display()))?;
            info!("Report written to {}", out.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
