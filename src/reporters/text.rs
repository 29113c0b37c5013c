//! Text (terminal) reporter with colors

use super::{CohortReport, GraphReport};
use crate::models::ToolAnalysis;
use crate::scoring::lite::LiteScore;
use crate::scoring::{HIGH_LITE_THRESHOLD, MEDIUM_LITE_THRESHOLD};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";

const RULE: &str = "──────────────────────────────────────";

/// Color for a normalized TCI
fn tci_color(normalized: f64) -> &'static str {
    if normalized >= 0.75 {
        RED
    } else if normalized >= 0.4 {
        YELLOW
    } else {
        GREEN
    }
}

fn lite_color(lite: f64) -> &'static str {
    if lite >= HIGH_LITE_THRESHOLD {
        RED
    } else if lite >= MEDIUM_LITE_THRESHOLD {
        YELLOW
    } else {
        GREEN
    }
}

pub fn render_cohort(report: &CohortReport) -> String {
    let mut out = String::new();
    let s = &report.summary;

    out.push_str(&format!("\n{BOLD}Tool Complexity{RESET}\n"));
    out.push_str(&format!("{DIM}{RULE}{RESET}\n"));
    out.push_str(&format!(
        "Tools: {}  Failed: {}  TCI mean: {:.2}  max: {:.2}  min: {:.2}\n",
        s.total_tools, s.failed_tools, s.tci_mean, s.tci_max, s.tci_min
    ));
    out.push_str(&format!(
        "Axis means  code: {:.2}  interface: {:.2}  composition: {:.2}\n",
        s.code_mean, s.interface_mean, s.compositional_mean
    ));
    out.push_str(&format!(
        "TCI-lite  {RED}high {}{RESET}  {YELLOW}medium {}{RESET}  {GREEN}low {}{RESET}\n\n",
        s.high_complexity_tools, s.medium_complexity_tools, s.low_complexity_tools
    ));

    if report.tools.is_empty() {
        out.push_str(&format!("{DIM}No tools found.{RESET}\n"));
        return out;
    }

    out.push_str(&format!(
        "{BOLD}{:<4} {:<28} {:>8} {:>6} {:>7} {:>7} {:>7} {:>5}{RESET}\n",
        "#", "TOOL", "TCI", "NORM", "CODE", "IFACE", "COMP", "LITE"
    ));
    for (rank, tool) in report.tools.iter().enumerate() {
        out.push_str(&tool_row(rank + 1, tool));
    }

    let failed: Vec<&&ToolAnalysis> = report.tools.iter().filter(|t| t.is_failed()).collect();
    if !failed.is_empty() {
        out.push_str(&format!("\n{BOLD}NOT ANALYZED{RESET}\n"));
        for tool in failed {
            if let Some(err) = &tool.error {
                out.push_str(&format!("  {RED}{}{RESET}  {DIM}{}{RESET}\n", tool.name, err));
            }
        }
    }

    if !report.cycles.is_empty() {
        out.push_str(&format!("\n{BOLD}CYCLES{RESET}\n"));
        for cycle in &report.cycles {
            out.push_str(&format!("  {YELLOW}{}{RESET}\n", cycle.join(" <-> ")));
        }
    }

    out
}

fn tool_row(rank: usize, tool: &ToolAnalysis) -> String {
    let name = truncate(&tool.name, 28);
    if tool.is_failed() {
        return format!("{DIM}{:<4} {:<28} {:>8}{RESET}\n", rank, name, "error");
    }
    let sc = &tool.score;
    let color = tci_color(sc.tci_normalized);
    format!(
        "{:<4} {:<28} {color}{:>8.3}{RESET} {:>6.2} {:>7.2} {:>7.2} {:>7.2} {:>5.2}\n",
        rank,
        name,
        sc.tci_raw,
        sc.tci_normalized,
        sc.code_complexity,
        sc.interface_complexity,
        sc.compositional_complexity,
        tool.tci_lite
    )
}

pub fn render_graph(report: &GraphReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{BOLD}Tool Dependencies{RESET}\n"));
    out.push_str(&format!("{DIM}{RULE}{RESET}\n"));
    out.push_str(&format!("Tools: {}  Edges: {}\n\n", report.tools, report.edge_count));

    let mut any = false;
    for (caller, callees) in &report.edges {
        if callees.is_empty() {
            continue;
        }
        any = true;
        out.push_str(&format!("  {BOLD}{}{RESET} -> {}\n", caller, callees.join(", ")));
    }
    if !any {
        out.push_str(&format!("{DIM}No tool-to-tool calls found.{RESET}\n"));
    }

    if !report.cycles.is_empty() {
        out.push_str(&format!("\n{BOLD}CYCLES{RESET}\n"));
        for cycle in &report.cycles {
            out.push_str(&format!("  {YELLOW}{}{RESET}\n", cycle.join(" <-> ")));
        }
    }
    out
}

pub fn render_lite(scores: &[&LiteScore]) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{BOLD}TCI-lite{RESET}\n"));
    out.push_str(&format!("{DIM}{RULE}{RESET}\n"));
    for score in scores {
        let name = truncate(&score.name, 28);
        match &score.error {
            Some(err) => out.push_str(&format!("  {:<28} {DIM}{}{RESET}\n", name, err)),
            None => {
                let color = lite_color(score.tci_lite);
                out.push_str(&format!("  {:<28} {color}{:>5.2}{RESET}\n", name, score.tci_lite));
            }
        }
    }
    if scores.is_empty() {
        out.push_str(&format!("{DIM}No tools found.{RESET}\n"));
    }
    out
}

/// Truncate to at most `max` characters, marking the cut with `...`
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
