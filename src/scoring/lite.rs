//! TCI-lite: a cheap per-tool complexity score on a 0-10 scale
//!
//! Needs nothing but the tool's own source, so it can be computed for a tool
//! in isolation. Four capped counts are summed:
//!
//! | term | measures | cap |
//! |------|----------|-----|
//! | P | parameters of the primary function | 5 |
//! | D | distinct imported modules | 2 |
//! | G | exception handlers + error-checking conditionals | 2 |
//! | L | 1 if LOC <= 60, 2 if <= 200, else 3 | 3 |

use crate::analyzers::AnalysisError;
use crate::cohort::Cohort;
use crate::parsers::{self, python, ParsedSource};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MAX_PARAMS: u32 = 5;
const MAX_IMPORTS: u32 = 2;
const MAX_ERROR_CHECKS: u32 = 2;
const MAX_TOTAL: f64 = 12.0;

/// Compute TCI-lite for an already-parsed tool
pub fn tci_lite(parsed: &ParsedSource) -> f64 {
    let params = python::primary_function(parsed)
        .map(|f| python::parameter_count(&f))
        .unwrap_or(0)
        .min(MAX_PARAMS);
    let imports = (python::imports(parsed).len() as u32).min(MAX_IMPORTS);
    let checks = python::error_check_count(parsed).min(MAX_ERROR_CHECKS);
    let size = loc_band(parsers::count_loc(parsed.source()));

    let total = f64::from(params + imports + checks + size);
    round2(total / MAX_TOTAL * 10.0)
}

/// Parse and score source text. Malformed source scores 0.
pub fn lite_source(source: &str) -> f64 {
    match parsers::parse_source(source) {
        Ok(parsed) => tci_lite(&parsed),
        Err(e) => {
            warn!("TCI-lite skipped: {}", e);
            0.0
        }
    }
}

/// TCI-lite of one cohort member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteScore {
    pub name: String,
    pub tci_lite: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
}

/// TCI-lite for every tool, in cohort order. Unparsable tools score 0 and
/// carry the parse error.
pub fn lite_cohort(cohort: &Cohort) -> Vec<LiteScore> {
    cohort
        .tools()
        .par_iter()
        .map(|tool| match parsers::parse_source(&tool.source_text) {
            Ok(parsed) => LiteScore {
                name: tool.name.clone(),
                tci_lite: tci_lite(&parsed),
                error: None,
            },
            Err(e) => {
                warn!("Tool '{}' could not be parsed: {}", tool.name, e);
                LiteScore {
                    name: tool.name.clone(),
                    tci_lite: 0.0,
                    error: Some(AnalysisError::Parse {
                        tool: tool.name.clone(),
                        message: e.to_string(),
                    }),
                }
            }
        })
        .collect()
}

fn loc_band(loc: u32) -> u32 {
    match loc {
        0..=60 => 1,
        61..=200 => 2,
        _ => 3,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
