//! JSON reporter
//!
//! Pretty-printed JSON for piping to jq or further processing.

use anyhow::Result;
use serde::Serialize;

pub fn render<T: Serialize + ?Sized>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_analysis;
    use crate::reporters::{CohortReport, GraphReport};

    #[test]
    fn test_cohort_json() {
        let analysis = test_analysis();
        let json_str = render(&CohortReport::new(&analysis)).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");

        assert_eq!(parsed["summary"]["total_tools"], 5);
        let tools = parsed["tools"].as_array().expect("tools array");
        assert_eq!(tools.len(), 5);

        let broken = tools
            .iter()
            .find(|t| t["name"] == "broken")
            .expect("broken tool present");
        assert_eq!(broken["error"]["kind"], "parse");
        let leaf = tools.iter().find(|t| t["name"] == "leaf").expect("leaf present");
        assert!(leaf.get("error").is_none());
    }

    #[test]
    fn test_graph_json() {
        let analysis = test_analysis();
        let json_str = render(&GraphReport::new(&analysis.graph)).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["edges"]["mid"][0], "leaf");
        assert_eq!(parsed["cycles"][0][1], "pong");
    }
}
