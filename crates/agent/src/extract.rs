//! Tool-call extraction from free-form model output.
//!
//! The model signals a tool call by replying with
//! `{"use_tool": true, "tool_name": "...", "tool_parameters": {...}}`,
//! bare or inside a ```json fence. Anything else is a plain answer.

use std::sync::LazyLock;

use parley_core::tool::ToolParameters;
use regex_lite::Regex;
use serde_json::Value;
use tracing::trace;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("fenced block pattern compiles")
});

/// A tool call the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallIntent {
    pub use_tool: bool,
    /// Empty when the model omitted it; no tool has an empty name.
    pub tool_name: String,
    pub tool_parameters: ToolParameters,
}

/// Substrings of `text` that might hold the tool-call object, in the order
/// they should be tried.
pub fn candidate_blocks(text: &str) -> Vec<&str> {
    let fenced: Vec<&str> = FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    if !fenced.is_empty() {
        return fenced;
    }

    let trimmed = text.trim();
    let mut candidates = vec![trimmed];
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        let braced = &trimmed[start..=end];
        if start < end && braced != trimmed {
            candidates.push(braced);
        }
    }
    candidates
}

/// Find the first candidate block that is a tool-call object.
///
/// A candidate qualifies when it parses as a JSON object with a `use_tool`
/// key. Malformed candidates are skipped.
pub fn extract_tool_call(text: &str) -> Option<ToolCallIntent> {
    candidate_blocks(text).into_iter().find_map(|candidate| {
        let value: Value = match serde_json::from_str(candidate) {
            Ok(v) => v,
            Err(e) => {
                trace!(error = %e, "Candidate block is not JSON");
                return None;
            }
        };
        let object = value.as_object()?;
        let use_tool = object.get("use_tool")?;

        Some(ToolCallIntent {
            use_tool: use_tool.as_bool().unwrap_or(false),
            tool_name: object
                .get("tool_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            tool_parameters: object
                .get("tool_parameters")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_object() {
        let text = r#"{"use_tool": true, "tool_name": "get_weather", "tool_parameters": {"location": "London"}}"#;
        let intent = extract_tool_call(text).unwrap();
        assert!(intent.use_tool);
        assert_eq!(intent.tool_name, "get_weather");
        assert_eq!(intent.tool_parameters["location"], "London");
    }

    #[test]
    fn fenced_json_block_with_prose() {
        let text = "Let me look that up.\n```json\n{\n  \"use_tool\": true,\n  \"tool_name\": \"get_stock_price\",\n  \"tool_parameters\": {\"symbol\": \"AAPL\"}\n}\n```\nOne moment.";
        let intent = extract_tool_call(text).unwrap();
        assert_eq!(intent.tool_name, "get_stock_price");
        assert_eq!(intent.tool_parameters["symbol"], "AAPL");
    }

    #[test]
    fn unlabelled_fence() {
        let text = "```\n{\"use_tool\": true, \"tool_name\": \"x\", \"tool_parameters\": {}}\n```";
        assert_eq!(extract_tool_call(text).unwrap().tool_name, "x");
    }

    #[test]
    fn first_valid_fence_wins() {
        let text = "```json\nnot json\n```\n```json\n{\"use_tool\": true, \"tool_name\": \"second\"}\n```\n```json\n{\"use_tool\": true, \"tool_name\": \"third\"}\n```";
        assert_eq!(extract_tool_call(text).unwrap().tool_name, "second");
    }

    #[test]
    fn fence_without_use_tool_is_passed_over() {
        let text = "```json\n{\"answer\": 1}\n```\nThen:\n```json\n{\"use_tool\": true, \"tool_name\": \"get_weather\", \"tool_parameters\": {\"location\": \"Rome\"}}\n```";
        let intent = extract_tool_call(text).unwrap();
        assert_eq!(intent.tool_name, "get_weather");
        assert_eq!(intent.tool_parameters["location"], "Rome");
    }

    #[test]
    fn json_embedded_in_prose_without_fence() {
        let text = r#"Sure: {"use_tool": true, "tool_name": "get_weather", "tool_parameters": {"location": "Oslo"}} thanks"#;
        let intent = extract_tool_call(text).unwrap();
        assert_eq!(intent.tool_parameters["location"], "Oslo");
    }

    #[test]
    fn plain_answer_has_no_intent() {
        assert!(extract_tool_call("The capital of France is Paris.").is_none());
        assert!(extract_tool_call("").is_none());
    }

    #[test]
    fn json_without_use_tool_is_not_a_call() {
        assert!(extract_tool_call(r#"{"answer": 42}"#).is_none());
        assert!(extract_tool_call(r#"[1, 2, 3]"#).is_none());
    }

    #[test]
    fn use_tool_false_is_reported() {
        let intent = extract_tool_call(r#"{"use_tool": false}"#).unwrap();
        assert!(!intent.use_tool);
    }

    #[test]
    fn non_bool_use_tool_reads_as_false() {
        let intent = extract_tool_call(r#"{"use_tool": "yes", "tool_name": "x"}"#).unwrap();
        assert!(!intent.use_tool);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let intent = extract_tool_call(r#"{"use_tool": true, "tool_parameters": "oops"}"#).unwrap();
        assert!(intent.use_tool);
        assert_eq!(intent.tool_name, "");
        assert!(intent.tool_parameters.is_empty());
    }

    #[test]
    fn malformed_json_is_ignored() {
        assert!(extract_tool_call(r#"{"use_tool": true, "tool_name": "#).is_none());
    }

    #[test]
    fn candidates_without_fence() {
        assert_eq!(candidate_blocks("  hello  "), vec!["hello"]);
        assert_eq!(
            candidate_blocks("see {\"a\": 1} here"),
            vec!["see {\"a\": 1} here", "{\"a\": 1}"]
        );
        assert_eq!(candidate_blocks("{\"a\": 1}"), vec!["{\"a\": 1}"]);
    }

    #[test]
    fn candidates_from_fences_only() {
        let text = "intro {\"x\": 1}\n```json\n{\"a\": 1}\n```";
        assert_eq!(candidate_blocks(text), vec!["{\"a\": 1}"]);
    }
}
