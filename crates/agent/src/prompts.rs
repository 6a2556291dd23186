//! Prompt synthesis.
//!
//! Pure functions: the same inputs always produce the same prompt text.

use parley_core::tool::ToolDescriptor;
use serde_json::{Map, Value};

/// System prompt for the fallback call, when the model asked for a tool
/// that does not exist.
pub const GENERAL_KNOWLEDGE_PROMPT: &str =
    "You are a helpful AI assistant. Answer the user's question based on your general knowledge.";

/// Build the routing system prompt advertising `tools`.
pub fn build_routing_prompt(tools: &[ToolDescriptor]) -> String {
    let mut prompt = String::from(
        "You are an intelligent Q&A assistant. You answer questions directly from your own \
         knowledge, and you call external tools when a question needs real-time or \
         specialized data.\n\n",
    );

    prompt.push_str("AVAILABLE TOOLS:\n");
    if tools.is_empty() {
        prompt.push_str("No tools are available. Answer every question directly.\n\n");
    } else {
        let listing = serde_json::to_string_pretty(tools).unwrap_or_else(|_| "[]".into());
        prompt.push_str(&listing);
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "INSTRUCTIONS:\n\
         - For general knowledge questions that do not need real-time data, answer directly.\n\
         - For real-time or specialized information, use the matching tool by replying with \
         exactly this JSON and nothing else (a ```json fence around it is allowed):\n\n\
         {\"use_tool\": true, \"tool_name\": \"<tool name>\", \"tool_parameters\": {\"<parameter>\": \"<value>\"}}\n\n\
         - If a question is ambiguous, ask for clarification instead of guessing.\n\
         - Only use the tools listed above.\n\n",
    );

    prompt.push_str(
        "EXAMPLES:\n\n\
         User: \"What is the capital of France?\"\n\
         Assistant: The capital of France is Paris.\n",
    );

    if let Some(first) = tools.first() {
        prompt.push('\n');
        prompt.push_str(&tool_call_example(first));
    }

    prompt
}

/// One worked example of a tool-call reply for `tool`.
fn tool_call_example(tool: &ToolDescriptor) -> String {
    let parameters: Map<String, Value> = tool
        .parameters
        .iter()
        .filter(|(_, spec)| spec.required)
        .map(|(name, _)| (name.clone(), Value::String(format!("<{name}>"))))
        .collect();

    let call = serde_json::json!({
        "use_tool": true,
        "tool_name": tool.name,
        "tool_parameters": parameters,
    });

    format!(
        "User: (a question that needs {name})\nAssistant: ```json\n{call}\n```\n",
        name = tool.name,
        call = serde_json::to_string_pretty(&call).unwrap_or_default(),
    )
}

/// Build the prompt asking the model to phrase a tool result for the user.
pub fn build_result_prompt(tool_name: &str, payload: &Value, original_query: &str) -> String {
    let payload_json = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());

    format!(
        "The user asked: \"{original_query}\"\n\n\
         You used the \"{tool_name}\" tool, which returned the following information:\n\n\
         {payload_json}\n\n\
         Turn this into a natural, friendly response that directly answers the user's question.\n\
         If the tool response contains an error, explain what went wrong in a friendly way and \
         suggest alternatives where possible."
    )
}
