//! Router-level streaming events.
//!
//! `RouterEvent` describes one routing cycle as it unfolds. The CLI only
//! needs the visible text (`RouterEvent::text`); richer front ends can
//! serialize the events as they are.

use serde::{Deserialize, Serialize};

/// Which path a routing cycle took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// The model answered from its own knowledge.
    Direct,
    /// A tool ran and the model explained its result.
    Tool,
    /// The model asked for an unknown tool; answered without one.
    Fallback,
    /// A model call failed; the user got an apology.
    Failed,
}

/// Events emitted while a query is being answered.
///
/// - `chunk`       — answer text from the model
/// - `notice`      — status text shown to the user but not recorded
/// - `tool_call`   — a tool is about to run
/// - `tool_result` — the tool finished
/// - `error`       — apology shown after a failed model call
/// - `done`        — the cycle is complete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterEvent {
    Chunk {
        content: String,
    },

    Notice {
        content: String,
    },

    ToolCall {
        name: String,
        parameters: serde_json::Value,
    },

    ToolResult {
        name: String,
        success: bool,
        payload: serde_json::Value,
    },

    Error {
        message: String,
    },

    Done {
        route: Route,
    },
}

impl RouterEvent {
    /// Event name, as used in the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Notice { .. } => "notice",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }

    /// Text meant for the user, if this event carries any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Chunk { content } | Self::Notice { content } => Some(content),
            Self::Error { message } => Some(message),
            Self::ToolCall { .. } | Self::ToolResult { .. } | Self::Done { .. } => None,
        }
    }
}
