//! Bounded conversation ledger.
//!
//! An ordered, role-tagged log of turns with a maximum-turns retention
//! policy. One "turn" of retention is a user+assistant exchange, so the
//! ledger keeps at most `2 * max_turns` entries, plus an optional pinned
//! system turn that is never evicted.
//!
//! Tool turns count toward the cap like any other entry.

use chrono::{DateTime, Utc};
use parley_core::message::Role;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,

    /// Text for user/assistant/system turns; compact JSON for tool turns.
    pub content: String,

    /// Set only on tool turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: String, tool_name: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_name,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered, capped conversation history for a single session.
#[derive(Debug, Clone)]
pub struct ConversationLedger {
    pinned: Option<Turn>,
    turns: Vec<Turn>,
    max_turns: usize,
}

impl ConversationLedger {
    /// Create an empty ledger remembering at most `max_turns` exchanges.
    pub fn new(max_turns: usize) -> Self {
        let max_turns = if max_turns == 0 {
            warn!("max_turns of 0 requested, keeping one exchange instead");
            1
        } else {
            max_turns
        };

        Self {
            pinned: None,
            turns: Vec::new(),
            max_turns,
        }
    }

    /// Pin a leading system turn that survives truncation and `reset()`.
    pub fn with_pinned_system(mut self, content: impl Into<String>) -> Self {
        self.pinned = Some(Turn::new(Role::System, content.into(), None));
        self
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.push(Turn::new(Role::User, content.into(), None));
    }

    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn::new(Role::Assistant, content.into(), None));
    }

    /// Record a tool result payload.
    pub fn append_tool(&mut self, tool_name: impl Into<String>, payload: &serde_json::Value) {
        self.push(Turn::new(
            Role::Tool,
            payload.to_string(),
            Some(tool_name.into()),
        ));
    }

    /// An owned, chronological copy of every turn, pinned system turn first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.pinned.iter().chain(self.turns.iter()).cloned().collect()
    }

    /// One block per turn, separated by blank lines.
    pub fn render_human_readable(&self) -> String {
        self.pinned
            .iter()
            .chain(self.turns.iter())
            .map(render_turn)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Drop every conversation turn. The pinned system turn, if any, stays.
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Number of entries, including the pinned system turn.
    pub fn len(&self) -> usize {
        self.turns.len() + usize::from(self.pinned.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Maximum number of non-pinned entries retained.
    pub fn capacity(&self) -> usize {
        self.max_turns * 2
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        let excess = self.turns.len().saturating_sub(self.capacity());
        if excess > 0 {
            self.turns.drain(..excess);
            debug!(evicted = excess, retained = self.turns.len(), "Truncated conversation ledger");
        }
    }
}

fn render_turn(turn: &Turn) -> String {
    match turn.role {
        Role::System => format!("System: {}", turn.content),
        Role::User => format!("User: {}", turn.content),
        Role::Assistant => format!("Assistant: {}", turn.content),
        Role::Tool => {
            let name = turn.tool_name.as_deref().unwrap_or("unknown_tool");
            let body = serde_json::from_str::<serde_json::Value>(&turn.content)
                .ok()
                .and_then(|v| serde_json::to_string_pretty(&v).ok())
                .unwrap_or_else(|| turn.content.clone());
            format!("Tool ({name}): {body}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contents(ledger: &ConversationLedger) -> Vec<String> {
        ledger.snapshot().into_iter().map(|t| t.content).collect()
    }

    #[test]
    fn retention_is_exact_after_every_append() {
        for max_turns in 1..=4 {
            let mut ledger = ConversationLedger::new(max_turns);
            let cap = 2 * max_turns;
            let mut appended = Vec::new();

            for i in 0..(cap * 3 + 1) {
                let text = format!("m{i}");
                if i % 2 == 0 {
                    ledger.append_user(&text);
                } else {
                    ledger.append_assistant(&text);
                }
                appended.push(text);

                assert_eq!(ledger.len(), appended.len().min(cap));
                let expected: Vec<String> =
                    appended[appended.len().saturating_sub(cap)..].to_vec();
                assert_eq!(contents(&ledger), expected);
            }
        }
    }

    #[test]
    fn tool_turns_count_toward_cap() {
        let mut ledger = ConversationLedger::new(1);
        ledger.append_user("weather?");
        ledger.append_tool("get_weather", &json!({"temperature": "12°C"}));
        ledger.append_assistant("It is 12°C.");

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].role, Role::Tool);
        assert_eq!(snapshot[0].tool_name.as_deref(), Some("get_weather"));
        assert_eq!(snapshot[1].role, Role::Assistant);
    }

    #[test]
    fn pinned_system_turn_is_never_evicted() {
        let mut ledger = ConversationLedger::new(1).with_pinned_system("be brief");
        for i in 0..5 {
            ledger.append_user(format!("q{i}"));
            ledger.append_assistant(format!("a{i}"));
        }
        assert_eq!(ledger.len(), 3);
        assert_eq!(contents(&ledger), vec!["be brief", "q4", "a4"]);
        assert_eq!(ledger.snapshot()[0].role, Role::System);
    }

    #[test]
    fn snapshot_is_independent_of_ledger() {
        let mut ledger = ConversationLedger::new(5);
        ledger.append_user("original");

        let mut snapshot = ledger.snapshot();
        snapshot[0].content = "tampered".into();
        snapshot.push(snapshot[0].clone());
        snapshot.clear();

        assert_eq!(contents(&ledger), vec!["original"]);
    }

    #[test]
    fn tool_payload_stored_as_compact_json() {
        let mut ledger = ConversationLedger::new(5);
        ledger.append_tool("get_stock_price", &json!({"symbol": "AAPL", "price": 190.5}));
        let turn = &ledger.snapshot()[0];
        let parsed: serde_json::Value = serde_json::from_str(&turn.content).unwrap();
        assert_eq!(parsed["symbol"], "AAPL");
        assert!(!turn.content.contains('\n'));
    }

    #[test]
    fn render_human_readable_formats_each_role() {
        let mut ledger = ConversationLedger::new(5);
        ledger.append_user("What's the weather in London?");
        ledger.append_tool("get_weather", &json!({"condition": "Rain"}));
        ledger.append_assistant("It's raining in London.");

        let rendered = ledger.render_human_readable();
        let blocks: Vec<&str> = rendered.split("\n\n").collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], "User: What's the weather in London?");
        assert!(blocks[1].starts_with("Tool (get_weather): {\n"));
        assert!(blocks[1].contains("\"condition\": \"Rain\""));
        assert_eq!(blocks[2], "Assistant: It's raining in London.");
    }

    #[test]
    fn reset_clears_turns_and_is_idempotent() {
        let mut empty = ConversationLedger::new(3);
        empty.reset();
        empty.reset();
        assert!(empty.is_empty());

        let mut ledger = ConversationLedger::new(3);
        ledger.append_user("hello");
        ledger.append_assistant("hi");
        ledger.reset();
        assert!(ledger.is_empty());
        assert_eq!(ledger.render_human_readable(), "");
    }

    #[test]
    fn reset_keeps_pinned_system_turn() {
        let mut ledger = ConversationLedger::new(3).with_pinned_system("rules");
        ledger.append_user("hello");
        ledger.reset();
        assert_eq!(contents(&ledger), vec!["rules"]);
    }

    #[test]
    fn zero_max_turns_is_clamped() {
        let ledger = ConversationLedger::new(0);
        assert_eq!(ledger.max_turns(), 1);
        assert_eq!(ledger.capacity(), 2);
    }
}
