//! The query router — the heart of Parley.
//!
//! Every user query goes through one routing cycle:
//!
//! 1. **Route**: ask the model, with the tool list in the system prompt,
//!    whether it can answer directly or needs a tool
//! 2. **Answer directly**: pass the model's text through, or
//! 3. **Act**: run the requested tool, then have the model explain the
//!    result in plain language
//! 4. **Fall back**: if the model asked for a tool that does not exist,
//!    answer from general knowledge instead
//!
//! Answers stream back fragment by fragment, and the conversation ledger
//! keeps a bounded history of the session.

pub mod events;
pub mod extract;
pub mod prompts;
pub mod router;

#[cfg(test)]
mod test_helpers;

pub use events::{Route, RouterEvent};
pub use extract::{ToolCallIntent, candidate_blocks, extract_tool_call};
pub use prompts::{GENERAL_KNOWLEDGE_PROMPT, build_result_prompt, build_routing_prompt};
pub use router::{APOLOGY, QueryRouter, RouterSettings};
