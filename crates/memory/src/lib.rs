//! Conversation memory for Parley.
//!
//! The ledger is process-local and never persisted: it lives as long as the
//! session that owns it.

pub mod ledger;

pub use ledger::{ConversationLedger, Turn};
