//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley query router.
//! This crate has **no HTTP or storage dependencies**: it defines the domain model
//! that the provider, tool, memory and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping the language-model backend via configuration
//! - Easy testing with scripted providers and stub tools
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError};
pub use message::{Message, Role};
pub use provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage, collect_stream,
};
pub use tool::{
    ParamType, ParameterSchema, ParameterSpec, Tool, ToolDescriptor, ToolParameters,
    ToolRegistry, ToolResult, run_tool, validate_parameters,
};
