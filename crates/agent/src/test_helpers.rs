//! Shared test helpers for router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use parley_core::error::{ProviderError, ToolError};
use parley_core::message::Message;
use parley_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk,
};
use parley_core::tool::{ParamType, ParameterSchema, ParameterSpec, Tool, ToolParameters};
use serde_json::{Value, json};

/// What one scripted model call does.
#[derive(Debug, Clone)]
pub enum Script {
    /// Stream these fragments, then finish.
    Chunks(Vec<String>),
    /// Reject the request outright.
    Fail(ProviderError),
    /// Stream these fragments, then report an error.
    FailMidStream(Vec<String>, ProviderError),
}

impl Script {
    pub fn text(text: &str) -> Self {
        Self::Chunks(vec![text.to_string()])
    }

    pub fn chunks(parts: &[&str]) -> Self {
        Self::Chunks(parts.iter().map(|p| p.to_string()).collect())
    }
}

/// A mock provider that plays back one script per call and records every
/// request it receives.
///
/// Panics if more calls are made than scripts provided.
pub struct ScriptedProvider {
    scripts: Mutex<Vec<Script>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_script(&self, request: ProviderRequest) -> Script {
        let mut requests = self.requests.lock().unwrap();
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            panic!(
                "ScriptedProvider: no more scripts (call #{})",
                requests.len() + 1
            );
        }
        requests.push(request);
        scripts.remove(0)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        match self.next_script(request) {
            Script::Chunks(parts) => Ok(ProviderResponse {
                message: Message::assistant(parts.concat()),
                usage: None,
                model: "mock-model".into(),
            }),
            Script::Fail(e) | Script::FailMidStream(_, e) => Err(e),
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let (parts, tail) = match self.next_script(request) {
            Script::Chunks(parts) => (parts, Ok(StreamChunk::finished())),
            Script::Fail(e) => return Err(e),
            Script::FailMidStream(parts, e) => (parts, Err(e)),
        };

        let (tx, rx) = tokio::sync::mpsc::channel(parts.len() + 1);
        for part in parts {
            tx.try_send(Ok(StreamChunk::text(part))).unwrap();
        }
        tx.try_send(tail).unwrap();
        Ok(rx)
    }
}

/// A tool call reply in the fenced form models usually produce.
pub fn tool_call_reply(name: &str, parameters: Value) -> String {
    let call = json!({
        "use_tool": true,
        "tool_name": name,
        "tool_parameters": parameters,
    });
    format!("```json\n{}\n```", serde_json::to_string_pretty(&call).unwrap())
}

/// Returns a fixed payload, or fails, or panics, depending on construction.
pub struct FakeWeatherTool {
    outcome: Outcome,
}

enum Outcome {
    Payload(Value),
    Error(ToolError),
    Panic(&'static str),
}

impl FakeWeatherTool {
    pub fn returning(payload: Value) -> Self {
        Self {
            outcome: Outcome::Payload(payload),
        }
    }

    pub fn failing(error: ToolError) -> Self {
        Self {
            outcome: Outcome::Error(error),
        }
    }

    pub fn panicking(message: &'static str) -> Self {
        Self {
            outcome: Outcome::Panic(message),
        }
    }
}

#[async_trait]
impl Tool for FakeWeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather information for a specified location"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::from([(
            "location".to_string(),
            ParameterSpec::required(ParamType::String, "City name"),
        )])
    }

    async fn execute(&self, _parameters: ToolParameters) -> Result<Value, ToolError> {
        match &self.outcome {
            Outcome::Payload(payload) => Ok(payload.clone()),
            Outcome::Error(e) => Err(e.clone()),
            Outcome::Panic(message) => panic!("{message}"),
        }
    }
}
