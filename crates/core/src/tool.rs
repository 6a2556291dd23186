//! Tool trait — the abstraction over the router's capabilities.
//!
//! A tool fetches data the language model cannot know on its own (current
//! weather, stock quotes, ...). Every tool exposes the same shape: a stable
//! name, a description and a parameter schema that are advertised to the
//! model, and an async `execute` used for dispatch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::ToolError;

/// The parameter bag a tool is invoked with: declared name to JSON value.
pub type ToolParameters = serde_json::Map<String, Value>;

/// Declared parameters of a tool, keyed by parameter name.
pub type ParameterSchema = BTreeMap<String, ParameterSpec>;

/// The JSON type a parameter must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// Whether `value` is acceptable for this declared type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: false,
        }
    }
}

/// What the model is shown about a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

/// The outcome of one tool invocation.
///
/// Serializes to the tool's own payload on success and to
/// `{"error": ..., "details": ...}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResult {
    Success(Value),
    Failure { error: String, details: String },
}

impl ToolResult {
    pub fn failure(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The JSON payload used for re-prompting and ledger storage.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Success(value) => value.clone(),
            Self::Failure { error, details } => serde_json::json!({
                "error": error,
                "details": details,
            }),
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        Self::failure(err.to_string(), err.details())
    }
}

/// The core Tool trait.
///
/// Implementations report expected failures (missing credentials, network
/// trouble, bad upstream data, bad arguments) as `ToolError`, never by
/// panicking.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// The declared parameters.
    fn parameters(&self) -> ParameterSchema;

    /// Execute the tool with already-validated parameters.
    async fn execute(&self, parameters: ToolParameters) -> std::result::Result<Value, ToolError>;

    /// Convert this tool into a descriptor for the routing prompt.
    fn describe(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Check a parameter bag against a schema.
///
/// Required parameters must be present and non-null, and every declared
/// parameter that is present must have its declared type. Undeclared
/// parameters are ignored.
pub fn validate_parameters(
    schema: &ParameterSchema,
    parameters: &ToolParameters,
) -> std::result::Result<(), ToolError> {
    for (name, spec) in schema {
        match parameters.get(name) {
            None | Some(Value::Null) if spec.required => {
                return Err(ToolError::InvalidArguments(format!(
                    "Missing required parameter '{name}'"
                )));
            }
            None | Some(Value::Null) => {}
            Some(value) if !spec.kind.accepts(value) => {
                return Err(ToolError::InvalidArguments(format!(
                    "Parameter '{name}' must be of type {}",
                    spec.kind.as_str()
                )));
            }
            Some(_) => {}
        }
    }

    for name in parameters.keys().filter(|k| !schema.contains_key(*k)) {
        debug!(parameter = %name, "Ignoring undeclared tool parameter");
    }

    Ok(())
}

/// Validate and execute, folding every error into a `ToolResult`.
pub async fn run_tool(tool: &dyn Tool, parameters: ToolParameters) -> ToolResult {
    if let Err(e) = validate_parameters(&tool.parameters(), &parameters) {
        warn!(tool = %tool.name(), error = %e, "Rejected tool parameters");
        return e.into();
    }

    match tool.execute(parameters).await {
        Ok(payload) => ToolResult::Success(payload),
        Err(e) => {
            warn!(tool = %tool.name(), error = %e, details = %e.details(), "Tool reported failure");
            e.into()
        }
    }
}

/// A registry of available tools, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replaced previously registered tool");
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All descriptors, sorted by name so prompts are deterministic.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|t| t.describe()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Invoke a tool by name. Unknown names become a failure result.
    pub async fn invoke(&self, name: &str, parameters: ToolParameters) -> ToolResult {
        match self.get(name) {
            Some(tool) => run_tool(tool, parameters).await,
            None => ToolError::NotFound(name.to_string()).into(),
        }
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::from([
                (
                    "text".to_string(),
                    ParameterSpec::required(ParamType::String, "Text to echo"),
                ),
                (
                    "times".to_string(),
                    ParameterSpec::optional(ParamType::Integer, "Repeat count"),
                ),
            ])
        }
        async fn execute(&self, parameters: ToolParameters) -> std::result::Result<Value, ToolError> {
            let text = parameters["text"].as_str().unwrap_or_default();
            if text == "offline" {
                return Err(ToolError::Network {
                    service: "Echo".into(),
                    reason: "connection refused".into(),
                });
            }
            let times = parameters.get("times").and_then(Value::as_u64).unwrap_or(1);
            Ok(json!({ "echo": text.repeat(times as usize) }))
        }
    }

    fn params(value: Value) -> ToolParameters {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.contains("echo"));
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[test]
    fn descriptor_serializes_schema_shape() {
        let descriptor = EchoTool.describe();
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["name"], "echo");
        assert_eq!(json["parameters"]["text"]["type"], "string");
        assert_eq!(json["parameters"]["text"]["required"], true);
        assert_eq!(json["parameters"]["times"]["required"], false);
    }

    #[test]
    fn validation_requires_declared_parameters() {
        let schema = EchoTool.parameters();
        let err = validate_parameters(&schema, &params(json!({}))).unwrap_err();
        assert!(err.to_string().contains("text"));

        let err = validate_parameters(&schema, &params(json!({"text": null}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn validation_checks_types() {
        let schema = EchoTool.parameters();
        let err = validate_parameters(&schema, &params(json!({"text": 42}))).unwrap_err();
        assert!(err.to_string().contains("string"));

        let err =
            validate_parameters(&schema, &params(json!({"text": "a", "times": 1.5}))).unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn validation_ignores_undeclared_parameters() {
        let schema = EchoTool.parameters();
        assert!(validate_parameters(&schema, &params(json!({"text": "a", "extra": true}))).is_ok());
    }

    #[tokio::test]
    async fn invoke_returns_success_payload() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let result = registry
            .invoke("echo", params(json!({"text": "hi", "times": 2})))
            .await;
        assert_eq!(result, ToolResult::Success(json!({"echo": "hihi"})));
    }

    #[tokio::test]
    async fn invoke_folds_tool_errors_into_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let result = registry
            .invoke("echo", params(json!({"text": "offline"})))
            .await;
        assert!(!result.is_success());
        let payload = result.to_payload();
        assert_eq!(payload["error"], "Network error connecting to Echo API: connection refused");
        assert_eq!(payload["details"], "connection refused");
    }

    #[tokio::test]
    async fn invoke_folds_validation_errors_into_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let result = registry.invoke("echo", ToolParameters::new()).await;
        let payload = result.to_payload();
        assert!(payload["error"].as_str().unwrap().contains("Invalid tool arguments"));
    }

    #[tokio::test]
    async fn invoke_missing_tool() {
        let registry = ToolRegistry::new();
        let result = registry.invoke("nonexistent", ToolParameters::new()).await;
        assert_eq!(
            result,
            ToolResult::failure(
                "Tool not found: nonexistent",
                "No tool named 'nonexistent' is registered"
            )
        );
    }

    #[test]
    fn failure_serializes_as_error_object() {
        let result = ToolResult::failure("boom", "stack");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"error": "boom", "details": "stack"})
        );
    }
}
