//! Tool trait and dispatcher — the capabilities an aigent can invoke.
//!
//! The orchestration loop treats tool output as opaque text to feed back to
//! the model. The dispatcher therefore reduces every outcome, including
//! failures, to a plain observation string and never raises to the caller.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Descriptor for a tool, shown to the model so it knows what it can call.
/// The parameter schema is advisory documentation, not enforced validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique name, matching a dispatchable implementation.
    pub name: String,

    /// Description for the model: what the tool does and when to use it.
    pub description: String,

    /// JSON-shaped parameter schema (e.g. {"query": "string"}).
    #[serde(default)]
    pub parameters_schema: serde_json::Value,
}

/// A capability the aigent can choose to use.
///
/// `execute` is async regardless of whether the implementation performs I/O;
/// the dispatcher always runs it to completion before returning, so from the
/// orchestration loop's perspective every tool call is synchronous.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "web_search").
    fn name(&self) -> &str;

    /// Description sent to the model.
    fn description(&self) -> &str;

    /// Advisory JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the tool. The returned string is the observation fed back to the
    /// model; internal failures should be reported as error strings where
    /// the tool can phrase them better than the dispatcher's generic one.
    async fn execute(&self, params: &serde_json::Value) -> Result<String, ToolError>;

    /// Descriptor for this tool.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters_schema: self.parameters_schema(),
        }
    }
}

/// A closed registry mapping tool names to implementations.
///
/// Registered explicitly at startup; there is no runtime module lookup.
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
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Descriptors for all registered tools.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec()).collect()
    }

    /// Execute a tool and reduce the outcome to an observation string.
    ///
    /// Never fails: an unregistered name or an internal tool error yields a
    /// descriptive error string the model is told about instead of the turn
    /// failing outright.
    pub async fn dispatch(&self, name: &str, params: &serde_json::Value) -> String {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Model requested an unknown tool");
            return format!("Error: Unknown tool '{name}'.");
        };

        info!(tool = %name, "Executing tool");
        match tool.execute(params).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                "An unexpected error occurred while running the tool.".to_string()
            }
        }
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

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input text"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({"text": "string"})
        }
        async fn execute(&self, params: &serde_json::Value) -> Result<String, ToolError> {
            Ok(params["text"].as_str().unwrap_or("").to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({})
        }
        async fn execute(&self, _params: &serde_json::Value) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "broken".into(),
                reason: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn dispatch_passes_observation_through() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let obs = registry.dispatch("echo", &json!({"text": "hello"})).await;
        assert_eq!(obs, "hello");
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_is_error_string() {
        let registry = ToolRegistry::new();
        let obs = registry.dispatch("nonexistent", &json!({})).await;
        assert_eq!(obs, "Error: Unknown tool 'nonexistent'.");
    }

    #[tokio::test]
    async fn dispatch_tool_failure_is_error_string() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool));

        let obs = registry.dispatch("broken", &json!({})).await;
        assert_eq!(obs, "An unexpected error occurred while running the tool.");
    }

    #[test]
    fn specs_describe_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let specs = registry.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "echo");
        assert_eq!(specs[0].parameters_schema["text"], "string");
    }
}
