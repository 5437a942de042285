//! Aigent configuration, prompt templates, and user records.
//!
//! An Aigent is a named, operator-configured LLM persona: which model it
//! runs, where, with which prompt template and tool set, plus a free-form
//! JSON state blob the orchestration loop rewrites after each turn.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default request timeout against the model endpoint, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// A configurable LLM persona. At most one aigent is active system-wide;
/// the store's `activate_agent` enforces that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: i64,

    /// Unique name (e.g. "LBA Support Aigent").
    pub name: String,

    /// Whether this aigent handles incoming turns. Single-writer invariant:
    /// activating one aigent deactivates every other in the same operation.
    pub is_active: bool,

    /// Persona text substituted into the prompt templates.
    pub persona: String,

    /// Model name understood by the endpoint (e.g. "llama3:latest").
    pub model_name: String,

    /// Ordered model endpoint base URLs; the first entry is used.
    pub endpoints: Vec<String>,

    /// Optional sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Optional context window size (num_ctx).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,

    /// Per-call timeout for model requests.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Free-form JSON object, written exclusively by the orchestration loop
    /// after each successful turn.
    #[serde(default = "default_agent_state")]
    pub state: Value,

    /// Name of the decision prompt template this aigent uses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,

    /// Names of the tool descriptors this aigent exposes to the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            is_active: false,
            persona: String::new(),
            model_name: "llama3:latest".into(),
            endpoints: Vec::new(),
            temperature: None,
            context_length: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            state: default_agent_state(),
            prompt_template: None,
            tools: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// First usable endpoint base URL, if any.
    pub fn primary_endpoint(&self) -> Option<&str> {
        self.endpoints
            .iter()
            .map(|e| e.trim())
            .find(|e| !e.is_empty())
    }
}

/// The seed state object a freshly created aigent starts with.
pub fn default_agent_state() -> Value {
    json!({
        "internal_name": "AigentCore_v1",
        "current_goal": "Establish a helpful and productive relationship with the user.",
        "session_topics": [],
        "long_term_topics": [],
        "internal_thoughts": "A new session has started. I should be welcoming and ready to assist.",
        "emotional_state": {
            "curiosity": 0.6,
            "confidence": 0.7,
            "empathy": 0.5,
            "neutral_helpful": 0.8
        },
        "knowledge_gaps": [],
        "last_interaction_summary": null
    })
}

/// A named prompt template with `{placeholder}` slots.
///
/// Every placeholder the template references must be supplied by the context
/// assembler or rendering fails with a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Unique name (e.g. "StandardChatInteraction").
    pub name: String,

    /// The full template string.
    pub template: String,
}

/// Template name used for the decision phase when an aigent has no explicit
/// assignment.
pub const DECISION_TEMPLATE_NAME: &str = "StandardChatInteraction";

/// Name of the synthesis template the loop renders after a tool ran.
pub const SYNTHESIS_TEMPLATE_NAME: &str = "tool_synthesis";

/// A user known to the system. Identity comes from the gateway's auth seam;
/// `state` is a free-form JSON object the loop replaces wholesale when the
/// model returns an `updated_user_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,

    #[serde(default = "empty_object")]
    pub state: Value,
}

fn empty_object() -> Value {
    json!({})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_agent() -> AgentConfig {
        AgentConfig {
            id: 1,
            name: "test".into(),
            is_active: true,
            persona: "A helpful assistant".into(),
            model_name: "llama3:latest".into(),
            endpoints: vec![],
            temperature: None,
            context_length: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            state: default_agent_state(),
            prompt_template: None,
            tools: vec![],
        }
    }

    #[test]
    fn primary_endpoint_skips_blanks() {
        let mut agent = bare_agent();
        assert!(agent.primary_endpoint().is_none());

        agent.endpoints = vec!["  ".into(), "http://10.0.0.2:11434".into()];
        assert_eq!(agent.primary_endpoint(), Some("http://10.0.0.2:11434"));
    }

    #[test]
    fn default_state_is_object() {
        let state = default_agent_state();
        assert!(state.is_object());
        assert_eq!(state["internal_name"], "AigentCore_v1");
        assert!(state["emotional_state"].is_object());
    }

    #[test]
    fn agent_serialization_roundtrip() {
        let agent = bare_agent();
        let json = serde_json::to_string(&agent).unwrap();
        let back: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "test");
        assert_eq!(back.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }
}
