//! Conversation context assembly.
//!
//! Gathers everything a prompt template can reference into a named-value
//! map: timestamp, persona, serialized states, formatted history, the
//! current message, and the tool catalog/instruction blocks. Store failures
//! while reading history degrade to a fallback line instead of failing the
//! turn; unresolvable tool names are skipped with a warning.

use std::collections::HashMap;

use aigentd_core::{AgentConfig, ChatEntry, StateStore, ToolSpec, UserRecord};
use chrono::Utc;
use tracing::warn;

/// How many transcript entries are rendered into the prompt.
const HISTORY_WINDOW: usize = 10;

const EMPTY_HISTORY_TEXT: &str = "No previous conversation history.";
const HISTORY_ERROR_TEXT: &str = "Error retrieving conversation history.";

/// Fixed instruction block appended when the aigent exposes tools.
const TOOL_INSTRUCTIONS: &str = "\
If you need a tool to answer, respond with ONLY this JSON object:\n\
{\"tool_to_use\": \"<tool name>\", \"parameters\": {<tool parameters>}}\n\
If you can answer directly, respond with ONLY this JSON object:\n\
{\"answer_to_user\": \"<your answer>\", \"updated_aigent_state\": {<your new state>}, \"updated_user_state\": {<the user's new state>}}";

/// The named values available to a prompt template for one turn.
pub struct PromptContext {
    values: HashMap<String, String>,
}

impl PromptContext {
    /// Assemble the decision-phase context for a (user, aigent) pair.
    pub async fn assemble(
        store: &dyn StateStore,
        agent: &AgentConfig,
        user: &UserRecord,
        message: &str,
    ) -> Self {
        let history_text = match store.history(user.id, agent.id).await {
            Ok(entries) => format_history(&entries),
            Err(e) => {
                warn!(user_id = user.id, aigent_id = agent.id, error = %e,
                    "History read failed while assembling context");
                HISTORY_ERROR_TEXT.to_string()
            }
        };

        let specs = resolve_tool_specs(store, agent).await;
        let (available_tools, tool_instructions) = if specs.is_empty() {
            (String::new(), String::new())
        } else {
            (format_tool_catalog(&specs), TOOL_INSTRUCTIONS.to_string())
        };

        let mut values = HashMap::new();
        values.insert(
            "current_utc_datetime".to_string(),
            Utc::now().to_rfc3339(),
        );
        values.insert("system_persona_prompt".to_string(), agent.persona.clone());
        values.insert("user_state".to_string(), serialize_state(&user.state));
        values.insert("aigent_state".to_string(), serialize_state(&agent.state));
        values.insert("chat_history".to_string(), history_text);
        values.insert("current_user_message".to_string(), message.to_string());
        values.insert("available_tools".to_string(), available_tools);
        values.insert("tool_instructions".to_string(), tool_instructions);

        Self { values }
    }

    /// Add or replace a named value (used for the synthesis phase).
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Pretty-printed JSON for a state blob, `{}` when it is not an object.
fn serialize_state(state: &serde_json::Value) -> String {
    if !state.is_object() {
        return "{}".to_string();
    }
    serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string())
}

/// The last entries of a transcript as `Role: content` lines, newest last.
fn format_history(entries: &[ChatEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_HISTORY_TEXT.to_string();
    }
    let start = entries.len().saturating_sub(HISTORY_WINDOW);
    entries[start..]
        .iter()
        .map(|e| format!("{}: {}", e.role.label(), e.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve the aigent's tool names to stored descriptors, skipping names
/// with no descriptor.
async fn resolve_tool_specs(store: &dyn StateStore, agent: &AgentConfig) -> Vec<ToolSpec> {
    let mut specs = Vec::with_capacity(agent.tools.len());
    for name in &agent.tools {
        match store.tool_spec(name).await {
            Ok(Some(spec)) => specs.push(spec),
            Ok(None) => {
                warn!(tool = %name, aigent = %agent.name, "Aigent lists a tool with no stored descriptor, skipping");
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool descriptor read failed, skipping");
            }
        }
    }
    specs
}

fn format_tool_catalog(specs: &[ToolSpec]) -> String {
    let mut block = String::from("Available tools:\n");
    for spec in specs {
        block.push_str(&format!("- {}: {}\n", spec.name, spec.description));
        block.push_str(&format!("  Parameters: {}\n", spec.parameters_schema));
    }
    block
}
