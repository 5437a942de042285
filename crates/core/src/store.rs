//! StateStore trait — persistence for aigents, users, templates, tool
//! descriptors, and chat transcripts.
//!
//! Implementations live in the store crate (in-memory and SQLite). All
//! operations are assumed fast; the orchestration loop awaits them inline.

use crate::agent::{AgentConfig, PromptTemplate, UserRecord};
use crate::error::StoreError;
use crate::history::ChatEntry;
use crate::tool::ToolSpec;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait StateStore: Send + Sync {
    // --- Aigents ---

    async fn list_agents(&self) -> Result<Vec<AgentConfig>, StoreError>;

    async fn agent(&self, id: i64) -> Result<Option<AgentConfig>, StoreError>;

    /// The single currently active aigent, if any.
    async fn active_agent(&self) -> Result<Option<AgentConfig>, StoreError>;

    /// Insert an aigent and return its assigned id. The record is stored
    /// inactive regardless of the `is_active` field; `activate_agent` is the
    /// only path that sets the active flag.
    async fn insert_agent(&self, agent: AgentConfig) -> Result<i64, StoreError>;

    /// Replace an existing aigent's configuration, keyed by `agent.id`. The
    /// active flag is left as stored. Returns false when the id is unknown.
    async fn update_agent(&self, agent: AgentConfig) -> Result<bool, StoreError>;

    /// Activate one aigent and deactivate every other in a single storage
    /// operation. Returns false when the id is unknown.
    async fn activate_agent(&self, id: i64) -> Result<bool, StoreError>;

    /// Replace an aigent's free-form state blob.
    async fn update_agent_state(&self, id: i64, state: serde_json::Value)
        -> Result<(), StoreError>;

    // --- Users ---

    async fn user(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    async fn insert_user(&self, user: UserRecord) -> Result<i64, StoreError>;

    /// Wholesale-replace a user's state blob.
    async fn update_user_state(&self, id: i64, state: serde_json::Value)
        -> Result<(), StoreError>;

    // --- Prompt templates ---

    async fn template(&self, name: &str) -> Result<Option<PromptTemplate>, StoreError>;

    async fn upsert_template(&self, template: PromptTemplate) -> Result<(), StoreError>;

    // --- Tool descriptors ---

    async fn tool_spec(&self, name: &str) -> Result<Option<ToolSpec>, StoreError>;

    async fn upsert_tool_spec(&self, spec: ToolSpec) -> Result<(), StoreError>;

    // --- Chat history ---

    /// Full transcript for a (user, aigent) pair; empty when none exists.
    async fn history(&self, user_id: i64, agent_id: i64) -> Result<Vec<ChatEntry>, StoreError>;

    /// Append a user/assistant exchange with a shared timestamp, creating
    /// the transcript if absent and truncating to the retention bound.
    async fn append_exchange(
        &self,
        user_id: i64,
        agent_id: i64,
        user_message: &str,
        answer: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Delete the transcript for a (user, aigent) pair.
    async fn clear_history(&self, user_id: i64, agent_id: i64) -> Result<(), StoreError>;
}
