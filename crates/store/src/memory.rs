//! In-memory store backend. Useful for tests and ephemeral runs.

use std::collections::HashMap;

use aigentd_core::{
    history, AgentConfig, ChatEntry, PromptTemplate, StateStore, StoreError, ToolSpec, UserRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    agents: HashMap<i64, AgentConfig>,
    next_agent_id: i64,
    users: HashMap<i64, UserRecord>,
    next_user_id: i64,
    templates: HashMap<String, PromptTemplate>,
    tool_specs: HashMap<String, ToolSpec>,
    transcripts: HashMap<(i64, i64), Vec<ChatEntry>>,
}

/// A store that keeps everything in process memory behind one RwLock.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_agent_id: 1,
                next_user_id: 1,
                ..Inner::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn list_agents(&self) -> Result<Vec<AgentConfig>, StoreError> {
        let inner = self.inner.read().await;
        let mut agents: Vec<AgentConfig> = inner.agents.values().cloned().collect();
        agents.sort_by_key(|a| a.id);
        Ok(agents)
    }

    async fn agent(&self, id: i64) -> Result<Option<AgentConfig>, StoreError> {
        Ok(self.inner.read().await.agents.get(&id).cloned())
    }

    async fn active_agent(&self) -> Result<Option<AgentConfig>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.agents.values().find(|a| a.is_active).cloned())
    }

    async fn insert_agent(&self, mut agent: AgentConfig) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_agent_id;
        inner.next_agent_id += 1;
        agent.id = id;
        agent.is_active = false;
        inner.agents.insert(id, agent);
        Ok(id)
    }

    async fn update_agent(&self, mut agent: AgentConfig) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.agents.get_mut(&agent.id) {
            Some(existing) => {
                agent.is_active = existing.is_active;
                *existing = agent;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn activate_agent(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.agents.contains_key(&id) {
            return Ok(false);
        }
        for (agent_id, agent) in inner.agents.iter_mut() {
            agent.is_active = *agent_id == id;
        }
        Ok(true)
    }

    async fn update_agent_state(
        &self,
        id: i64,
        state: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let agent = inner
            .agents
            .get_mut(&id)
            .ok_or_else(|| StoreError::Storage(format!("no aigent with id {id}")))?;
        agent.state = state;
        Ok(())
    }

    async fn user(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn insert_user(&self, mut user: UserRecord) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        let id = if user.id > 0 {
            inner.next_user_id = inner.next_user_id.max(user.id + 1);
            user.id
        } else {
            let id = inner.next_user_id;
            inner.next_user_id += 1;
            id
        };
        user.id = id;
        inner.users.insert(id, user);
        Ok(id)
    }

    async fn update_user_state(&self, id: i64, state: serde_json::Value) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Storage(format!("no user with id {id}")))?;
        user.state = state;
        Ok(())
    }

    async fn template(&self, name: &str) -> Result<Option<PromptTemplate>, StoreError> {
        Ok(self.inner.read().await.templates.get(name).cloned())
    }

    async fn upsert_template(&self, template: PromptTemplate) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .templates
            .insert(template.name.clone(), template);
        Ok(())
    }

    async fn tool_spec(&self, name: &str) -> Result<Option<ToolSpec>, StoreError> {
        Ok(self.inner.read().await.tool_specs.get(name).cloned())
    }

    async fn upsert_tool_spec(&self, spec: ToolSpec) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .tool_specs
            .insert(spec.name.clone(), spec);
        Ok(())
    }

    async fn history(&self, user_id: i64, agent_id: i64) -> Result<Vec<ChatEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .transcripts
            .get(&(user_id, agent_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn append_exchange(
        &self,
        user_id: i64,
        agent_id: i64,
        user_message: &str,
        answer: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let transcript = inner.transcripts.entry((user_id, agent_id)).or_default();
        history::append_exchange(transcript, user_message, answer, timestamp);
        Ok(())
    }

    async fn clear_history(&self, user_id: i64, agent_id: i64) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .transcripts
            .remove(&(user_id, agent_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aigentd_core::Role;
    use serde_json::json;

    fn agent(name: &str, active: bool) -> AgentConfig {
        AgentConfig {
            name: name.into(),
            is_active: active,
            ..AgentConfig::default()
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert_agent(agent("a", false)).await.unwrap();
        let b = store.insert_agent(agent("b", false)).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[tokio::test]
    async fn activate_deactivates_the_rest() {
        let store = MemoryStore::new();
        let a = store.insert_agent(agent("a", true)).await.unwrap();
        let b = store.insert_agent(agent("b", false)).await.unwrap();

        assert!(store.activate_agent(b).await.unwrap());

        assert!(!store.agent(a).await.unwrap().unwrap().is_active);
        let active = store.active_agent().await.unwrap().unwrap();
        assert_eq!(active.id, b);
    }

    #[tokio::test]
    async fn insert_never_activates() {
        let store = MemoryStore::new();
        store.insert_agent(agent("a", true)).await.unwrap();
        store.insert_agent(agent("b", true)).await.unwrap();

        assert!(store.active_agent().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_config_but_not_the_active_flag() {
        let store = MemoryStore::new();
        let id = store.insert_agent(agent("a", false)).await.unwrap();
        store.activate_agent(id).await.unwrap();

        let mut changed = agent("a", false);
        changed.id = id;
        changed.persona = "sardonic".into();
        assert!(store.update_agent(changed).await.unwrap());

        let loaded = store.agent(id).await.unwrap().unwrap();
        assert_eq!(loaded.persona, "sardonic");
        assert!(loaded.is_active);

        let mut unknown = agent("ghost", false);
        unknown.id = 999;
        assert!(!store.update_agent(unknown).await.unwrap());
    }

    #[tokio::test]
    async fn activate_unknown_id_is_false() {
        let store = MemoryStore::new();
        assert!(!store.activate_agent(42).await.unwrap());
    }

    #[tokio::test]
    async fn user_state_is_replaced_wholesale() {
        let store = MemoryStore::new();
        let id = store
            .insert_user(UserRecord {
                id: 0,
                username: "sam".into(),
                state: json!({"mood": "curious"}),
            })
            .await
            .unwrap();

        store
            .update_user_state(id, json!({"projects": ["garden"]}))
            .await
            .unwrap();

        let user = store.user(id).await.unwrap().unwrap();
        assert_eq!(user.state, json!({"projects": ["garden"]}));
    }

    #[tokio::test]
    async fn insert_user_keeps_explicit_id() {
        let store = MemoryStore::new();
        let id = store
            .insert_user(UserRecord {
                id: 7,
                username: "sam".into(),
                state: json!({}),
            })
            .await
            .unwrap();
        assert_eq!(id, 7);

        let next = store
            .insert_user(UserRecord {
                id: 0,
                username: "pat".into(),
                state: json!({}),
            })
            .await
            .unwrap();
        assert_eq!(next, 8);
    }

    #[tokio::test]
    async fn transcript_grows_in_pairs_and_clears() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.append_exchange(1, 1, "hi", "hello", now).await.unwrap();

        let transcript = store.history(1, 1).await.unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[0].timestamp, transcript[1].timestamp);

        store.clear_history(1, 1).await.unwrap();
        assert!(store.history(1, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transcripts_are_scoped_per_pair() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.append_exchange(1, 1, "a", "b", now).await.unwrap();
        store.append_exchange(2, 1, "c", "d", now).await.unwrap();

        assert_eq!(store.history(1, 1).await.unwrap().len(), 2);
        assert_eq!(store.history(2, 1).await.unwrap().len(), 2);
        assert!(store.history(1, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn templates_and_tool_specs_upsert() {
        let store = MemoryStore::new();
        store
            .upsert_template(PromptTemplate {
                name: "decision".into(),
                template: "v1".into(),
            })
            .await
            .unwrap();
        store
            .upsert_template(PromptTemplate {
                name: "decision".into(),
                template: "v2".into(),
            })
            .await
            .unwrap();

        let tpl = store.template("decision").await.unwrap().unwrap();
        assert_eq!(tpl.template, "v2");

        store
            .upsert_tool_spec(ToolSpec {
                name: "web_search".into(),
                description: "search".into(),
                parameters_schema: json!({"query": "string"}),
            })
            .await
            .unwrap();
        assert!(store.tool_spec("web_search").await.unwrap().is_some());
        assert!(store.tool_spec("missing").await.unwrap().is_none());
    }
}
