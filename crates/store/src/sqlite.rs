//! SQLite store backend.
//!
//! Four tables: `aigents`, `users`, `prompt_templates`, `tool_specs`, plus
//! `chat_entries` for transcripts. JSON blobs (states, endpoint lists, tool
//! lists, parameter schemas) are stored as TEXT and parsed on read.

use std::str::FromStr;

use aigentd_core::{
    AgentConfig, ChatEntry, PromptTemplate, Role, StateStore, StoreError, ToolSpec, UserRecord,
    MAX_HISTORY_TURNS,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// A persistent store backed by a single SQLite database file.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) a SQLite database at `path` and run the
    /// schema migrations. Pass `"sqlite::memory:"` for an ephemeral database.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS aigents (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                name                 TEXT UNIQUE NOT NULL,
                is_active            INTEGER NOT NULL DEFAULT 0,
                persona              TEXT NOT NULL,
                model_name           TEXT NOT NULL,
                endpoints            TEXT NOT NULL DEFAULT '[]',
                temperature          REAL,
                context_length       INTEGER,
                request_timeout_secs INTEGER NOT NULL,
                state                TEXT NOT NULL,
                prompt_template      TEXT,
                tools                TEXT NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("aigents table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                state    TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("users table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prompt_templates (
                name     TEXT PRIMARY KEY,
                template TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("prompt_templates table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tool_specs (
                name              TEXT PRIMARY KEY,
                description       TEXT NOT NULL,
                parameters_schema TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("tool_specs table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_entries (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id   INTEGER NOT NULL,
                agent_id  INTEGER NOT NULL,
                role      TEXT NOT NULL,
                content   TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("chat_entries table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_entries_pair ON chat_entries(user_id, agent_id, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("chat_entries index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_agent(row: &sqlx::sqlite::SqliteRow) -> Result<AgentConfig, StoreError> {
        let endpoints_json: String = row
            .try_get("endpoints")
            .map_err(|e| StoreError::Storage(format!("endpoints column: {e}")))?;
        let tools_json: String = row
            .try_get("tools")
            .map_err(|e| StoreError::Storage(format!("tools column: {e}")))?;
        let state_json: String = row
            .try_get("state")
            .map_err(|e| StoreError::Storage(format!("state column: {e}")))?;
        let timeout: i64 = row
            .try_get("request_timeout_secs")
            .map_err(|e| StoreError::Storage(format!("request_timeout_secs column: {e}")))?;

        Ok(AgentConfig {
            id: row
                .try_get("id")
                .map_err(|e| StoreError::Storage(format!("id column: {e}")))?,
            name: row
                .try_get("name")
                .map_err(|e| StoreError::Storage(format!("name column: {e}")))?,
            is_active: row
                .try_get::<i64, _>("is_active")
                .map_err(|e| StoreError::Storage(format!("is_active column: {e}")))?
                != 0,
            persona: row
                .try_get("persona")
                .map_err(|e| StoreError::Storage(format!("persona column: {e}")))?,
            model_name: row
                .try_get("model_name")
                .map_err(|e| StoreError::Storage(format!("model_name column: {e}")))?,
            endpoints: serde_json::from_str(&endpoints_json)?,
            temperature: row
                .try_get("temperature")
                .map_err(|e| StoreError::Storage(format!("temperature column: {e}")))?,
            context_length: row
                .try_get::<Option<i64>, _>("context_length")
                .map_err(|e| StoreError::Storage(format!("context_length column: {e}")))?
                .map(|n| n as u32),
            request_timeout_secs: timeout as u64,
            state: serde_json::from_str(&state_json)?,
            prompt_template: row
                .try_get("prompt_template")
                .map_err(|e| StoreError::Storage(format!("prompt_template column: {e}")))?,
            tools: serde_json::from_str(&tools_json)?,
        })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ChatEntry, StoreError> {
        let role_str: String = row
            .try_get("role")
            .map_err(|e| StoreError::Storage(format!("role column: {e}")))?;
        let role = match role_str.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => return Err(StoreError::Storage(format!("unknown role '{other}'"))),
        };
        let timestamp_str: String = row
            .try_get("timestamp")
            .map_err(|e| StoreError::Storage(format!("timestamp column: {e}")))?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|e| StoreError::Storage(format!("timestamp parse: {e}")))?
            .with_timezone(&Utc);

        Ok(ChatEntry {
            role,
            content: row
                .try_get("content")
                .map_err(|e| StoreError::Storage(format!("content column: {e}")))?,
            timestamp,
        })
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn list_agents(&self) -> Result<Vec<AgentConfig>, StoreError> {
        let rows = sqlx::query("SELECT * FROM aigents ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("list aigents: {e}")))?;
        rows.iter().map(Self::row_to_agent).collect()
    }

    async fn agent(&self, id: i64) -> Result<Option<AgentConfig>, StoreError> {
        let row = sqlx::query("SELECT * FROM aigents WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("get aigent: {e}")))?;
        row.as_ref().map(Self::row_to_agent).transpose()
    }

    async fn active_agent(&self) -> Result<Option<AgentConfig>, StoreError> {
        let row = sqlx::query("SELECT * FROM aigents WHERE is_active = 1 LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("active aigent: {e}")))?;
        row.as_ref().map(Self::row_to_agent).transpose()
    }

    async fn insert_agent(&self, agent: AgentConfig) -> Result<i64, StoreError> {
        let endpoints = serde_json::to_string(&agent.endpoints)?;
        let tools = serde_json::to_string(&agent.tools)?;
        let state = serde_json::to_string(&agent.state)?;

        // Rows always start inactive; activate_agent owns the active flag.
        let result = sqlx::query(
            r#"
            INSERT INTO aigents
                (name, is_active, persona, model_name, endpoints, temperature,
                 context_length, request_timeout_secs, state, prompt_template, tools)
            VALUES (?1, 0, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&agent.name)
        .bind(&agent.persona)
        .bind(&agent.model_name)
        .bind(&endpoints)
        .bind(agent.temperature)
        .bind(agent.context_length.map(|n| n as i64))
        .bind(agent.request_timeout_secs as i64)
        .bind(&state)
        .bind(&agent.prompt_template)
        .bind(&tools)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("insert aigent: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    async fn update_agent(&self, agent: AgentConfig) -> Result<bool, StoreError> {
        let endpoints = serde_json::to_string(&agent.endpoints)?;
        let tools = serde_json::to_string(&agent.tools)?;
        let state = serde_json::to_string(&agent.state)?;

        let result = sqlx::query(
            r#"
            UPDATE aigents SET
                name = ?1, persona = ?2, model_name = ?3, endpoints = ?4,
                temperature = ?5, context_length = ?6, request_timeout_secs = ?7,
                state = ?8, prompt_template = ?9, tools = ?10
            WHERE id = ?11
            "#,
        )
        .bind(&agent.name)
        .bind(&agent.persona)
        .bind(&agent.model_name)
        .bind(&endpoints)
        .bind(agent.temperature)
        .bind(agent.context_length.map(|n| n as i64))
        .bind(agent.request_timeout_secs as i64)
        .bind(&state)
        .bind(&agent.prompt_template)
        .bind(&tools)
        .bind(agent.id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("update aigent: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn activate_agent(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin activate: {e}")))?;

        let exists = sqlx::query("SELECT 1 FROM aigents WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("activate lookup: {e}")))?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query("UPDATE aigents SET is_active = CASE WHEN id = ?1 THEN 1 ELSE 0 END")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("activate update: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit activate: {e}")))?;
        Ok(true)
    }

    async fn update_agent_state(
        &self,
        id: i64,
        state: serde_json::Value,
    ) -> Result<(), StoreError> {
        let state_json = serde_json::to_string(&state)?;
        let result = sqlx::query("UPDATE aigents SET state = ?1 WHERE id = ?2")
            .bind(&state_json)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("update aigent state: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Storage(format!("no aigent with id {id}")));
        }
        Ok(())
    }

    async fn user(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT id, username, state FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("get user: {e}")))?;

        match row {
            Some(row) => {
                let state_json: String = row
                    .try_get("state")
                    .map_err(|e| StoreError::Storage(format!("state column: {e}")))?;
                Ok(Some(UserRecord {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::Storage(format!("id column: {e}")))?,
                    username: row
                        .try_get("username")
                        .map_err(|e| StoreError::Storage(format!("username column: {e}")))?,
                    state: serde_json::from_str(&state_json)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn insert_user(&self, user: UserRecord) -> Result<i64, StoreError> {
        let state = serde_json::to_string(&user.state)?;
        // Seeded users carry explicit ids; id 0 lets SQLite assign one.
        let explicit_id = (user.id > 0).then_some(user.id);

        let result = sqlx::query("INSERT INTO users (id, username, state) VALUES (?1, ?2, ?3)")
            .bind(explicit_id)
            .bind(&user.username)
            .bind(&state)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("insert user: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    async fn update_user_state(&self, id: i64, state: serde_json::Value) -> Result<(), StoreError> {
        let state_json = serde_json::to_string(&state)?;
        let result = sqlx::query("UPDATE users SET state = ?1 WHERE id = ?2")
            .bind(&state_json)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("update user state: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Storage(format!("no user with id {id}")));
        }
        Ok(())
    }

    async fn template(&self, name: &str) -> Result<Option<PromptTemplate>, StoreError> {
        let row = sqlx::query("SELECT name, template FROM prompt_templates WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("get template: {e}")))?;

        match row {
            Some(row) => Ok(Some(PromptTemplate {
                name: row
                    .try_get("name")
                    .map_err(|e| StoreError::Storage(format!("name column: {e}")))?,
                template: row
                    .try_get("template")
                    .map_err(|e| StoreError::Storage(format!("template column: {e}")))?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_template(&self, template: PromptTemplate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO prompt_templates (name, template) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET template = excluded.template
            "#,
        )
        .bind(&template.name)
        .bind(&template.template)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("upsert template: {e}")))?;
        Ok(())
    }

    async fn tool_spec(&self, name: &str) -> Result<Option<ToolSpec>, StoreError> {
        let row = sqlx::query(
            "SELECT name, description, parameters_schema FROM tool_specs WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("get tool spec: {e}")))?;

        match row {
            Some(row) => {
                let schema_json: String = row
                    .try_get("parameters_schema")
                    .map_err(|e| StoreError::Storage(format!("parameters_schema column: {e}")))?;
                Ok(Some(ToolSpec {
                    name: row
                        .try_get("name")
                        .map_err(|e| StoreError::Storage(format!("name column: {e}")))?,
                    description: row
                        .try_get("description")
                        .map_err(|e| StoreError::Storage(format!("description column: {e}")))?,
                    parameters_schema: serde_json::from_str(&schema_json)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn upsert_tool_spec(&self, spec: ToolSpec) -> Result<(), StoreError> {
        let schema = serde_json::to_string(&spec.parameters_schema)?;
        sqlx::query(
            r#"
            INSERT INTO tool_specs (name, description, parameters_schema) VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                parameters_schema = excluded.parameters_schema
            "#,
        )
        .bind(&spec.name)
        .bind(&spec.description)
        .bind(&schema)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("upsert tool spec: {e}")))?;
        Ok(())
    }

    async fn history(&self, user_id: i64, agent_id: i64) -> Result<Vec<ChatEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT role, content, timestamp FROM chat_entries
            WHERE user_id = ?1 AND agent_id = ?2
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("get history: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn append_exchange(
        &self,
        user_id: i64,
        agent_id: i64,
        user_message: &str,
        answer: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let ts = timestamp.to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("begin append: {e}")))?;

        for (role, content) in [("user", user_message), ("assistant", answer)] {
            sqlx::query(
                r#"
                INSERT INTO chat_entries (user_id, agent_id, role, content, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(user_id)
            .bind(agent_id)
            .bind(role)
            .bind(content)
            .bind(&ts)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("insert entry: {e}")))?;
        }

        // Retention: keep only the newest turns for this pair.
        sqlx::query(
            r#"
            DELETE FROM chat_entries
            WHERE user_id = ?1 AND agent_id = ?2 AND id NOT IN (
                SELECT id FROM chat_entries
                WHERE user_id = ?1 AND agent_id = ?2
                ORDER BY id DESC LIMIT ?3
            )
            "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .bind((MAX_HISTORY_TURNS * 2) as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("truncate history: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("commit append: {e}")))?;
        Ok(())
    }

    async fn clear_history(&self, user_id: i64, agent_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM chat_entries WHERE user_id = ?1 AND agent_id = ?2")
            .bind(user_id)
            .bind(agent_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("clear history: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_store() -> SqliteStore {
        SqliteStore::open("sqlite::memory:").await.unwrap()
    }

    fn agent(name: &str, active: bool) -> AgentConfig {
        AgentConfig {
            name: name.into(),
            is_active: active,
            persona: "helpful".into(),
            endpoints: vec!["http://localhost:11434".into()],
            temperature: Some(0.7),
            tools: vec!["web_search".into()],
            ..AgentConfig::default()
        }
    }

    #[tokio::test]
    async fn agent_round_trip() {
        let store = test_store().await;
        let id = store.insert_agent(agent("alpha", true)).await.unwrap();

        let loaded = store.agent(id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "alpha");
        // The flag on the inserted record is ignored.
        assert!(!loaded.is_active);
        assert_eq!(loaded.endpoints, vec!["http://localhost:11434"]);
        assert_eq!(loaded.temperature, Some(0.7));
        assert_eq!(loaded.tools, vec!["web_search"]);
        assert!(loaded.state.is_object());

        store.activate_agent(id).await.unwrap();
        assert!(store.agent(id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn update_keeps_identity_and_active_flag() {
        let store = test_store().await;
        let id = store.insert_agent(agent("alpha", false)).await.unwrap();
        store.activate_agent(id).await.unwrap();

        let mut changed = agent("alpha", false);
        changed.id = id;
        changed.persona = "terse".into();
        changed.model_name = "mistral:latest".into();
        assert!(store.update_agent(changed).await.unwrap());

        let loaded = store.agent(id).await.unwrap().unwrap();
        assert_eq!(loaded.persona, "terse");
        assert_eq!(loaded.model_name, "mistral:latest");
        assert!(loaded.is_active);

        let mut unknown = agent("ghost", false);
        unknown.id = 999;
        assert!(!store.update_agent(unknown).await.unwrap());
    }

    #[tokio::test]
    async fn activate_is_exclusive() {
        let store = test_store().await;
        let a = store.insert_agent(agent("a", true)).await.unwrap();
        let b = store.insert_agent(agent("b", false)).await.unwrap();

        assert!(store.activate_agent(b).await.unwrap());
        assert!(!store.activate_agent(999).await.unwrap());

        let agents = store.list_agents().await.unwrap();
        assert_eq!(agents.len(), 2);
        assert!(!agents.iter().find(|x| x.id == a).unwrap().is_active);
        assert_eq!(store.active_agent().await.unwrap().unwrap().id, b);
    }

    #[tokio::test]
    async fn agent_state_update() {
        let store = test_store().await;
        let id = store.insert_agent(agent("a", true)).await.unwrap();

        store
            .update_agent_state(id, json!({"current_goal": "rest"}))
            .await
            .unwrap();
        let loaded = store.agent(id).await.unwrap().unwrap();
        assert_eq!(loaded.state, json!({"current_goal": "rest"}));

        assert!(store
            .update_agent_state(999, json!({}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn user_round_trip_with_explicit_id() {
        let store = test_store().await;
        let id = store
            .insert_user(UserRecord {
                id: 5,
                username: "sam".into(),
                state: json!({"mood": "curious"}),
            })
            .await
            .unwrap();
        assert_eq!(id, 5);

        let user = store.user(5).await.unwrap().unwrap();
        assert_eq!(user.username, "sam");
        assert_eq!(user.state["mood"], "curious");

        store
            .update_user_state(5, json!({"mood": "tired"}))
            .await
            .unwrap();
        assert_eq!(store.user(5).await.unwrap().unwrap().state["mood"], "tired");
    }

    #[tokio::test]
    async fn template_upsert_replaces() {
        let store = test_store().await;
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

        assert_eq!(
            store.template("decision").await.unwrap().unwrap().template,
            "v2"
        );
        assert!(store.template("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tool_spec_round_trip() {
        let store = test_store().await;
        store
            .upsert_tool_spec(ToolSpec {
                name: "web_search".into(),
                description: "search the web".into(),
                parameters_schema: json!({"query": "string"}),
            })
            .await
            .unwrap();

        let spec = store.tool_spec("web_search").await.unwrap().unwrap();
        assert_eq!(spec.parameters_schema["query"], "string");
    }

    #[tokio::test]
    async fn history_appends_and_truncates() {
        let store = test_store().await;
        let ts = Utc::now();

        for i in 0..MAX_HISTORY_TURNS + 2 {
            store
                .append_exchange(1, 1, &format!("q{i}"), &format!("a{i}"), ts)
                .await
                .unwrap();
        }

        let transcript = store.history(1, 1).await.unwrap();
        assert_eq!(transcript.len(), MAX_HISTORY_TURNS * 2);
        assert_eq!(transcript[0].content, "q2");
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].timestamp, transcript[1].timestamp);
    }

    #[tokio::test]
    async fn history_is_scoped_and_clearable() {
        let store = test_store().await;
        let ts = Utc::now();
        store.append_exchange(1, 1, "a", "b", ts).await.unwrap();
        store.append_exchange(1, 2, "c", "d", ts).await.unwrap();

        store.clear_history(1, 1).await.unwrap();
        assert!(store.history(1, 1).await.unwrap().is_empty());
        assert_eq!(store.history(1, 2).await.unwrap().len(), 2);
    }
}
