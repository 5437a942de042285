//! Seed fixture loading — initial prompts, aigents, tool descriptors, and
//! users from a JSON file.
//!
//! Mirrors what an operator would otherwise create by hand: templates first
//! (aigents reference them by name), then tool descriptors, users, and
//! aigents. Existing records are skipped unless `overwrite` is set.

use aigentd_core::agent::{default_agent_state, DEFAULT_REQUEST_TIMEOUT_SECS};
use aigentd_core::{AgentConfig, PromptTemplate, StateStore, StoreError, ToolSpec, UserRecord};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Fixture file not found or unreadable: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Fixture file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The fixture file shape.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub prompts: Vec<SeedPrompt>,

    #[serde(default)]
    pub tools: Vec<ToolSpec>,

    #[serde(default)]
    pub users: Vec<SeedUser>,

    #[serde(default)]
    pub aigents: Vec<SeedAgent>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPrompt {
    pub name: String,
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub id: i64,
    pub username: String,

    #[serde(default)]
    pub state: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SeedAgent {
    pub name: String,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub persona: String,

    #[serde(default = "default_model")]
    pub model_name: String,

    #[serde(default)]
    pub endpoints: Vec<String>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub context_length: Option<u32>,

    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    #[serde(default)]
    pub aigent_state: Option<Value>,

    #[serde(default)]
    pub prompt_template: Option<String>,

    #[serde(default)]
    pub tools: Vec<String>,
}

fn default_model() -> String {
    "llama3:latest".into()
}

impl SeedData {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Apply a fixture to the store. Returns the number of records written.
pub async fn apply(
    data: &SeedData,
    store: &dyn StateStore,
    default_endpoint: &str,
    overwrite: bool,
) -> Result<usize, SeedError> {
    let mut written = 0;

    for prompt in &data.prompts {
        if !overwrite && store.template(&prompt.name).await?.is_some() {
            info!(name = %prompt.name, "Skipped existing prompt");
            continue;
        }
        store
            .upsert_template(PromptTemplate {
                name: prompt.name.clone(),
                template: prompt.template.clone(),
            })
            .await?;
        info!(name = %prompt.name, "Seeded prompt");
        written += 1;
    }

    for tool in &data.tools {
        if !overwrite && store.tool_spec(&tool.name).await?.is_some() {
            info!(name = %tool.name, "Skipped existing tool descriptor");
            continue;
        }
        store.upsert_tool_spec(tool.clone()).await?;
        info!(name = %tool.name, "Seeded tool descriptor");
        written += 1;
    }

    for user in &data.users {
        let state = user
            .state
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        if store.user(user.id).await?.is_some() {
            if !overwrite {
                info!(username = %user.username, "Skipped existing user");
                continue;
            }
            // Users are keyed by id; overwrite resets the state blob.
            store.update_user_state(user.id, state).await?;
            info!(username = %user.username, "Reset user state");
        } else {
            store
                .insert_user(UserRecord {
                    id: user.id,
                    username: user.username.clone(),
                    state,
                })
                .await?;
            info!(username = %user.username, "Seeded user");
        }
        written += 1;
    }

    let existing: Vec<AgentConfig> = store.list_agents().await?;
    for seed in &data.aigents {
        let current = existing.iter().find(|a| a.name == seed.name);
        if current.is_some() && !overwrite {
            info!(name = %seed.name, "Skipped existing aigent");
            continue;
        }

        let mut is_active = seed.is_active;
        if is_active && !overwrite {
            // Don't silently steal the active slot from a configured system.
            if store.active_agent().await?.is_some() {
                warn!(name = %seed.name, "An active aigent already exists; seeding as inactive");
                is_active = false;
            }
        }

        let endpoints = if seed.endpoints.is_empty() {
            vec![default_endpoint.to_string()]
        } else {
            seed.endpoints.clone()
        };

        let config = AgentConfig {
            id: current.map(|a| a.id).unwrap_or(0),
            name: seed.name.clone(),
            is_active: false,
            persona: seed.persona.clone(),
            model_name: seed.model_name.clone(),
            endpoints,
            temperature: seed.temperature,
            context_length: seed.context_length,
            request_timeout_secs: seed
                .request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            state: seed.aigent_state.clone().unwrap_or_else(default_agent_state),
            prompt_template: seed.prompt_template.clone(),
            tools: seed.tools.clone(),
        };

        let id = match current {
            Some(a) => {
                store.update_agent(config).await?;
                info!(name = %seed.name, "Updated existing aigent");
                a.id
            }
            None => store.insert_agent(config).await?,
        };

        if is_active {
            store.activate_agent(id).await?;
        }
        info!(name = %seed.name, active = is_active, "Seeded aigent");
        written += 1;
    }

    Ok(written)
}
