//! The orchestration loop: one user message in, one answered turn out.
//!
//! Phases: SETUP resolves the active aigent, the user, and the decision
//! template; DECIDE makes the first model call and parses its JSON; when the
//! model selects a tool, ACT dispatches it and SYNTHESIZE makes a second
//! model call over the observation; FINALIZE validates the required keys,
//! persists both state blobs, and appends the exchange to the transcript.
//! At most one tool invocation and two model calls per turn.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aigentd_core::{
    AgentConfig, ClientError, ConfigError, EventBus, GenerateRequest, ModelClient, PromptTemplate,
    StateStore, ToolRegistry, TurnError, TurnEvent, UserRecord, DECISION_TEMPLATE_NAME,
    SYNTHESIS_TEMPLATE_NAME,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::PromptContext;
use crate::extract::extract_json;
use crate::template;

const REQUIRED_KEYS: [&str; 3] = ["answer_to_user", "updated_aigent_state", "updated_user_state"];

/// Retry behavior for transient model-call failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total generate attempts per model call (first try included).
    pub max_attempts: u32,

    /// Linear backoff base: attempt n sleeps `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
        }
    }
}

/// The structured result of a successful turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub answer_to_user: String,
    pub updated_aigent_state: Value,
    pub updated_user_state: Value,
}

/// Drives the full turn state machine against injected collaborators.
pub struct TurnRunner {
    client: Arc<dyn ModelClient>,
    store: Arc<dyn StateStore>,
    tools: Arc<ToolRegistry>,
    events: Arc<EventBus>,
    retry: RetryPolicy,
}

impl TurnRunner {
    pub fn new(
        client: Arc<dyn ModelClient>,
        store: Arc<dyn StateStore>,
        tools: Arc<ToolRegistry>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            client,
            store,
            tools,
            events,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Process one user message to completion.
    pub async fn run(
        &self,
        task_id: Uuid,
        user_id: i64,
        message: &str,
    ) -> Result<TurnOutcome, TurnError> {
        self.events.publish(TurnEvent::TurnStarted {
            task_id,
            user_id,
            timestamp: Utc::now(),
        });

        let result = self.run_phases(task_id, user_id, message).await;
        match &result {
            Ok(_) => self.events.publish(TurnEvent::TurnCompleted {
                task_id,
                timestamp: Utc::now(),
            }),
            Err(e) => self.events.publish(TurnEvent::TurnFailed {
                task_id,
                error_message: e.to_string(),
                timestamp: Utc::now(),
            }),
        }
        result
    }

    async fn run_phases(
        &self,
        task_id: Uuid,
        user_id: i64,
        message: &str,
    ) -> Result<TurnOutcome, TurnError> {
        // ── SETUP ──
        let agent = self
            .store
            .active_agent()
            .await?
            .ok_or(ConfigError::NoActiveAgent)?;
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or(ConfigError::UserNotFound(user_id))?;

        let template_name = agent
            .prompt_template
            .as_deref()
            .unwrap_or(DECISION_TEMPLATE_NAME);
        let decision_template = self.load_template(template_name).await?;

        let endpoint = agent
            .primary_endpoint()
            .ok_or_else(|| ConfigError::NoEndpoints(agent.name.clone()))?
            .to_string();

        info!(
            task_id = %task_id,
            aigent = %agent.name,
            user_id,
            "Processing turn"
        );

        // ── DECIDE ──
        let mut context = PromptContext::assemble(self.store.as_ref(), &agent, &user, message).await;
        let prompt = template::render(&decision_template, context.values())?;
        let raw = self
            .generate_with_retry(task_id, &agent, &endpoint, prompt)
            .await?;
        let decision = parse_model_json(&raw, "decision")?;

        // ── ACT + SYNTHESIZE, only when the model selected a tool ──
        let final_value = match tool_selection(&decision) {
            Some((tool_name, params)) => {
                debug!(task_id = %task_id, tool = %tool_name, "Model selected a tool");

                let started = Instant::now();
                let observation = self.tools.dispatch(&tool_name, &params).await;
                self.events.publish(TurnEvent::ToolExecuted {
                    task_id,
                    tool_name: tool_name.clone(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Utc::now(),
                });

                let synthesis_template = self.load_template(SYNTHESIS_TEMPLATE_NAME).await?;
                context.insert("tool_name", tool_name);
                context.insert("tool_parameters", params.to_string());
                context.insert("tool_observation", observation);

                let prompt = template::render(&synthesis_template, context.values())?;
                let raw = self
                    .generate_with_retry(task_id, &agent, &endpoint, prompt)
                    .await?;
                parse_model_json(&raw, "synthesis")?
            }
            None => decision,
        };

        // ── FINALIZE ──
        let outcome = validate_outcome(final_value)?;
        self.persist(&agent, &user, message, &outcome).await?;
        Ok(outcome)
    }

    async fn load_template(&self, name: &str) -> Result<PromptTemplate, TurnError> {
        self.store
            .template(name)
            .await?
            .ok_or_else(|| ConfigError::TemplateNotFound(name.to_string()).into())
    }

    /// One logical model call with linear-backoff retries for transient
    /// transport failures. Each retry publishes `ModelCallRetried`.
    async fn generate_with_retry(
        &self,
        task_id: Uuid,
        agent: &AgentConfig,
        endpoint: &str,
        prompt: String,
    ) -> Result<String, ClientError> {
        let request = GenerateRequest {
            endpoint: endpoint.to_string(),
            model: agent.model_name.clone(),
            prompt,
            temperature: agent.temperature,
            num_ctx: agent.context_length,
            timeout_secs: agent.request_timeout_secs,
        };

        let mut attempt = 1u32;
        loop {
            match self.client.generate(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(
                        task_id = %task_id,
                        attempt,
                        error = %e,
                        "Transient model call failure, retrying"
                    );
                    self.events.publish(TurnEvent::ModelCallRetried {
                        task_id,
                        attempt,
                        timestamp: Utc::now(),
                    });
                    tokio::time::sleep(self.retry.base_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Persist states (objects only) and append the exchange with one shared
    /// timestamp.
    async fn persist(
        &self,
        agent: &AgentConfig,
        user: &UserRecord,
        message: &str,
        outcome: &TurnOutcome,
    ) -> Result<(), TurnError> {
        if outcome.updated_aigent_state.is_object() {
            self.store
                .update_agent_state(agent.id, outcome.updated_aigent_state.clone())
                .await?;
        } else {
            warn!(aigent = %agent.name, "Ignoring non-object updated_aigent_state");
        }

        if outcome.updated_user_state.is_object() {
            self.store
                .update_user_state(user.id, outcome.updated_user_state.clone())
                .await?;
        } else {
            warn!(user_id = user.id, "Ignoring non-object updated_user_state");
        }

        self.store
            .append_exchange(
                user.id,
                agent.id,
                message,
                &outcome.answer_to_user,
                Utc::now(),
            )
            .await?;
        Ok(())
    }
}

/// Run raw model output through the extractor and parse it as JSON.
fn parse_model_json(raw: &str, phase: &str) -> Result<Value, TurnError> {
    let cleaned = extract_json(raw);
    serde_json::from_str(&cleaned).map_err(|e| {
        TurnError::DataProcessing(format!("{phase} response is not valid JSON: {e}"))
    })
}

/// A `{"tool_to_use": "...", "parameters": {...}}` shape in the decision
/// output. `parameters` defaults to an empty object when absent.
fn tool_selection(value: &Value) -> Option<(String, Value)> {
    let name = value.get("tool_to_use")?.as_str()?.to_string();
    let params = value
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    Some((name, params))
}

/// Enforce the finalize contract: all three required keys present. The error
/// names both what is missing and what arrived, since that is the whole
/// diagnostic when a model drifts off-contract.
fn validate_outcome(value: Value) -> Result<TurnOutcome, TurnError> {
    let Some(map) = value.as_object() else {
        return Err(TurnError::DataProcessing(format!(
            "final response must be a JSON object, got: {value}"
        )));
    };

    let got: HashSet<&str> = map.keys().map(String::as_str).collect();
    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| !got.contains(k))
        .collect();
    if !missing.is_empty() {
        let mut received: Vec<&str> = got.into_iter().collect();
        received.sort_unstable();
        return Err(TurnError::DataProcessing(format!(
            "final response missing required keys {missing:?}; received keys {received:?}"
        )));
    }

    let answer_to_user = match &map["answer_to_user"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    Ok(TurnOutcome {
        answer_to_user,
        updated_aigent_state: map["updated_aigent_state"].clone(),
        updated_user_state: map["updated_user_state"].clone(),
    })
}
