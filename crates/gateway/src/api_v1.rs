//! The `/api/v1` route surface.
//!
//! Chat processing is asynchronous: `send_message` enqueues a task and
//! returns its id, and `task_status` is polled until a terminal state.
//! Status for an id the board has never seen reads as PENDING rather than
//! 404 so a freshly submitted task never races its own status poll.

use crate::{AuthUser, SharedState};
use aigentd_core::{ChatEntry, StoreError};
use aigentd_tasks::TaskState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

/// Longest accepted chat message, in characters.
const MAX_MESSAGE_CHARS: usize = 4000;

type ApiError = (StatusCode, Json<Detail>);

#[derive(Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

fn detail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(Detail { detail: message.into() }))
}

fn storage_error(err: StoreError) -> ApiError {
    error!(error = %err, "Storage operation failed");
    detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error.")
}

pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/aigents/list", get(list_aigents))
        .route("/aigents/set_active", post(set_active))
        .route("/chat/send_message", post(send_message))
        .route("/chat/task_status/{task_id}", get(task_status))
        .route("/chat/history", get(get_history).delete(clear_history))
        .with_state(state)
}

// --- Aigents ---

#[derive(Serialize, Deserialize)]
pub struct AigentSummary {
    pub id: i64,
    pub name: String,
    pub model_name: String,
    pub is_active: bool,
}

async fn list_aigents(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AigentSummary>>, ApiError> {
    let agents = state.store.list_agents().await.map_err(storage_error)?;
    let summaries = agents
        .into_iter()
        .map(|a| AigentSummary {
            id: a.id,
            name: a.name,
            model_name: a.model_name,
            is_active: a.is_active,
        })
        .collect();
    Ok(Json(summaries))
}

#[derive(Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub aigent_id: i64,
}

async fn set_active(
    State(state): State<SharedState>,
    Json(body): Json<SetActiveRequest>,
) -> Result<Json<Detail>, ApiError> {
    let activated = state
        .store
        .activate_agent(body.aigent_id)
        .await
        .map_err(storage_error)?;

    if !activated {
        return Err(detail(
            StatusCode::NOT_FOUND,
            format!("Aigent {} not found.", body.aigent_id),
        ));
    }
    Ok(Json(Detail {
        detail: format!("Aigent {} is now active.", body.aigent_id),
    }))
}

// --- Chat ---

#[derive(Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub task_id: Uuid,
    pub detail: String,
}

async fn send_message(
    State(state): State<SharedState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    if body.message.trim().is_empty() {
        return Err(detail(StatusCode::BAD_REQUEST, "Message must not be empty."));
    }
    if body.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(detail(
            StatusCode::BAD_REQUEST,
            format!("Message must be at most {MAX_MESSAGE_CHARS} characters."),
        ));
    }

    // Fail fast when there is nothing to route the message to; the task
    // itself would discover this too, but a synchronous 503 is clearer.
    let active = state.store.active_agent().await.map_err(storage_error)?;
    if active.is_none() {
        return Err(detail(
            StatusCode::SERVICE_UNAVAILABLE,
            "No active aigent is configured.",
        ));
    }

    let task_id = state.queue.submit(user_id, body.message).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(SendMessageResponse {
            task_id,
            detail: "Message accepted for processing.".into(),
        }),
    ))
}

#[derive(Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub task_id: Uuid,
    pub status: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResultBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The slice of a completed turn exposed over the API. State blobs stay
/// internal.
#[derive(Serialize, Deserialize)]
pub struct TaskResultBody {
    pub answer_to_user: String,
}

async fn task_status(
    State(state): State<SharedState>,
    Path(task_id): Path<Uuid>,
) -> Json<TaskStatusResponse> {
    match state.queue.status(task_id).await {
        Some(snapshot) => Json(TaskStatusResponse {
            task_id,
            status: snapshot.state,
            result: snapshot.result.map(|r| TaskResultBody {
                answer_to_user: r.answer_to_user,
            }),
            error_message: snapshot.error_message,
        }),
        None => Json(TaskStatusResponse {
            task_id,
            status: TaskState::Pending,
            result: None,
            error_message: None,
        }),
    }
}

#[derive(Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<ChatEntry>,
}

async fn get_history(
    State(state): State<SharedState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Some(agent) = state.store.active_agent().await.map_err(storage_error)? else {
        return Ok(Json(HistoryResponse { history: Vec::new() }));
    };
    let history = state
        .store
        .history(user_id, agent.id)
        .await
        .map_err(storage_error)?;
    Ok(Json(HistoryResponse { history }))
}

async fn clear_history(
    State(state): State<SharedState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    if let Some(agent) = state.store.active_agent().await.map_err(storage_error)? {
        state
            .store
            .clear_history(user_id, agent.id)
            .await
            .map_err(storage_error)?;
    }
    Ok(Json(Detail {
        detail: "Chat history cleared.".into(),
    }))
}
