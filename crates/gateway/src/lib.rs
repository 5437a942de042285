//! HTTP API gateway for aigentd.
//!
//! A thin layer over the task queue and state store: list/activate aigents,
//! submit chat messages for background processing, poll task status, and
//! fetch or clear chat history. Identity is a narrow seam — a static map of
//! bearer tokens to user ids supplied by configuration; anything without a
//! valid token gets 401.

pub mod api_v1;

use std::collections::HashMap;
use std::sync::Arc;

use aigentd_core::StateStore;
use aigentd_tasks::TaskQueue;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Json;
use axum::routing::get;
use axum::{extract::State, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared state behind every gateway route.
pub struct GatewayState {
    pub store: Arc<dyn StateStore>,
    pub queue: Arc<TaskQueue>,

    /// Bearer token → user id.
    pub auth_tokens: HashMap<String, i64>,
}

pub type SharedState = Arc<GatewayState>;

/// The authenticated caller, resolved by the auth middleware.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Build the full router: `/health` open, everything under `/api/v1`
/// token-authenticated.
pub fn build_router(state: SharedState) -> Router {
    let v1 = api_v1::v1_router(state.clone())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", v1)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn serve(
    state: SharedState,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Resolve the bearer token to a user id and stash it in request extensions.
async fn auth_middleware(
    State(state): State<SharedState>,
    mut req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token.and_then(|t| state.auth_tokens.get(t)) {
        Some(&user_id) => {
            req.extensions_mut().insert(AuthUser(user_id));
            Ok(next.run(req).await)
        }
        None => {
            warn!("Rejected request with missing or unknown bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
