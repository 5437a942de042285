//! ModelClient trait — the abstraction over the text-generation endpoint.
//!
//! A client issues exactly one outbound request per call and returns the
//! model's raw text output. It owns timeouts and transport-failure
//! classification; parsing the returned text is entirely the caller's job.

use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One generation request against a model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Endpoint base URL (e.g. "http://10.0.0.2:11434").
    pub endpoint: String,

    /// Model name the endpoint understands.
    pub model: String,

    /// The fully rendered prompt.
    pub prompt: String,

    /// Optional sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Optional context window size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

/// The model client trait. Implementations do transport only — no model
/// semantics, no retries (the orchestration loop owns the retry policy).
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A human-readable name for this client (e.g. "ollama").
    fn name(&self) -> &str;

    /// Send one request and return the model's raw text output.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ClientError>;
}
