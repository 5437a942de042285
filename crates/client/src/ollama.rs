//! Ollama client — POST /api/generate against a configured endpoint.
//!
//! Transport only: the client requests JSON-formatted output from the model
//! but never validates or interprets the returned text. It classifies
//! transport failures so the orchestration loop can decide what is
//! retryable; parsing the text is the loop's job.

use aigentd_core::error::ClientError;
use aigentd_core::{GenerateRequest, ModelClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// How much of an error response body is carried into the error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// An Ollama-compatible generation client.
pub struct OllamaClient {
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new() -> Self {
        // Per-request timeouts come from each GenerateRequest; the builder
        // only sets connection-level defaults.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn build_payload(request: &GenerateRequest) -> serde_json::Value {
        let mut payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "format": "json",
        });

        let mut options = serde_json::Map::new();
        if let Some(temperature) = request.temperature {
            options.insert("temperature".into(), json!(temperature));
        }
        if let Some(num_ctx) = request.num_ctx {
            options.insert("num_ctx".into(), json!(num_ctx));
        }
        if !options.is_empty() {
            payload["options"] = serde_json::Value::Object(options);
        }
        payload
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ClientError> {
        let url = format!("{}/api/generate", request.endpoint.trim_end_matches('/'));
        let payload = Self::build_payload(request);

        debug!(url = %url, model = %request.model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(request.timeout_secs))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(request.timeout_secs)
                } else {
                    ClientError::Connect(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            warn!(status = status.as_u16(), body = %preview, "Model endpoint returned error");
            return Err(ClientError::Status {
                code: status.as_u16(),
                body: preview,
            });
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(format!("invalid JSON body: {e}")))?;

        match body.response {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ClientError::MalformedResponse(
                "response missing 'response' field".into(),
            )),
        }
    }
}

/// The /api/generate response envelope. Only the `response` field matters;
/// the model's text output lives there as a string.
#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateRequest {
        GenerateRequest {
            endpoint: "http://localhost:11434/".into(),
            model: "llama3:latest".into(),
            prompt: "Hello".into(),
            temperature: None,
            num_ctx: None,
            timeout_secs: 60,
        }
    }

    #[test]
    fn payload_omits_options_when_unset() {
        let payload = OllamaClient::build_payload(&request());
        assert_eq!(payload["model"], "llama3:latest");
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["format"], "json");
        assert!(payload.get("options").is_none());
    }

    #[test]
    fn payload_carries_set_options() {
        let mut req = request();
        req.temperature = Some(0.2);
        req.num_ctx = Some(8192);

        let payload = OllamaClient::build_payload(&req);
        assert_eq!(payload["options"]["temperature"], 0.2);
        assert_eq!(payload["options"]["num_ctx"], 8192);
    }

    #[test]
    fn payload_with_only_temperature() {
        let mut req = request();
        req.temperature = Some(0.7);

        let payload = OllamaClient::build_payload(&req);
        assert_eq!(payload["options"]["temperature"], 0.7);
        assert!(payload["options"].get("num_ctx").is_none());
    }

    #[test]
    fn api_response_parses_with_and_without_field() {
        let with: ApiResponse = serde_json::from_str(r#"{"response": "hi", "done": true}"#).unwrap();
        assert_eq!(with.response.as_deref(), Some("hi"));

        let without: ApiResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(without.response.is_none());
    }
}
