//! Error types for the aigentd domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; `TurnError` is the
//! umbrella that a background turn ultimately fails with.

use thiserror::Error;

/// The top-level error a single chat turn can fail with.
///
/// The variants map to the failure classes the task queue reports:
/// configuration errors and data-processing errors are terminal, transport
/// errors are retried while transient.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model endpoint error: {0}")]
    Transport(#[from] ClientError),

    #[error("Data processing error: {0}")]
    DataProcessing(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for turn processing.
pub type Result<T> = std::result::Result<T, TurnError>;

/// Missing or inconsistent operator-owned configuration. Always terminal.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("No active aigent is configured")]
    NoActiveAgent,

    #[error("User with id {0} not found")]
    UserNotFound(i64),

    #[error("Prompt template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Aigent '{0}' has no valid model endpoints configured")]
    NoEndpoints(String),

    #[error("Template '{template}' references unsupplied placeholder '{placeholder}'")]
    MissingPlaceholder { template: String, placeholder: String },
}

/// Transport-level failures from the model client.
///
/// `is_transient()` decides whether the orchestration loop retries the call.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Model endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed model endpoint response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Transient errors are retried with backoff; everything else fails the
    /// call immediately. 5xx statuses and connection/timeout failures are
    /// transient, other HTTP statuses and malformed replies are terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connect(_) => true,
            Self::Status { code, .. } => (500..600).contains(code),
            Self::MalformedResponse(_) => false,
        }
    }
}

/// State store failures (both backends).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tool execution failures. These never escape the dispatcher: the registry
/// converts them to an observation string for the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool parameters: {0}")]
    InvalidParameters(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ClientError::Timeout(60).is_transient());
        assert!(ClientError::Connect("refused".into()).is_transient());
        assert!(
            ClientError::Status {
                code: 503,
                body: "unavailable".into()
            }
            .is_transient()
        );
        assert!(
            !ClientError::Status {
                code: 404,
                body: "not found".into()
            }
            .is_transient()
        );
        assert!(!ClientError::MalformedResponse("no response field".into()).is_transient());
    }

    #[test]
    fn config_error_displays_context() {
        let err = TurnError::Config(ConfigError::TemplateNotFound("StandardChat".into()));
        assert!(err.to_string().contains("StandardChat"));
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn missing_placeholder_names_both_parts() {
        let err = ConfigError::MissingPlaceholder {
            template: "decision".into(),
            placeholder: "user_state".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("decision"));
        assert!(msg.contains("user_state"));
    }
}
