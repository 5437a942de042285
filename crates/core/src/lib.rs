//! # aigentd Core
//!
//! Domain types, traits, and error definitions for the aigentd chat
//! backend. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem seam is a trait here: the model client, the state store,
//! and tools. Implementations live in their respective crates, which keeps
//! the dependency graph pointing inward and makes the orchestration loop
//! testable with mocks.

pub mod agent;
pub mod client;
pub mod error;
pub mod event;
pub mod history;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{
    AgentConfig, PromptTemplate, UserRecord, DECISION_TEMPLATE_NAME, SYNTHESIS_TEMPLATE_NAME,
};
pub use client::{GenerateRequest, ModelClient};
pub use error::{ClientError, ConfigError, StoreError, ToolError, TurnError};
pub use event::{EventBus, TurnEvent};
pub use history::{ChatEntry, Role, MAX_HISTORY_TURNS};
pub use store::StateStore;
pub use tool::{Tool, ToolRegistry, ToolSpec};
