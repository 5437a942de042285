//! Turn orchestration for aigentd.
//!
//! This crate owns the hard part of the system: coercing free-text model
//! output into structured data (`extract`), rendering prompt templates
//! (`template`), assembling per-turn context (`context`), and driving the
//! decide / act / synthesize / finalize state machine (`turn`).

pub mod context;
pub mod extract;
pub mod template;
pub mod turn;

pub use context::PromptContext;
pub use extract::extract_json;
pub use turn::{RetryPolicy, TurnOutcome, TurnRunner};
