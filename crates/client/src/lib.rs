//! Model client implementations for aigentd.

pub mod ollama;

pub use ollama::OllamaClient;
