//! State store backends for aigentd.
//!
//! Two implementations of `aigentd_core::StateStore`:
//! - `MemoryStore` — in-process, for tests and ephemeral runs
//! - `SqliteStore` — persistent, single-file SQLite via sqlx

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
