//! Shared wiring for the CLI commands: config loading and the store/queue
//! stack every command runs on.

pub mod chat;
pub mod seed;
pub mod serve;

use aigentd_client::OllamaClient;
use aigentd_config::AppConfig;
use aigentd_core::{EventBus, StateStore};
use aigentd_engine::{RetryPolicy, TurnRunner};
use aigentd_store::{MemoryStore, SqliteStore};
use aigentd_tasks::TaskQueue;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "aigentd.toml";

/// Load configuration from an explicit path, the default path, or fall back
/// to built-in defaults when no file exists.
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(AppConfig::load(&p)?),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Ok(AppConfig::load(&default)?)
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

/// Open the configured store backend.
pub async fn build_store(
    config: &AppConfig,
) -> Result<Arc<dyn StateStore>, Box<dyn std::error::Error>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => Ok(Arc::new(SqliteStore::open(&config.store.path).await?)),
        other => {
            Err(format!("Unknown store backend '{other}' (expected \"sqlite\" or \"memory\")").into())
        }
    }
}

/// Assemble the orchestration stack: model client, tools, turn runner, and
/// the task queue on top.
pub fn build_queue(config: &AppConfig, store: Arc<dyn StateStore>) -> Arc<TaskQueue> {
    let events = Arc::new(EventBus::default());
    let runner = TurnRunner::new(
        Arc::new(OllamaClient::new()),
        store,
        Arc::new(aigentd_tools::default_registry()),
        events.clone(),
    )
    .with_retry(RetryPolicy {
        max_attempts: config.retry.max_attempts,
        base_delay: Duration::from_secs(config.retry.base_delay_secs),
    });
    Arc::new(TaskQueue::new(Arc::new(runner), &events))
}
