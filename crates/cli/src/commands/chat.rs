//! `aigentd chat` — Process one message in-process and print the answer.
//!
//! Runs the same stack as the gateway but without HTTP: submit the message
//! to the task queue, poll until a terminal state, print the result.

use aigentd_config::AppConfig;
use aigentd_tasks::TaskState;
use std::time::Duration;

pub async fn run(
    config: AppConfig,
    user_id: i64,
    message: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::build_store(&config).await?;

    if store.user(user_id).await?.is_none() {
        return Err(format!("Unknown user id {user_id}. Seed a fixture first.").into());
    }
    if store.active_agent().await?.is_none() {
        return Err("No active aigent. Seed a fixture or activate one over the API.".into());
    }

    let queue = super::build_queue(&config, store);
    let task_id = queue.submit(user_id, message).await;

    eprint!("  Thinking...");
    loop {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let Some(snapshot) = queue.status(task_id).await else {
            continue;
        };
        if !snapshot.state.is_terminal() {
            continue;
        }
        eprint!("\r             \r");

        match snapshot.state {
            TaskState::Success => {
                let answer = snapshot
                    .result
                    .map(|r| r.answer_to_user)
                    .unwrap_or_default();
                println!("{answer}");
                return Ok(());
            }
            _ => {
                let reason = snapshot
                    .error_message
                    .unwrap_or_else(|| "unknown error".into());
                return Err(format!("Chat turn failed: {reason}").into());
            }
        }
    }
}
