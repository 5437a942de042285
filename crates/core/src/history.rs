//! Chat transcript types and retention rules.
//!
//! One transcript exists per (user, aigent) pair. Entries are appended in
//! strict user/assistant pairs sharing a single timestamp, and the stored
//! sequence is truncated to the most recent turns after each append.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retention bound: most recent turns kept per transcript. Each turn is a
/// user/assistant pair, so the entry bound is twice this.
pub const MAX_HISTORY_TURNS: usize = 50;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Capitalized label used when rendering history into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append a user/assistant exchange to a transcript in place, sharing one
/// timestamp, then truncate to the retention bound (oldest entries dropped
/// silently, order of the remainder preserved).
pub fn append_exchange(
    history: &mut Vec<ChatEntry>,
    user_message: &str,
    answer: &str,
    timestamp: DateTime<Utc>,
) {
    history.push(ChatEntry {
        role: Role::User,
        content: user_message.to_string(),
        timestamp,
    });
    history.push(ChatEntry {
        role: Role::Assistant,
        content: answer.to_string(),
        timestamp,
    });

    let max_entries = MAX_HISTORY_TURNS * 2;
    if history.len() > max_entries {
        let excess = history.len() - max_entries;
        history.drain(..excess);
    }
}
