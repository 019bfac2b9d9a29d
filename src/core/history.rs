// conversation memory

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The most recent `limit` messages.
pub fn trim(history: &[ChatMessage], limit: usize) -> &[ChatMessage] {
    &history[history.len().saturating_sub(limit)..]
}

/// Plain-text transcript, one `ROLE: content` entry per message.
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sessions kept before the least recently used one is dropped.
pub const MAX_SESSIONS: usize = 1000;

struct Session {
    messages: Vec<ChatMessage>,
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    by_id: HashMap<String, Session>,
    tick: u64,
}

/// Server-side memory, one conversation per session id.
pub struct SessionStore {
    sessions: Mutex<Sessions>,
    cap: usize,
    max_sessions: usize,
}

impl SessionStore {
    /// `cap` bounds the messages kept per session.
    pub fn new(cap: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            cap,
            max_sessions: MAX_SESSIONS,
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub async fn get(&self, id: &str) -> Vec<ChatMessage> {
        self.sessions
            .lock()
            .await
            .by_id
            .get(id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    pub async fn record(&self, id: &str, question: &str, answer: &str) {
        let mut sessions = self.sessions.lock().await;
        sessions.tick += 1;
        let tick = sessions.tick;

        if !sessions.by_id.contains_key(id) && sessions.by_id.len() >= self.max_sessions {
            let oldest = sessions
                .by_id
                .iter()
                .min_by_key(|(_, s)| s.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!(session = %oldest, "evicting idle session");
                sessions.by_id.remove(&oldest);
            }
        }

        let session = sessions.by_id.entry(id.to_string()).or_insert(Session {
            messages: Vec::new(),
            last_used: tick,
        });
        session.last_used = tick;
        session.messages.push(ChatMessage::user(question));
        session.messages.push(ChatMessage::assistant(answer));

        let excess = session.messages.len().saturating_sub(self.cap);
        session.messages.drain(..excess);
    }

    /// Returns whether the session existed.
    pub async fn clear(&self, id: &str) -> bool {
        self.sessions.lock().await.by_id.remove(id).is_some()
    }
}
