use axum::{extract::State, Extension, Json};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Recent prompt lines per session id.
///
/// Sessions are evicted when idle or when the cache is full; each history keeps
/// only its last `max_lines` lines.
pub struct ChatSessions {
    sessions: Cache<String, VecDeque<String>>,
    max_lines: usize,
}

impl ChatSessions {
    pub fn new(max_sessions: u64, idle: Duration, max_turns: usize) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle)
                .build(),
            max_lines: max_turns.saturating_mul(2),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.chat_max_sessions,
            Duration::from_secs(config.chat_session_idle_secs),
            config.chat_history_turns,
        )
    }

    pub fn history(&self, session_id: &str) -> VecDeque<String> {
        self.sessions.get(session_id).unwrap_or_default()
    }

    /// Appends one exchange, dropping the oldest lines past the cap
    pub fn record_turn(&self, session_id: String, message: &str, reply: &str) {
        let mut lines = self.history(&session_id);
        lines.push_back(format!("User: {}", message));
        lines.push_back(format!("Assistant: {}", reply));
        while lines.len() > self.max_lines {
            lines.pop_front();
        }
        self.sessions.insert(session_id, lines);
    }
}

/// Handler for the chat endpoint
///
/// With a `session_id`, recent turns of that session are prefixed to the prompt.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::InvalidInput("Message required".to_string()));
    }

    let history = match &request.session_id {
        Some(id) => state.chat_sessions.history(id),
        None => VecDeque::new(),
    };

    let prompt = history
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(message))
        .collect::<Vec<_>>()
        .join("\n");

    tracing::info!(
        request_id = %request_id,
        session = request.session_id.as_deref().unwrap_or("-"),
        history_lines = history.len(),
        "Processing chat message"
    );

    let reply = state.narrator.generate_text(&prompt).await?;

    if let Some(id) = request.session_id {
        state.chat_sessions.record_turn(id, message, &reply);
    }

    Ok(Json(ChatResponse { reply }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_keeps_latest_turns() {
        let sessions = ChatSessions::new(10, Duration::from_secs(60), 2);
        for i in 0..5 {
            sessions.record_turn("s1".to_string(), &format!("q{i}"), &format!("a{i}"));
        }
        let history: Vec<String> = sessions.history("s1").into_iter().collect();
        assert_eq!(history, vec!["User: q3", "Assistant: a3", "User: q4", "Assistant: a4"]);
        assert!(sessions.history("other").is_empty());
    }

    #[test]
    fn test_zero_turns_keeps_nothing() {
        let sessions = ChatSessions::new(10, Duration::from_secs(60), 0);
        sessions.record_turn("s1".to_string(), "hello", "hi");
        assert!(sessions.history("s1").is_empty());
    }
}
