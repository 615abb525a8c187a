// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Per-session short-term conversation memory.
//!
//! Process-local and unpersisted: a horizontally scaled deployment needs
//! session affinity at the edge, or an external store keyed by session id.
//! Readers take a shared lock and copy; writers take the exclusive lock.

use std::collections::HashMap;
use std::sync::RwLock;

/// Hard cap applied on append.
pub const MAX_SESSION_MESSAGES: usize = 100;

/// Tail of the history included when composing prompts.
pub const PROMPT_WINDOW: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Default)]
pub struct SessionMemory {
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full history copy for a session; empty ids have no memory.
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        if session_id.is_empty() {
            return Vec::new();
        }
        let sessions = self.sessions.read().expect("session memory poisoned");
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    pub fn append(&self, session_id: &str, message: ChatMessage) {
        if session_id.is_empty() {
            return;
        }
        let mut sessions = self.sessions.write().expect("session memory poisoned");
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(message);
        if history.len() > MAX_SESSION_MESSAGES {
            let excess = history.len() - MAX_SESSION_MESSAGES;
            history.drain(..excess);
        }
    }
}

/// The prompt window: last [`PROMPT_WINDOW`] messages of a history.
pub fn prompt_window(history: &[ChatMessage]) -> &[ChatMessage] {
    let start = history.len().saturating_sub(PROMPT_WINDOW);
    &history[start..]
}
