// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! LLM provider domain interface.
//!
//! Anti-corruption layer that isolates the moderation client and the agent
//! orchestrator from vendor APIs. Both consumers send a single prompt and
//! read back a single completion; streaming and chat-shaped surfaces are
//! deliberately not modelled.
//!
//! Implementations live in `infrastructure/llm/`.

use async_trait::async_trait;
use thiserror::Error;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),
}
