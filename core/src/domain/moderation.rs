// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Text moderation seam used by the async audit path.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::llm::LlmError;

/// Outcome of moderating one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub approved: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Error)]
pub enum ModerationError {
    /// The classifier reply matched neither of the two allowed shapes.
    #[error("moderation reply indeterminate: {0}")]
    Indeterminate(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[async_trait]
pub trait Moderator: Send + Sync {
    async fn moderate(&self, text: &str) -> Result<Verdict, ModerationError>;
}
