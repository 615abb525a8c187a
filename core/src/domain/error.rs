// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Unified error kinds surfaced by the usecase layer.
//!
//! Synchronous write-path errors abort the operation and surface through
//! the transports; async-pipeline and cache errors are logged and never
//! surfaced. Each kind carries a stable machine-readable code used by both
//! the HTTP and the binary RPC error envelopes.

use thiserror::Error;

use crate::domain::cache::CacheError;
use crate::domain::llm::LlmError;
use crate::domain::moderation::ModerationError;
use crate::domain::repository::StoreError;
use crate::domain::search::SearchError;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("a merchant can only reply to reviews of its own store")]
    ReplyForbidden,

    #[error("review already has a reply")]
    DuplicateReply,

    #[error("a merchant can only appeal reviews of its own store")]
    AppealForbidden,

    #[error("the appeal for this review has already been decided")]
    AppealAlreadyDecided,

    #[error("appeal decision must be uphold (20) or reject (30), got {0}")]
    InvalidAppealDecision(i16),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid listing target: {0}")]
    InvalidTarget(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Optimistic concurrency conflict; the caller may retry.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("moderation failed: {0}")]
    Moderation(String),

    #[error("database failure: {0}")]
    DbFailed(String),

    #[error("search index failure: {0}")]
    IndexFailed(String),

    #[error("cache failure: {0}")]
    CacheFailed(String),

    #[error("llm failure: {0}")]
    LlmFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code for error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::ReplyForbidden => "REPLY_FORBIDDEN",
            Self::DuplicateReply => "DUPLICATE_REPLY",
            Self::AppealForbidden => "APPEAL_FORBIDDEN",
            Self::AppealAlreadyDecided => "APPEAL_ALREADY_DECIDED",
            Self::InvalidAppealDecision(_) => "INVALID_APPEAL_DECISION",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Self::ToolNotFound(_) => "TOOL_NOT_FOUND",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Conflict(_) => "CONFLICT",
            Self::Moderation(_) => "MODERATION_FAILED",
            Self::DbFailed(_) => "DB_FAILED",
            Self::IndexFailed(_) => "INDEX_FAILED",
            Self::CacheFailed(_) => "CACHE_FAILED",
            Self::LlmFailed(_) => "LLM_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status the transports map this kind to.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::ToolNotFound(_) => 404,
            Self::InvalidTransition(_)
            | Self::InvalidAppealDecision(_)
            | Self::InvalidArguments(_)
            | Self::InvalidTarget(_) => 400,
            Self::ReplyForbidden | Self::AppealForbidden | Self::Forbidden(_) => 403,
            Self::DuplicateReply | Self::AppealAlreadyDecided | Self::Conflict(_) => 409,
            Self::Unauthorized(_) => 401,
            Self::Moderation(_)
            | Self::DbFailed(_)
            | Self::IndexFailed(_)
            | Self::CacheFailed(_)
            | Self::LlmFailed(_) => 503,
            Self::Internal(_) => 500,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound("record not found".into()),
            StoreError::Conflict => ServiceError::Conflict("concurrent update, retry".into()),
            StoreError::Database(message) => ServiceError::DbFailed(message),
        }
    }
}

impl From<SearchError> for ServiceError {
    fn from(err: SearchError) -> Self {
        ServiceError::IndexFailed(err.to_string())
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        ServiceError::CacheFailed(err.to_string())
    }
}

impl From<ModerationError> for ServiceError {
    fn from(err: ModerationError) -> Self {
        ServiceError::Moderation(err.to_string())
    }
}

impl From<LlmError> for ServiceError {
    fn from(err: LlmError) -> Self {
        ServiceError::LlmFailed(err.to_string())
    }
}
