// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Primary store gateway.
//!
//! The trait is the seam between the usecases and PostgreSQL; every
//! non-composite method is a single statement against the store. The two
//! composite operations (`save_reply`, `decide_appeal`) run their
//! precondition checks and writes inside one transaction and report the
//! outcome as data, so the usecase layer can translate it into its own
//! error kinds without the store knowing about them.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::review::{
    Appeal, AppealDecision, AppealPatch, AppealStatus, Reply, Review, ReviewPatch,
};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    /// Optimistic `version` guard mismatch; the caller may re-read and retry.
    #[error("optimistic version conflict")]
    Conflict,

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Result of the transactional reply flow.
#[derive(Debug, Clone)]
pub enum ReplySaveOutcome {
    Saved(Reply),
    ReviewMissing,
    AlreadyReplied,
    StoreMismatch,
}

/// Result of the transactional appeal decision.
#[derive(Debug, Clone)]
pub enum AppealDecideOutcome {
    Decided(Appeal),
    AppealMissing,
    NotPending,
}

/// Operator identity attached to an audit write.
#[derive(Debug, Clone)]
pub struct OperatorAction {
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn create_review(&self, review: &Review) -> Result<(), StoreError>;

    async fn get_review(&self, review_id: i64) -> Result<Option<Review>, StoreError>;

    async fn find_reviews_by_order(&self, order_id: i64) -> Result<Vec<Review>, StoreError>;

    /// Applies `patch` iff the stored `version` equals `expected_version`;
    /// bumps `version` and `update_at`. Mismatch is [`StoreError::Conflict`].
    async fn update_review(
        &self,
        review_id: i64,
        expected_version: i64,
        patch: ReviewPatch,
    ) -> Result<(), StoreError>;

    async fn get_reply(&self, review_id: i64) -> Result<Option<Reply>, StoreError>;

    /// Transactional reply flow: checks the target review exists, has no
    /// reply yet, and belongs to the replying store; then flips
    /// `has_reply` and inserts the reply atomically.
    async fn save_reply(&self, reply: Reply) -> Result<ReplySaveOutcome, StoreError>;

    async fn find_appeals_by_review(&self, review_id: i64) -> Result<Vec<Appeal>, StoreError>;

    async fn get_appeal(&self, appeal_id: i64) -> Result<Option<Appeal>, StoreError>;

    async fn create_appeal(&self, appeal: &Appeal) -> Result<(), StoreError>;

    /// In-place update of a pending appeal (merchant re-submission).
    async fn update_appeal(&self, appeal_id: i64, patch: AppealPatch) -> Result<(), StoreError>;

    /// Transactional appeal decision: moves a pending appeal to its
    /// terminal state and forces the coupled review status in the same
    /// transaction.
    async fn decide_appeal(
        &self,
        appeal_id: i64,
        decision: AppealDecision,
        operator: OperatorAction,
    ) -> Result<AppealDecideOutcome, StoreError>;

    async fn list_appeals_by_status(
        &self,
        status: AppealStatus,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Appeal>, StoreError>;
}
