// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AI audit command.
//!
//! Extracted from the review usecase as a standalone capability so the
//! async pipeline can depend on it without a cycle back through the
//! usecase (which itself owns the pipeline handle). Only pending reviews
//! are auditable; a moderation failure leaves the review pending.

use std::sync::Arc;

use crate::domain::error::ServiceError;
use crate::domain::moderation::Moderator;
use crate::domain::repository::ReviewStore;
use crate::domain::review::{Review, ReviewPatch, ReviewStatus};

pub const AI_AUDITOR_NAME: &str = "AI";
const AI_APPROVED_REMARK: &str = "AI审核通过";
const AI_REJECTED_REMARK: &str = "AI审核不通过";

pub struct AiAuditor {
    store: Arc<dyn ReviewStore>,
    moderator: Arc<dyn Moderator>,
}

impl AiAuditor {
    pub fn new(store: Arc<dyn ReviewStore>, moderator: Arc<dyn Moderator>) -> Self {
        Self { store, moderator }
    }

    /// Moderate a pending review and move it to approved or rejected.
    /// Returns the refreshed record.
    pub async fn audit(&self, review_id: i64) -> Result<Review, ServiceError> {
        let review = self
            .store
            .get_review(review_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("review {review_id} not found")))?;

        if review.status != ReviewStatus::Pending {
            return Err(ServiceError::InvalidTransition(format!(
                "review {review_id} is not pending, cannot audit"
            )));
        }

        let verdict = self.moderator.moderate(&review.content).await?;

        let (status, remarks) = if verdict.approved {
            (ReviewStatus::Approved, AI_APPROVED_REMARK)
        } else {
            (ReviewStatus::Rejected, AI_REJECTED_REMARK)
        };

        self.store
            .update_review(
                review_id,
                review.version,
                ReviewPatch {
                    status: Some(status),
                    op_reason: Some(verdict.reason),
                    op_remarks: Some(remarks.to_string()),
                    update_by: Some(AI_AUDITOR_NAME.to_string()),
                    ..Default::default()
                },
            )
            .await?;

        self.store
            .get_review(review_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("review {review_id} vanished")))
    }
}
