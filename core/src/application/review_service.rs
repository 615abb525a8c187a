// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Review and appeal usecases.
//!
//! The write-path state machines live here: one logical review per order
//! (re-submission appends), the single-reply rule, operator audits, and
//! the appeal lifecycle with its coupled review transition. Every
//! successful review write hands the record to the async pipeline.

use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::{debug, error};

use crate::application::pipeline::ModerationPipeline;
use crate::domain::error::ServiceError;
use crate::domain::repository::{
    AppealDecideOutcome, OperatorAction, ReplySaveOutcome, ReviewStore,
};
use crate::domain::review::{
    Appeal, AppealDecision, AppealPatch, AppealStatus, Reply, Review, ReviewPatch, ReviewStatus,
};
use crate::infrastructure::snowflake::SnowflakeGenerator;

pub const MAX_CONTENT_CHARS: usize = 512;
const SYSTEM_AUTHOR: &str = "system";

/// Customer input for a new review. Identifier and status are assigned
/// here, never by the caller.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub order_id: i64,
    pub user_id: i64,
    pub store_id: i64,
    pub sku_id: i64,
    pub spu_id: i64,
    pub score: i32,
    pub service_score: i32,
    pub express_score: i32,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
    pub anonymous: bool,
}

#[derive(Debug, Clone)]
pub struct ReplyInput {
    pub review_id: i64,
    pub store_id: i64,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
}

#[derive(Debug, Clone)]
pub struct AuditReviewInput {
    pub review_id: i64,
    /// Target status code: 20 (approve) or 30 (reject).
    pub status: i16,
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
}

#[derive(Debug, Clone)]
pub struct AppealInput {
    pub review_id: i64,
    pub store_id: i64,
    pub reason: String,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
}

#[derive(Debug, Clone)]
pub struct AuditAppealInput {
    pub appeal_id: i64,
    /// Decision code: 20 (uphold) or 30 (reject).
    pub status: i16,
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
}

pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    ids: Arc<SnowflakeGenerator>,
    pipeline: Arc<ModerationPipeline>,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        ids: Arc<SnowflakeGenerator>,
        pipeline: Arc<ModerationPipeline>,
    ) -> Self {
        Self {
            store,
            ids,
            pipeline,
        }
    }

    /// Create a review, or append to the existing one when the order has
    /// already been reviewed. Either way the async pipeline is triggered
    /// with the resulting record.
    pub async fn create_review(&self, input: NewReview) -> Result<Review, ServiceError> {
        validate_new_review(&input)?;
        debug!(order_id = input.order_id, "create review");

        let existing = self.store.find_reviews_by_order(input.order_id).await?;

        if let Some(existing) = existing.into_iter().next() {
            return self.append_review(existing, input).await;
        }

        let now = Utc::now();
        let review = Review {
            review_id: self.next_id()?,
            order_id: input.order_id,
            user_id: input.user_id,
            store_id: input.store_id,
            sku_id: input.sku_id,
            spu_id: input.spu_id,
            score: input.score,
            service_score: input.service_score,
            express_score: input.express_score,
            content: input.content,
            pic_info: input.pic_info.clone(),
            video_info: input.video_info.clone(),
            anonymous: input.anonymous,
            has_media: !input.pic_info.is_empty() || !input.video_info.is_empty(),
            has_reply: 0,
            status: ReviewStatus::Pending,
            op_user: String::new(),
            op_reason: String::new(),
            op_remarks: String::new(),
            version: 0,
            create_by: SYSTEM_AUTHOR.to_string(),
            update_by: SYSTEM_AUTHOR.to_string(),
            create_at: now,
            update_at: now,
            delete_at: None,
        };

        self.store.create_review(&review).await?;
        self.pipeline.dispatch(review.clone());
        Ok(review)
    }

    /// Second submission on an order: append the new content under a
    /// timestamp header and overwrite scores and media.
    async fn append_review(
        &self,
        existing: Review,
        input: NewReview,
    ) -> Result<Review, ServiceError> {
        let header = Local::now().format("%Y-%m-%d %H:%M:%S");
        let appended = format!("{}\n\n[追加评论 {}]:\n{}", existing.content, header, input.content);

        self.store
            .update_review(
                existing.review_id,
                existing.version,
                ReviewPatch {
                    content: Some(appended),
                    score: Some(input.score),
                    service_score: Some(input.service_score),
                    express_score: Some(input.express_score),
                    pic_info: Some(input.pic_info.clone()),
                    video_info: Some(input.video_info.clone()),
                    has_media: Some(
                        !input.pic_info.is_empty() || !input.video_info.is_empty(),
                    ),
                    ..Default::default()
                },
            )
            .await?;

        // Re-read for fresh timestamps; on failure the pre-update record
        // still goes through the pipeline so the index is not starved.
        match self.store.get_review(existing.review_id).await {
            Ok(Some(updated)) => {
                self.pipeline.dispatch(updated.clone());
                Ok(updated)
            }
            Ok(None) | Err(_) => {
                error!(
                    review_id = existing.review_id,
                    "failed to re-read review after append"
                );
                self.pipeline.dispatch(existing.clone());
                Ok(existing)
            }
        }
    }

    pub async fn get_review(&self, review_id: i64) -> Result<Review, ServiceError> {
        self.store
            .get_review(review_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("review {review_id} not found")))
    }

    /// Merchant reply: at most one per review, only by the owning store.
    /// The has_reply flip and the insert commit atomically.
    pub async fn reply_review(&self, input: ReplyInput) -> Result<Reply, ServiceError> {
        let now = Utc::now();
        let reply = Reply {
            reply_id: self.next_id()?,
            review_id: input.review_id,
            store_id: input.store_id,
            content: input.content,
            pic_info: input.pic_info,
            video_info: input.video_info,
            create_at: now,
            update_at: now,
        };

        match self.store.save_reply(reply).await? {
            ReplySaveOutcome::Saved(reply) => Ok(reply),
            ReplySaveOutcome::ReviewMissing => Err(ServiceError::NotFound(format!(
                "review {} not found",
                input.review_id
            ))),
            ReplySaveOutcome::AlreadyReplied => Err(ServiceError::DuplicateReply),
            ReplySaveOutcome::StoreMismatch => Err(ServiceError::ReplyForbidden),
        }
    }

    /// Operator audit of a pending review.
    pub async fn audit_review(&self, input: AuditReviewInput) -> Result<Review, ServiceError> {
        let target = ReviewStatus::try_from(input.status)
            .map_err(ServiceError::InvalidTransition)?;

        let review = self.get_review(input.review_id).await?;
        // Operator audits act on pending reviews only; from there the
        // state machine restricts the reachable targets.
        if review.status != ReviewStatus::Pending || !review.status.can_transition(target) {
            return Err(ServiceError::InvalidTransition(format!(
                "cannot audit review {} from status {} to {}",
                input.review_id,
                review.status.code(),
                target.code()
            )));
        }

        self.store
            .update_review(
                input.review_id,
                review.version,
                ReviewPatch {
                    status: Some(target),
                    op_user: Some(input.op_user.clone()),
                    op_reason: Some(input.op_reason),
                    op_remarks: Some(input.op_remarks),
                    update_by: Some(input.op_user),
                    ..Default::default()
                },
            )
            .await?;

        self.get_review(input.review_id).await
    }

    /// Merchant appeal against an approved review. A pending appeal is
    /// updated in place; a decided one blocks re-appeal.
    pub async fn appeal_review(&self, input: AppealInput) -> Result<Appeal, ServiceError> {
        let review = self.get_review(input.review_id).await?;
        if review.store_id != input.store_id {
            return Err(ServiceError::AppealForbidden);
        }
        // An upheld appeal hides the review, so only reviews that can
        // still reach hidden (approved ones) are appealable.
        if !review.status.can_transition(ReviewStatus::Hidden) {
            return Err(ServiceError::InvalidTransition(format!(
                "review {} is not approved, cannot appeal",
                input.review_id
            )));
        }

        let appeals = self.store.find_appeals_by_review(input.review_id).await?;
        if let Some(existing) = appeals.into_iter().next() {
            if existing.status.is_terminal() {
                return Err(ServiceError::AppealAlreadyDecided);
            }

            self.store
                .update_appeal(
                    existing.appeal_id,
                    AppealPatch {
                        reason: Some(input.reason),
                        content: Some(input.content),
                        pic_info: Some(input.pic_info),
                        video_info: Some(input.video_info),
                    },
                )
                .await?;

            return self
                .store
                .get_appeal(existing.appeal_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("appeal {} vanished", existing.appeal_id))
                });
        }

        let now = Utc::now();
        let appeal = Appeal {
            appeal_id: self.next_id()?,
            review_id: input.review_id,
            store_id: input.store_id,
            status: AppealStatus::Pending,
            reason: input.reason,
            content: input.content,
            pic_info: input.pic_info,
            video_info: input.video_info,
            op_user: String::new(),
            op_reason: String::new(),
            op_remarks: String::new(),
            update_by: String::new(),
            create_at: now,
            update_at: now,
        };
        self.store.create_appeal(&appeal).await?;
        Ok(appeal)
    }

    /// Operator decision on a pending appeal; the coupled review
    /// transition commits in the same transaction.
    pub async fn audit_appeal(&self, input: AuditAppealInput) -> Result<Appeal, ServiceError> {
        let decision = AppealDecision::from_code(input.status)
            .ok_or(ServiceError::InvalidAppealDecision(input.status))?;

        let outcome = self
            .store
            .decide_appeal(
                input.appeal_id,
                decision,
                OperatorAction {
                    op_user: input.op_user,
                    op_reason: input.op_reason,
                    op_remarks: input.op_remarks,
                },
            )
            .await?;

        match outcome {
            AppealDecideOutcome::Decided(appeal) => Ok(appeal),
            AppealDecideOutcome::AppealMissing => Err(ServiceError::NotFound(format!(
                "appeal {} not found",
                input.appeal_id
            ))),
            AppealDecideOutcome::NotPending => Err(ServiceError::AppealAlreadyDecided),
        }
    }

    pub async fn list_appeals_by_status(
        &self,
        status: i16,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Appeal>, ServiceError> {
        let status = AppealStatus::try_from(status).map_err(ServiceError::InvalidArguments)?;
        Ok(self
            .store
            .list_appeals_by_status(status, offset, limit)
            .await?)
    }

    fn next_id(&self) -> Result<i64, ServiceError> {
        self.ids
            .next_id()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

fn validate_new_review(input: &NewReview) -> Result<(), ServiceError> {
    if input.content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ServiceError::InvalidArguments(format!(
            "content exceeds {MAX_CONTENT_CHARS} characters"
        )));
    }
    if !(1..=5).contains(&input.score) {
        return Err(ServiceError::InvalidArguments(format!(
            "score must be within 1..=5, got {}",
            input.score
        )));
    }
    Ok(())
}
