// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Transport-neutral operation facade.
//!
//! Both the HTTP handlers and the binary RPC dispatcher funnel through
//! these functions, so role gating and DTO mapping exist exactly once.

use crate::application::listing_service::ListTarget;
use crate::application::review_service::{
    AppealInput, AuditAppealInput, AuditReviewInput, NewReview, ReplyInput,
};
use crate::domain::error::ServiceError;
use crate::domain::principal::{Principal, Role};
use crate::presentation::api::AppState;
use crate::presentation::dto::{
    AgentProcessRequest, AgentToolRequest, AppealDto, AppealListResponse, AppealReviewRequest,
    AuditAppealRequest, AuditReviewRequest, CreateReviewRequest, PageQuery, ReplyDto,
    ReplyReviewRequest, ReviewDto, ReviewListResponse, ToolCallResponse,
};

use crate::application::agent_service::AgentReply;

fn require_role(principal: &Principal, role: Role) -> Result<(), ServiceError> {
    if principal.role != role {
        return Err(ServiceError::Forbidden(format!(
            "operation requires the {} role",
            role.as_str()
        )));
    }
    Ok(())
}

fn merchant_store(principal: &Principal) -> Result<i64, ServiceError> {
    require_role(principal, Role::Merchant)?;
    principal
        .store_id
        .ok_or_else(|| ServiceError::Forbidden("merchant token carries no store".to_string()))
}

pub async fn create_review(
    state: &AppState,
    principal: &Principal,
    request: CreateReviewRequest,
) -> Result<ReviewDto, ServiceError> {
    require_role(principal, Role::Customer)?;

    let review = state
        .reviews
        .create_review(NewReview {
            order_id: request.order_id,
            user_id: principal.user_id,
            store_id: request.store_id,
            sku_id: request.sku_id,
            spu_id: request.spu_id,
            score: request.score,
            service_score: request.service_score,
            express_score: request.express_score,
            content: request.content,
            pic_info: request.pic_info,
            video_info: request.video_info,
            anonymous: request.anonymous,
        })
        .await?;

    Ok(review.into())
}

pub async fn get_review(state: &AppState, review_id: i64) -> Result<ReviewDto, ServiceError> {
    Ok(state.reviews.get_review(review_id).await?.into())
}

pub async fn list_reviews(
    state: &AppState,
    target: ListTarget,
    id: i64,
    page: PageQuery,
) -> Result<ReviewListResponse, ServiceError> {
    // Pages are 1-based on the wire; the index takes a 0-based offset.
    let offset = page.page.saturating_sub(1).saturating_mul(page.size);
    let list = state.listings.list_by(target, id, offset, page.size).await?;
    Ok(ReviewListResponse {
        list: list.into_iter().map(Into::into).collect(),
    })
}

pub async fn reply_review(
    state: &AppState,
    principal: &Principal,
    request: ReplyReviewRequest,
) -> Result<ReplyDto, ServiceError> {
    let store_id = merchant_store(principal)?;

    let reply = state
        .reviews
        .reply_review(ReplyInput {
            review_id: request.review_id,
            store_id,
            content: request.content,
            pic_info: request.pic_info,
            video_info: request.video_info,
        })
        .await?;

    Ok(reply.into())
}

pub async fn audit_review(
    state: &AppState,
    principal: &Principal,
    request: AuditReviewRequest,
) -> Result<ReviewDto, ServiceError> {
    require_role(principal, Role::Reviewer)?;

    let review = state
        .reviews
        .audit_review(AuditReviewInput {
            review_id: request.review_id,
            status: request.status,
            op_user: request.op_user,
            op_reason: request.op_reason,
            op_remarks: request.op_remarks,
        })
        .await?;

    Ok(review.into())
}

pub async fn appeal_review(
    state: &AppState,
    principal: &Principal,
    request: AppealReviewRequest,
) -> Result<AppealDto, ServiceError> {
    let store_id = merchant_store(principal)?;

    let appeal = state
        .reviews
        .appeal_review(AppealInput {
            review_id: request.review_id,
            store_id,
            reason: request.reason,
            content: request.content,
            pic_info: request.pic_info,
            video_info: request.video_info,
        })
        .await?;

    Ok(appeal.into())
}

pub async fn audit_appeal(
    state: &AppState,
    principal: &Principal,
    request: AuditAppealRequest,
) -> Result<AppealDto, ServiceError> {
    require_role(principal, Role::Reviewer)?;

    let appeal = state
        .reviews
        .audit_appeal(AuditAppealInput {
            appeal_id: request.appeal_id,
            status: request.status,
            op_user: request.op_user,
            op_reason: request.op_reason,
            op_remarks: request.op_remarks,
        })
        .await?;

    Ok(appeal.into())
}

pub async fn list_reviews_by_status(
    state: &AppState,
    principal: &Principal,
    status: i16,
    page: PageQuery,
) -> Result<ReviewListResponse, ServiceError> {
    require_role(principal, Role::Reviewer)?;
    list_reviews(state, ListTarget::Status, status as i64, page).await
}

pub async fn list_appeals_by_status(
    state: &AppState,
    principal: &Principal,
    status: i16,
    page: PageQuery,
) -> Result<AppealListResponse, ServiceError> {
    require_role(principal, Role::Reviewer)?;

    let offset = page.page.saturating_sub(1).saturating_mul(page.size);
    let list = state
        .reviews
        .list_appeals_by_status(status, offset, page.size)
        .await?;
    Ok(AppealListResponse {
        list: list.into_iter().map(Into::into).collect(),
    })
}

pub async fn agent_process(
    state: &AppState,
    principal: &Principal,
    request: AgentProcessRequest,
) -> Result<AgentReply, ServiceError> {
    state
        .agent
        .process(Some(principal), &request.session_id, &request.query)
        .await
}

pub async fn agent_call_tool(
    state: &AppState,
    principal: &Principal,
    request: AgentToolRequest,
) -> Result<ToolCallResponse, ServiceError> {
    let result = state
        .agent
        .call_tool(
            Some(principal),
            &request.tool_name,
            &request.arguments,
            &request.original_query,
        )
        .await?;
    Ok(ToolCallResponse { result })
}
