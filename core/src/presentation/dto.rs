// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wire DTOs for both transports.
//!
//! Identifiers are 64-bit integers internally but cross the wire as
//! strings to avoid precision loss in JavaScript clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::review::{Appeal, Reply, Review, ReviewSummary};

/// Serde helper encoding `i64` as a JSON string, tolerating numbers on
/// the way in.
pub mod id_string {
    use serde::de::{self, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s
                .parse()
                .map_err(|_| de::Error::invalid_value(Unexpected::Str(&s), &"an i64 string")),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(with = "id_string")]
    pub order_id: i64,
    #[serde(with = "id_string")]
    pub store_id: i64,
    #[serde(default, with = "id_string")]
    pub sku_id: i64,
    #[serde(default, with = "id_string")]
    pub spu_id: i64,
    pub score: i32,
    #[serde(default)]
    pub service_score: i32,
    #[serde(default)]
    pub express_score: i32,
    pub content: String,
    #[serde(default)]
    pub pic_info: String,
    #[serde(default)]
    pub video_info: String,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyReviewRequest {
    #[serde(with = "id_string")]
    pub review_id: i64,
    pub content: String,
    #[serde(default)]
    pub pic_info: String,
    #[serde(default)]
    pub video_info: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditReviewRequest {
    #[serde(with = "id_string")]
    pub review_id: i64,
    pub status: i16,
    pub op_user: String,
    #[serde(default)]
    pub op_reason: String,
    #[serde(default)]
    pub op_remarks: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppealReviewRequest {
    #[serde(with = "id_string")]
    pub review_id: i64,
    pub reason: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pic_info: String,
    #[serde(default)]
    pub video_info: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditAppealRequest {
    #[serde(with = "id_string")]
    pub appeal_id: i64,
    pub status: i16,
    pub op_user: String,
    #[serde(default)]
    pub op_reason: String,
    #[serde(default)]
    pub op_remarks: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentProcessRequest {
    #[serde(default)]
    pub session_id: String,
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: String,
    #[serde(default)]
    pub original_query: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReviewDto {
    #[serde(with = "id_string")]
    pub review_id: i64,
    #[serde(with = "id_string")]
    pub order_id: i64,
    #[serde(with = "id_string")]
    pub user_id: i64,
    #[serde(with = "id_string")]
    pub store_id: i64,
    #[serde(with = "id_string")]
    pub sku_id: i64,
    #[serde(with = "id_string")]
    pub spu_id: i64,
    pub score: i32,
    pub service_score: i32,
    pub express_score: i32,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
    pub anonymous: bool,
    pub has_media: bool,
    pub has_reply: i16,
    pub status: i16,
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            review_id: review.review_id,
            order_id: review.order_id,
            user_id: review.user_id,
            store_id: review.store_id,
            sku_id: review.sku_id,
            spu_id: review.spu_id,
            score: review.score,
            service_score: review.service_score,
            express_score: review.express_score,
            content: review.content,
            pic_info: review.pic_info,
            video_info: review.video_info,
            anonymous: review.anonymous,
            has_media: review.has_media,
            has_reply: review.has_reply,
            status: review.status.code(),
            op_user: review.op_user,
            op_reason: review.op_reason,
            op_remarks: review.op_remarks,
            create_at: review.create_at,
            update_at: review.update_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyDto {
    #[serde(with = "id_string")]
    pub reply_id: i64,
    #[serde(with = "id_string")]
    pub review_id: i64,
    #[serde(with = "id_string")]
    pub store_id: i64,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
    pub create_at: DateTime<Utc>,
}

impl From<Reply> for ReplyDto {
    fn from(reply: Reply) -> Self {
        Self {
            reply_id: reply.reply_id,
            review_id: reply.review_id,
            store_id: reply.store_id,
            content: reply.content,
            pic_info: reply.pic_info,
            video_info: reply.video_info,
            create_at: reply.create_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppealDto {
    #[serde(with = "id_string")]
    pub appeal_id: i64,
    #[serde(with = "id_string")]
    pub review_id: i64,
    #[serde(with = "id_string")]
    pub store_id: i64,
    pub status: i16,
    pub reason: String,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
    pub op_user: String,
    pub op_remarks: String,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl From<Appeal> for AppealDto {
    fn from(appeal: Appeal) -> Self {
        Self {
            appeal_id: appeal.appeal_id,
            review_id: appeal.review_id,
            store_id: appeal.store_id,
            status: appeal.status.code(),
            reason: appeal.reason,
            content: appeal.content,
            pic_info: appeal.pic_info,
            video_info: appeal.video_info,
            op_user: appeal.op_user,
            op_remarks: appeal.op_remarks,
            create_at: appeal.create_at,
            update_at: appeal.update_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummaryDto {
    #[serde(with = "id_string")]
    pub review_id: i64,
    #[serde(with = "id_string")]
    pub order_id: i64,
    #[serde(with = "id_string")]
    pub user_id: i64,
    #[serde(with = "id_string")]
    pub store_id: i64,
    pub score: i32,
    pub service_score: i32,
    pub express_score: i32,
    pub content: String,
    pub anonymous: bool,
    pub has_reply: i16,
    pub status: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_at: Option<DateTime<Utc>>,
}

impl From<ReviewSummary> for ReviewSummaryDto {
    fn from(summary: ReviewSummary) -> Self {
        Self {
            review_id: summary.review_id,
            order_id: summary.order_id,
            user_id: summary.user_id,
            store_id: summary.store_id,
            score: summary.score,
            service_score: summary.service_score,
            express_score: summary.express_score,
            content: summary.content,
            anonymous: summary.anonymous,
            has_reply: summary.has_reply,
            status: summary.status.code(),
            create_at: summary.create_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewListResponse {
    pub list: Vec<ReviewSummaryDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppealListResponse {
    pub list: Vec<AppealDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResponse {
    pub result: String,
}
