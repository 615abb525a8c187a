// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! PostgreSQL `ReviewStore` implementation.
//!
//! Backed by the `review_info`, `review_reply_info` and
//! `review_appeal_info` tables via `sqlx`. Every non-composite method is a
//! single statement; the two composite flows (`save_reply`,
//! `decide_appeal`) run inside a scoped `Transaction` that commits only on
//! the success path and rolls back on drop otherwise. Updates guard on the
//! `version` column and bump it in the same statement; soft-deleted rows
//! (`delete_at IS NOT NULL`) are filtered everywhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::repository::{
    AppealDecideOutcome, OperatorAction, ReplySaveOutcome, ReviewStore, StoreError,
};
use crate::domain::review::{
    Appeal, AppealDecision, AppealPatch, AppealStatus, Reply, Review, ReviewPatch, ReviewStatus,
};

pub struct PostgresReviewStore {
    pool: PgPool,
}

impl PostgresReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PostgresReviewStore {
    async fn create_review(&self, review: &Review) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO review_info (
                review_id, order_id, user_id, store_id, sku_id, spu_id,
                score, service_score, express_score, content, pic_info,
                video_info, anonymous, has_media, has_reply, status,
                op_user, op_reason, op_remarks, version, create_by,
                update_by, create_at, update_at, delete_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22,
                    $23, $24, $25)
            "#,
        )
        .bind(review.review_id)
        .bind(review.order_id)
        .bind(review.user_id)
        .bind(review.store_id)
        .bind(review.sku_id)
        .bind(review.spu_id)
        .bind(review.score)
        .bind(review.service_score)
        .bind(review.express_score)
        .bind(&review.content)
        .bind(&review.pic_info)
        .bind(&review.video_info)
        .bind(review.anonymous)
        .bind(review.has_media)
        .bind(review.has_reply)
        .bind(review.status.code())
        .bind(&review.op_user)
        .bind(&review.op_reason)
        .bind(&review.op_remarks)
        .bind(review.version)
        .bind(&review.create_by)
        .bind(&review.update_by)
        .bind(review.create_at)
        .bind(review.update_at)
        .bind(review.delete_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_review(&self, review_id: i64) -> Result<Option<Review>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM review_info WHERE review_id = $1 AND delete_at IS NULL",
        )
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| review_from_row(&r)).transpose()
    }

    async fn find_reviews_by_order(&self, order_id: i64) -> Result<Vec<Review>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM review_info WHERE order_id = $1 AND delete_at IS NULL ORDER BY create_at ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(review_from_row).collect()
    }

    async fn update_review(
        &self,
        review_id: i64,
        expected_version: i64,
        patch: ReviewPatch,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE review_info SET
                content = COALESCE($3, content),
                score = COALESCE($4, score),
                service_score = COALESCE($5, service_score),
                express_score = COALESCE($6, express_score),
                pic_info = COALESCE($7, pic_info),
                video_info = COALESCE($8, video_info),
                has_media = COALESCE($9, has_media),
                has_reply = COALESCE($10, has_reply),
                status = COALESCE($11, status),
                op_user = COALESCE($12, op_user),
                op_reason = COALESCE($13, op_reason),
                op_remarks = COALESCE($14, op_remarks),
                update_by = COALESCE($15, update_by),
                version = version + 1,
                update_at = NOW()
            WHERE review_id = $1 AND version = $2 AND delete_at IS NULL
            "#,
        )
        .bind(review_id)
        .bind(expected_version)
        .bind(patch.content)
        .bind(patch.score)
        .bind(patch.service_score)
        .bind(patch.express_score)
        .bind(patch.pic_info)
        .bind(patch.video_info)
        .bind(patch.has_media)
        .bind(patch.has_reply)
        .bind(patch.status.map(ReviewStatus::code))
        .bind(patch.op_user)
        .bind(patch.op_reason)
        .bind(patch.op_remarks)
        .bind(patch.update_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Distinguish a vanished row from a lost optimistic race.
        let exists = sqlx::query(
            "SELECT 1 FROM review_info WHERE review_id = $1 AND delete_at IS NULL",
        )
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;

        match exists {
            Some(_) => Err(StoreError::Conflict),
            None => Err(StoreError::NotFound),
        }
    }

    async fn get_reply(&self, review_id: i64) -> Result<Option<Reply>, StoreError> {
        let row = sqlx::query("SELECT * FROM review_reply_info WHERE review_id = $1")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| reply_from_row(&r)))
    }

    async fn save_reply(&self, reply: Reply) -> Result<ReplySaveOutcome, StoreError> {
        // Precondition checks and both writes share one transaction; any
        // early return drops the transaction, which rolls it back.
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query(
            r#"
            SELECT store_id, has_reply FROM review_info
            WHERE review_id = $1 AND delete_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(reply.review_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(review) = review else {
            return Ok(ReplySaveOutcome::ReviewMissing);
        };
        if review.get::<i16, _>("has_reply") == 1 {
            return Ok(ReplySaveOutcome::AlreadyReplied);
        }
        if review.get::<i64, _>("store_id") != reply.store_id {
            return Ok(ReplySaveOutcome::StoreMismatch);
        }

        sqlx::query(
            r#"
            UPDATE review_info
            SET has_reply = 1, version = version + 1, update_at = NOW()
            WHERE review_id = $1
            "#,
        )
        .bind(reply.review_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO review_reply_info (
                reply_id, review_id, store_id, content, pic_info,
                video_info, create_at, update_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reply.reply_id)
        .bind(reply.review_id)
        .bind(reply.store_id)
        .bind(&reply.content)
        .bind(&reply.pic_info)
        .bind(&reply.video_info)
        .bind(reply.create_at)
        .bind(reply.update_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReplySaveOutcome::Saved(reply))
    }

    async fn find_appeals_by_review(&self, review_id: i64) -> Result<Vec<Appeal>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM review_appeal_info WHERE review_id = $1 ORDER BY create_at ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(appeal_from_row).collect()
    }

    async fn get_appeal(&self, appeal_id: i64) -> Result<Option<Appeal>, StoreError> {
        let row = sqlx::query("SELECT * FROM review_appeal_info WHERE appeal_id = $1")
            .bind(appeal_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| appeal_from_row(&r)).transpose()
    }

    async fn create_appeal(&self, appeal: &Appeal) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO review_appeal_info (
                appeal_id, review_id, store_id, status, reason, content,
                pic_info, video_info, op_user, op_reason, op_remarks,
                update_by, create_at, update_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(appeal.appeal_id)
        .bind(appeal.review_id)
        .bind(appeal.store_id)
        .bind(appeal.status.code())
        .bind(&appeal.reason)
        .bind(&appeal.content)
        .bind(&appeal.pic_info)
        .bind(&appeal.video_info)
        .bind(&appeal.op_user)
        .bind(&appeal.op_reason)
        .bind(&appeal.op_remarks)
        .bind(&appeal.update_by)
        .bind(appeal.create_at)
        .bind(appeal.update_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_appeal(&self, appeal_id: i64, patch: AppealPatch) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE review_appeal_info SET
                reason = COALESCE($2, reason),
                content = COALESCE($3, content),
                pic_info = COALESCE($4, pic_info),
                video_info = COALESCE($5, video_info),
                update_at = NOW()
            WHERE appeal_id = $1
            "#,
        )
        .bind(appeal_id)
        .bind(patch.reason)
        .bind(patch.content)
        .bind(patch.pic_info)
        .bind(patch.video_info)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn decide_appeal(
        &self,
        appeal_id: i64,
        decision: AppealDecision,
        operator: OperatorAction,
    ) -> Result<AppealDecideOutcome, StoreError> {
        // The appeal terminalization and the coupled review transition
        // must become visible together.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM review_appeal_info WHERE appeal_id = $1 FOR UPDATE")
            .bind(appeal_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(AppealDecideOutcome::AppealMissing);
        };
        let appeal = appeal_from_row(&row)?;
        if appeal.status.is_terminal() {
            return Ok(AppealDecideOutcome::NotPending);
        }

        sqlx::query(
            r#"
            UPDATE review_appeal_info SET
                status = $2, op_user = $3, reason = $4,
                op_remarks = $5, update_by = $3, update_at = NOW()
            WHERE appeal_id = $1
            "#,
        )
        .bind(appeal_id)
        .bind(decision.appeal_status().code())
        .bind(&operator.op_user)
        .bind(&operator.op_reason)
        .bind(&operator.op_remarks)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE review_info SET
                status = $2, update_by = $3,
                version = version + 1, update_at = NOW()
            WHERE review_id = $1 AND delete_at IS NULL
            "#,
        )
        .bind(appeal.review_id)
        .bind(decision.review_status().code())
        .bind(&operator.op_user)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query("SELECT * FROM review_appeal_info WHERE appeal_id = $1")
            .bind(appeal_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(AppealDecideOutcome::Decided(appeal_from_row(&updated)?))
    }

    async fn list_appeals_by_status(
        &self,
        status: AppealStatus,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Appeal>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM review_appeal_info
            WHERE status = $1
            ORDER BY create_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(status.code())
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(appeal_from_row).collect()
    }
}

fn review_from_row(row: &PgRow) -> Result<Review, StoreError> {
    let status = ReviewStatus::try_from(row.get::<i16, _>("status"))
        .map_err(StoreError::Database)?;

    Ok(Review {
        review_id: row.get("review_id"),
        order_id: row.get("order_id"),
        user_id: row.get("user_id"),
        store_id: row.get("store_id"),
        sku_id: row.get("sku_id"),
        spu_id: row.get("spu_id"),
        score: row.get("score"),
        service_score: row.get("service_score"),
        express_score: row.get("express_score"),
        content: row.get("content"),
        pic_info: row.get("pic_info"),
        video_info: row.get("video_info"),
        anonymous: row.get("anonymous"),
        has_media: row.get("has_media"),
        has_reply: row.get("has_reply"),
        status,
        op_user: row.get("op_user"),
        op_reason: row.get("op_reason"),
        op_remarks: row.get("op_remarks"),
        version: row.get("version"),
        create_by: row.get("create_by"),
        update_by: row.get("update_by"),
        create_at: row.get::<DateTime<Utc>, _>("create_at"),
        update_at: row.get::<DateTime<Utc>, _>("update_at"),
        delete_at: row.get::<Option<DateTime<Utc>>, _>("delete_at"),
    })
}

fn reply_from_row(row: &PgRow) -> Reply {
    Reply {
        reply_id: row.get("reply_id"),
        review_id: row.get("review_id"),
        store_id: row.get("store_id"),
        content: row.get("content"),
        pic_info: row.get("pic_info"),
        video_info: row.get("video_info"),
        create_at: row.get::<DateTime<Utc>, _>("create_at"),
        update_at: row.get::<DateTime<Utc>, _>("update_at"),
    }
}

fn appeal_from_row(row: &PgRow) -> Result<Appeal, StoreError> {
    let status = AppealStatus::try_from(row.get::<i16, _>("status"))
        .map_err(StoreError::Database)?;

    Ok(Appeal {
        appeal_id: row.get("appeal_id"),
        review_id: row.get("review_id"),
        store_id: row.get("store_id"),
        status,
        reason: row.get("reason"),
        content: row.get("content"),
        pic_info: row.get("pic_info"),
        video_info: row.get("video_info"),
        op_user: row.get("op_user"),
        op_reason: row.get("op_reason"),
        op_remarks: row.get("op_remarks"),
        update_by: row.get("update_by"),
        create_at: row.get::<DateTime<Utc>, _>("create_at"),
        update_at: row.get::<DateTime<Utc>, _>("update_at"),
    })
}
