// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Review aggregate and its two satellite records.
//!
//! A review is a customer evaluation tied to exactly one order. A reply is
//! the single merchant response attached to a review; an appeal is a
//! merchant request to reconsider an approved review. Status codes are
//! numeric on the wire and in storage; the enums here own the transition
//! rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review lifecycle states.
///
/// Legal transitions: `Pending → Approved`, `Pending → Rejected`,
/// `Approved → Hidden` (appeal upheld), `Approved → Rejected` (appeal
/// rejected). `Rejected → Approved` is forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ReviewStatus {
    /// Awaiting moderation (10).
    Pending,
    /// Published (20).
    Approved,
    /// Rejected by moderation or an appeal decision (30).
    Rejected,
    /// Hidden after an upheld appeal (40).
    Hidden,
}

impl ReviewStatus {
    pub fn code(self) -> i16 {
        match self {
            Self::Pending => 10,
            Self::Approved => 20,
            Self::Rejected => 30,
            Self::Hidden => 40,
        }
    }

    /// Whether moving from `self` to `to` is a legal lifecycle step.
    pub fn can_transition(self, to: ReviewStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Hidden)
                | (Self::Approved, Self::Rejected)
        )
    }
}

impl TryFrom<i16> for ReviewStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            10 => Ok(Self::Pending),
            20 => Ok(Self::Approved),
            30 => Ok(Self::Rejected),
            40 => Ok(Self::Hidden),
            other => Err(format!("unknown review status code: {other}")),
        }
    }
}

impl From<ReviewStatus> for i16 {
    fn from(status: ReviewStatus) -> i16 {
        status.code()
    }
}

/// Appeal lifecycle states. `Upheld` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum AppealStatus {
    /// Awaiting an operator decision (10).
    Pending,
    /// Upheld — the coupled review is hidden (20).
    Upheld,
    /// Rejected — the coupled review is rejected (30).
    Rejected,
}

impl AppealStatus {
    pub fn code(self) -> i16 {
        match self {
            Self::Pending => 10,
            Self::Upheld => 20,
            Self::Rejected => 30,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<i16> for AppealStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            10 => Ok(Self::Pending),
            20 => Ok(Self::Upheld),
            30 => Ok(Self::Rejected),
            other => Err(format!("unknown appeal status code: {other}")),
        }
    }
}

impl From<AppealStatus> for i16 {
    fn from(status: AppealStatus) -> i16 {
        status.code()
    }
}

/// Terminal appeal decision an operator may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppealDecision {
    /// Code 20: appeal upheld, review becomes hidden.
    Uphold,
    /// Code 30: appeal rejected, review becomes rejected.
    Reject,
}

impl AppealDecision {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            20 => Some(Self::Uphold),
            30 => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn appeal_status(self) -> AppealStatus {
        match self {
            Self::Uphold => AppealStatus::Upheld,
            Self::Reject => AppealStatus::Rejected,
        }
    }

    /// The review status forced by this decision.
    pub fn review_status(self) -> ReviewStatus {
        match self {
            Self::Uphold => ReviewStatus::Hidden,
            Self::Reject => ReviewStatus::Rejected,
        }
    }
}

/// One logical review per order. The search index mirrors this record
/// verbatim, so every field keeps its snake_case name in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub review_id: i64,
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
    pub has_media: bool,
    /// 0 or 1; monotonic, never reverts once set.
    pub has_reply: i16,
    pub status: ReviewStatus,
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
    /// Optimistic guard; strictly increases on every mutation.
    pub version: i64,
    pub create_by: String,
    pub update_by: String,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
    /// Soft-delete tombstone; queries filter non-null rows out.
    pub delete_at: Option<DateTime<Utc>>,
}

/// Partial update for a review. `None` fields are left untouched; the
/// store bumps `version` and `update_at` on every application.
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub content: Option<String>,
    pub score: Option<i32>,
    pub service_score: Option<i32>,
    pub express_score: Option<i32>,
    pub pic_info: Option<String>,
    pub video_info: Option<String>,
    pub has_media: Option<bool>,
    pub has_reply: Option<i16>,
    pub status: Option<ReviewStatus>,
    pub op_user: Option<String>,
    pub op_reason: Option<String>,
    pub op_remarks: Option<String>,
    pub update_by: Option<String>,
}

impl ReviewPatch {
    /// Apply in memory. Storage backends mirror this in SQL; in-memory
    /// stores use it directly.
    pub fn apply_to(&self, review: &mut Review) {
        if let Some(v) = &self.content {
            review.content = v.clone();
        }
        if let Some(v) = self.score {
            review.score = v;
        }
        if let Some(v) = self.service_score {
            review.service_score = v;
        }
        if let Some(v) = self.express_score {
            review.express_score = v;
        }
        if let Some(v) = &self.pic_info {
            review.pic_info = v.clone();
        }
        if let Some(v) = &self.video_info {
            review.video_info = v.clone();
        }
        if let Some(v) = self.has_media {
            review.has_media = v;
        }
        if let Some(v) = self.has_reply {
            review.has_reply = v;
        }
        if let Some(v) = self.status {
            review.status = v;
        }
        if let Some(v) = &self.op_user {
            review.op_user = v.clone();
        }
        if let Some(v) = &self.op_reason {
            review.op_reason = v.clone();
        }
        if let Some(v) = &self.op_remarks {
            review.op_remarks = v.clone();
        }
        if let Some(v) = &self.update_by {
            review.update_by = v.clone();
        }
        review.version += 1;
        review.update_at = Utc::now();
    }
}

/// The single merchant response attached to a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub reply_id: i64,
    pub review_id: i64,
    pub store_id: i64,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

/// A merchant request to reconsider an approved review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appeal {
    pub appeal_id: i64,
    pub review_id: i64,
    pub store_id: i64,
    pub status: AppealStatus,
    pub reason: String,
    pub content: String,
    pub pic_info: String,
    pub video_info: String,
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
    pub update_by: String,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

/// In-place update of a pending appeal (re-submission by the merchant).
#[derive(Debug, Clone, Default)]
pub struct AppealPatch {
    pub reason: Option<String>,
    pub content: Option<String>,
    pub pic_info: Option<String>,
    pub video_info: Option<String>,
}

impl AppealPatch {
    pub fn apply_to(&self, appeal: &mut Appeal) {
        if let Some(v) = &self.reason {
            appeal.reason = v.clone();
        }
        if let Some(v) = &self.content {
            appeal.content = v.clone();
        }
        if let Some(v) = &self.pic_info {
            appeal.pic_info = v.clone();
        }
        if let Some(v) = &self.video_info {
            appeal.video_info = v.clone();
        }
        appeal.update_at = Utc::now();
    }
}

/// Compact listing row decoded from search-index hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    #[serde(default)]
    pub review_id: i64,
    #[serde(default)]
    pub order_id: i64,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub store_id: i64,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub service_score: i32,
    #[serde(default)]
    pub express_score: i32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub has_reply: i16,
    pub status: ReviewStatus,
    #[serde(default)]
    pub create_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_transitions_follow_the_state_machine() {
        use ReviewStatus::*;
        assert!(Pending.can_transition(Approved));
        assert!(Pending.can_transition(Rejected));
        assert!(Approved.can_transition(Hidden));
        assert!(Approved.can_transition(Rejected));

        assert!(!Rejected.can_transition(Approved));
        assert!(!Pending.can_transition(Hidden));
        assert!(!Hidden.can_transition(Approved));
        assert!(!Approved.can_transition(Pending));
    }

    #[test]
    fn status_codes_round_trip() {
        for code in [10i16, 20, 30, 40] {
            let status = ReviewStatus::try_from(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(ReviewStatus::try_from(15).is_err());

        for code in [10i16, 20, 30] {
            let status = AppealStatus::try_from(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(AppealStatus::try_from(40).is_err());
    }

    #[test]
    fn appeal_decision_forces_coupled_review_status() {
        let uphold = AppealDecision::from_code(20).unwrap();
        assert_eq!(uphold.review_status(), ReviewStatus::Hidden);

        let reject = AppealDecision::from_code(30).unwrap();
        assert_eq!(reject.review_status(), ReviewStatus::Rejected);

        assert!(AppealDecision::from_code(10).is_none());
        assert!(AppealDecision::from_code(0).is_none());
    }

    #[test]
    fn patch_bumps_version_on_every_application() {
        let mut review = Review {
            review_id: 1,
            order_id: 1,
            user_id: 1,
            store_id: 1,
            sku_id: 0,
            spu_id: 0,
            score: 5,
            service_score: 5,
            express_score: 5,
            content: "ok".into(),
            pic_info: String::new(),
            video_info: String::new(),
            anonymous: false,
            has_media: false,
            has_reply: 0,
            status: ReviewStatus::Pending,
            op_user: String::new(),
            op_reason: String::new(),
            op_remarks: String::new(),
            version: 0,
            create_by: "system".into(),
            update_by: "system".into(),
            create_at: Utc::now(),
            update_at: Utc::now(),
            delete_at: None,
        };

        ReviewPatch {
            status: Some(ReviewStatus::Approved),
            ..Default::default()
        }
        .apply_to(&mut review);
        assert_eq!(review.version, 1);

        ReviewPatch::default().apply_to(&mut review);
        assert_eq!(review.version, 2);
    }
}
