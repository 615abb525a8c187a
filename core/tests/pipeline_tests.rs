// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Async pipeline: AI audit before indexing, failure tolerance, version
//! linearization.

mod support;

use critiq_core::domain::error::ServiceError;
use critiq_core::domain::review::ReviewStatus;
use support::{harness, new_review, ModeratorBehavior};

#[tokio::test]
async fn audit_precedes_indexing_and_the_index_sees_the_audited_record() {
    let h = harness();
    h.moderator.set(ModeratorBehavior::Approve);

    let review = h.reviews.create_review(new_review(7, 3, "ok")).await.unwrap();
    // The usecase fires the task itself; drive a second one to completion
    // deterministically (the version guard makes the pair idempotent).
    h.pipeline.dispatch(review.clone()).await.unwrap();

    let stored = h.store.review(review.review_id).unwrap();
    assert_eq!(stored.status, ReviewStatus::Approved);
    assert_eq!(stored.update_by, "AI");
    assert_eq!(stored.op_remarks, "AI审核通过");

    // Step 1 happened before step 2: the task we awaited indexed the
    // post-audit record. (The create-triggered task may interleave and
    // index the pending snapshot; the version guard keeps the store
    // consistent either way.)
    let upserts = h.search.upserts();
    assert!(upserts
        .iter()
        .any(|(index, doc_id, document)| index == "review"
            && *doc_id == review.review_id.to_string()
            && document["status"] == 20));
}

#[tokio::test]
async fn rejection_maps_to_status_30_with_the_moderator_reason() {
    let h = harness();
    h.moderator
        .set(ModeratorBehavior::Reject("包含广告和联系方式。".into()));

    let review = h.reviews.create_review(new_review(7, 3, "加我VX")).await.unwrap();
    h.pipeline.dispatch(review.clone()).await.unwrap();

    let stored = h.store.review(review.review_id).unwrap();
    assert_eq!(stored.status, ReviewStatus::Rejected);
    assert_eq!(stored.op_reason, "包含广告和联系方式。");
    assert_eq!(stored.op_remarks, "AI审核不通过");
}

#[tokio::test]
async fn moderation_failure_leaves_the_review_pending_but_still_indexes() {
    let h = harness();
    // Default harness moderator fails every verdict.

    let review = h.reviews.create_review(new_review(7, 3, "ok")).await.unwrap();
    h.pipeline.dispatch(review.clone()).await.unwrap();

    let stored = h.store.review(review.review_id).unwrap();
    assert_eq!(stored.status, ReviewStatus::Pending);

    // The pre-audit record was indexed so the review stays searchable.
    let upserts = h.search.upserts();
    assert!(!upserts.is_empty());
    let (_, _, document) = upserts.last().unwrap().clone();
    assert_eq!(document["status"], 10);
}

#[tokio::test]
async fn auditing_a_non_pending_review_is_an_invalid_transition() {
    let h = harness();
    h.moderator.set(ModeratorBehavior::Approve);

    let review = h.reviews.create_review(new_review(7, 3, "ok")).await.unwrap();
    h.pipeline.dispatch(review.clone()).await.unwrap();
    assert_eq!(
        h.store.review(review.review_id).unwrap().status,
        ReviewStatus::Approved
    );

    // A second audit attempt hits the status precondition; the approved
    // content is never re-moderated.
    let harness_auditor = critiq_core::application::AiAuditor::new(
        h.store.clone(),
        h.moderator.clone(),
    );
    let result = harness_auditor.audit(review.review_id).await;
    assert!(matches!(result, Err(ServiceError::InvalidTransition(_))));
}
