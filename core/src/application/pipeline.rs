// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Asynchronous moderation and indexing pipeline.
//!
//! Triggered after every successful review write. Each trigger is a
//! detached task on a fresh context: completion of the originating request
//! cannot abort moderation or indexing. Within one task the AI audit
//! precedes the index upsert; tasks for the same review may interleave and
//! are linearized by the store's `version` guard. Failures are logged and
//! dropped — no retry, no dead-letter queue.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::audit::AiAuditor;
use crate::domain::review::Review;
use crate::domain::search::SearchGateway;

/// Index mirroring review records, document id = review_id as string.
pub const REVIEW_INDEX: &str = "review";

pub struct ModerationPipeline {
    auditor: Arc<AiAuditor>,
    search: Arc<dyn SearchGateway>,
}

impl ModerationPipeline {
    pub fn new(auditor: Arc<AiAuditor>, search: Arc<dyn SearchGateway>) -> Self {
        Self { auditor, search }
    }

    /// Launch the follow-up task for a just-written review. The handle is
    /// returned for tests; production callers drop it.
    pub fn dispatch(&self, review: Review) -> JoinHandle<()> {
        let auditor = Arc::clone(&self.auditor);
        let search = Arc::clone(&self.search);
        tokio::spawn(async move {
            Self::run(auditor, search, review).await;
        })
    }

    async fn run(auditor: Arc<AiAuditor>, search: Arc<dyn SearchGateway>, review: Review) {
        let review_id = review.review_id;

        // Step 1: AI audit. On failure the pre-audit record is still
        // indexed so the review stays searchable.
        let record = match auditor.audit(review_id).await {
            Ok(updated) => {
                info!(review_id, "async AI audit finished");
                updated
            }
            Err(err) => {
                error!(review_id, %err, "async AI audit failed, indexing pre-audit record");
                review
            }
        };

        // Step 2: mirror the record into the search index.
        let document = match serde_json::to_value(&record) {
            Ok(document) => document,
            Err(err) => {
                error!(review_id, %err, "failed to serialize review for indexing");
                return;
            }
        };
        match search
            .upsert(REVIEW_INDEX, &review_id.to_string(), &document)
            .await
        {
            Ok(()) => info!(review_id, "review indexed"),
            Err(err) => error!(review_id, %err, "review index upsert failed"),
        }
    }
}
