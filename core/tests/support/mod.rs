// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Shared in-memory fakes for the integration tests: a store that honors
//! the optimistic version guard and the two transactional flows, a
//! counting search gateway, a plain map cache, a scripted LLM and a
//! switchable moderator.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use critiq_core::application::{
    AgentService, AiAuditor, ListingService, ModerationPipeline, ReviewService,
};
use critiq_core::application::review_service::NewReview;
use critiq_core::domain::cache::{CacheError, CacheGateway};
use critiq_core::domain::llm::{LlmError, LlmProvider};
use critiq_core::domain::moderation::{ModerationError, Moderator, Verdict};
use critiq_core::domain::principal::{Principal, Role};
use critiq_core::domain::repository::{
    AppealDecideOutcome, OperatorAction, ReplySaveOutcome, ReviewStore, StoreError,
};
use critiq_core::domain::review::{
    Appeal, AppealDecision, AppealPatch, AppealStatus, Reply, Review, ReviewPatch,
};
use critiq_core::infrastructure::SnowflakeGenerator;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryStore {
    reviews: Mutex<HashMap<i64, Review>>,
    replies: Mutex<HashMap<i64, Reply>>,
    appeals: Mutex<HashMap<i64, Appeal>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn review(&self, review_id: i64) -> Option<Review> {
        self.reviews.lock().unwrap().get(&review_id).cloned()
    }

    pub fn appeal(&self, appeal_id: i64) -> Option<Appeal> {
        self.appeals.lock().unwrap().get(&appeal_id).cloned()
    }

    pub fn reply_for(&self, review_id: i64) -> Option<Reply> {
        self.replies.lock().unwrap().get(&review_id).cloned()
    }

    pub fn reply_count(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn create_review(&self, review: &Review) -> Result<(), StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        if reviews.contains_key(&review.review_id) {
            return Err(StoreError::Database("duplicate review id".into()));
        }
        reviews.insert(review.review_id, review.clone());
        Ok(())
    }

    async fn get_review(&self, review_id: i64) -> Result<Option<Review>, StoreError> {
        let reviews = self.reviews.lock().unwrap();
        Ok(reviews
            .get(&review_id)
            .filter(|r| r.delete_at.is_none())
            .cloned())
    }

    async fn find_reviews_by_order(&self, order_id: i64) -> Result<Vec<Review>, StoreError> {
        let reviews = self.reviews.lock().unwrap();
        let mut found: Vec<Review> = reviews
            .values()
            .filter(|r| r.order_id == order_id && r.delete_at.is_none())
            .cloned()
            .collect();
        found.sort_by_key(|r| r.create_at);
        Ok(found)
    }

    async fn update_review(
        &self,
        review_id: i64,
        expected_version: i64,
        patch: ReviewPatch,
    ) -> Result<(), StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews
            .get_mut(&review_id)
            .filter(|r| r.delete_at.is_none())
            .ok_or(StoreError::NotFound)?;
        if review.version != expected_version {
            return Err(StoreError::Conflict);
        }
        patch.apply_to(review);
        Ok(())
    }

    async fn get_reply(&self, review_id: i64) -> Result<Option<Reply>, StoreError> {
        Ok(self.replies.lock().unwrap().get(&review_id).cloned())
    }

    async fn save_reply(&self, reply: Reply) -> Result<ReplySaveOutcome, StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        let Some(review) = reviews
            .get_mut(&reply.review_id)
            .filter(|r| r.delete_at.is_none())
        else {
            return Ok(ReplySaveOutcome::ReviewMissing);
        };
        if review.has_reply == 1 {
            return Ok(ReplySaveOutcome::AlreadyReplied);
        }
        if review.store_id != reply.store_id {
            return Ok(ReplySaveOutcome::StoreMismatch);
        }

        review.has_reply = 1;
        review.version += 1;
        self.replies
            .lock()
            .unwrap()
            .insert(reply.review_id, reply.clone());
        Ok(ReplySaveOutcome::Saved(reply))
    }

    async fn find_appeals_by_review(&self, review_id: i64) -> Result<Vec<Appeal>, StoreError> {
        let appeals = self.appeals.lock().unwrap();
        let mut found: Vec<Appeal> = appeals
            .values()
            .filter(|a| a.review_id == review_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.create_at);
        Ok(found)
    }

    async fn get_appeal(&self, appeal_id: i64) -> Result<Option<Appeal>, StoreError> {
        Ok(self.appeals.lock().unwrap().get(&appeal_id).cloned())
    }

    async fn create_appeal(&self, appeal: &Appeal) -> Result<(), StoreError> {
        self.appeals
            .lock()
            .unwrap()
            .insert(appeal.appeal_id, appeal.clone());
        Ok(())
    }

    async fn update_appeal(&self, appeal_id: i64, patch: AppealPatch) -> Result<(), StoreError> {
        let mut appeals = self.appeals.lock().unwrap();
        let appeal = appeals.get_mut(&appeal_id).ok_or(StoreError::NotFound)?;
        patch.apply_to(appeal);
        Ok(())
    }

    async fn decide_appeal(
        &self,
        appeal_id: i64,
        decision: AppealDecision,
        operator: OperatorAction,
    ) -> Result<AppealDecideOutcome, StoreError> {
        let mut appeals = self.appeals.lock().unwrap();
        let Some(appeal) = appeals.get_mut(&appeal_id) else {
            return Ok(AppealDecideOutcome::AppealMissing);
        };
        if appeal.status.is_terminal() {
            return Ok(AppealDecideOutcome::NotPending);
        }

        appeal.status = decision.appeal_status();
        appeal.op_user = operator.op_user.clone();
        appeal.reason = operator.op_reason.clone();
        appeal.op_remarks = operator.op_remarks.clone();
        appeal.update_by = operator.op_user.clone();

        // Coupled review transition, atomically with the appeal update.
        let mut reviews = self.reviews.lock().unwrap();
        if let Some(review) = reviews
            .get_mut(&appeal.review_id)
            .filter(|r| r.delete_at.is_none())
        {
            review.status = decision.review_status();
            review.update_by = operator.op_user;
            review.version += 1;
        }

        Ok(AppealDecideOutcome::Decided(appeal.clone()))
    }

    async fn list_appeals_by_status(
        &self,
        status: AppealStatus,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Appeal>, StoreError> {
        let appeals = self.appeals.lock().unwrap();
        let mut found: Vec<Appeal> = appeals
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.create_at);
        Ok(found
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

pub struct CountingSearch {
    search_calls: AtomicUsize,
    search_delay: Duration,
    results: Mutex<Vec<Value>>,
    searches: Mutex<Vec<(String, String, String, u32, u32)>>,
    upserts: Mutex<Vec<(String, String, Value)>>,
}

impl CountingSearch {
    pub fn new() -> Self {
        Self {
            search_calls: AtomicUsize::new(0),
            search_delay: Duration::ZERO,
            results: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            search_delay: delay,
            ..Self::new()
        }
    }

    pub fn set_results(&self, results: Vec<Value>) {
        *self.results.lock().unwrap() = results;
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> Vec<(String, String, String, u32, u32)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> Vec<(String, String, Value)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl critiq_core::domain::search::SearchGateway for CountingSearch {
    async fn upsert(
        &self,
        index: &str,
        doc_id: &str,
        document: &Value,
    ) -> Result<(), critiq_core::domain::search::SearchError> {
        self.upserts
            .lock()
            .unwrap()
            .push((index.to_string(), doc_id.to_string(), document.clone()));
        Ok(())
    }

    async fn search_by_term(
        &self,
        index: &str,
        field: &str,
        value: &str,
        from: u32,
        size: u32,
    ) -> Result<critiq_core::domain::search::SearchPage, critiq_core::domain::search::SearchError>
    {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.searches.lock().unwrap().push((
            index.to_string(),
            field.to_string(),
            value.to_string(),
            from,
            size,
        ));
        if !self.search_delay.is_zero() {
            tokio::time::sleep(self.search_delay).await;
        }
        // Honor the paging window like the real index does: `total` counts
        // every match, `hits` is the offset slice.
        let results = self.results.lock().unwrap();
        let total = results.len() as u64;
        let hits: Vec<Value> = results
            .iter()
            .skip(from as usize)
            .take(size as usize)
            .cloned()
            .collect();
        Ok(critiq_core::domain::search::SearchPage { total, hits })
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl CacheGateway for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LLM and moderator
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(LlmError::Provider("scripted failure".into())));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Provider("llm script exhausted".into())))
    }
}

#[derive(Debug, Clone)]
pub enum ModeratorBehavior {
    Approve,
    Reject(String),
    Fail,
}

pub struct FakeModerator {
    behavior: Mutex<ModeratorBehavior>,
}

impl FakeModerator {
    pub fn new(behavior: ModeratorBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
        }
    }

    pub fn set(&self, behavior: ModeratorBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

#[async_trait]
impl Moderator for FakeModerator {
    async fn moderate(&self, _text: &str) -> Result<Verdict, ModerationError> {
        match self.behavior.lock().unwrap().clone() {
            ModeratorBehavior::Approve => Ok(Verdict {
                approved: true,
                reason: "Content approved by AI.".into(),
            }),
            ModeratorBehavior::Reject(reason) => Ok(Verdict {
                approved: false,
                reason,
            }),
            ModeratorBehavior::Fail => Err(ModerationError::Indeterminate("scripted".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub search: Arc<CountingSearch>,
    pub cache: Arc<MemoryCache>,
    pub moderator: Arc<FakeModerator>,
    pub llm: Arc<ScriptedLlm>,
    pub pipeline: Arc<ModerationPipeline>,
    pub reviews: Arc<ReviewService>,
    pub listings: Arc<ListingService>,
    pub agent: Arc<AgentService>,
}

pub fn harness() -> Harness {
    harness_with_search(Arc::new(CountingSearch::new()))
}

pub fn harness_with_search(search: Arc<CountingSearch>) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    // Failing moderation keeps the write path deterministic: the async
    // audit leaves every record pending unless a test opts in.
    let moderator = Arc::new(FakeModerator::new(ModeratorBehavior::Fail));
    let llm = Arc::new(ScriptedLlm::new());

    let ids = Arc::new(SnowflakeGenerator::new(1_577_836_800_000, 1).unwrap());
    let auditor = Arc::new(AiAuditor::new(
        store.clone() as Arc<dyn ReviewStore>,
        moderator.clone() as Arc<dyn Moderator>,
    ));
    let pipeline = Arc::new(ModerationPipeline::new(
        auditor,
        search.clone() as Arc<dyn critiq_core::domain::search::SearchGateway>,
    ));
    let reviews = Arc::new(ReviewService::new(
        store.clone() as Arc<dyn ReviewStore>,
        ids,
        pipeline.clone(),
    ));
    let listings = Arc::new(ListingService::new(
        cache.clone() as Arc<dyn CacheGateway>,
        search.clone() as Arc<dyn critiq_core::domain::search::SearchGateway>,
    ));
    let agent = Arc::new(AgentService::new(
        llm.clone() as Arc<dyn LlmProvider>,
        reviews.clone(),
        listings.clone(),
    ));

    Harness {
        store,
        search,
        cache,
        moderator,
        llm,
        pipeline,
        reviews,
        listings,
        agent,
    }
}

pub fn new_review(order_id: i64, store_id: i64, content: &str) -> NewReview {
    NewReview {
        order_id,
        user_id: 12,
        store_id,
        sku_id: 100,
        spu_id: 200,
        score: 5,
        service_score: 4,
        express_score: 4,
        content: content.to_string(),
        pic_info: String::new(),
        video_info: String::new(),
        anonymous: false,
    }
}

pub fn customer(user_id: i64) -> Principal {
    Principal {
        user_id,
        role: Role::Customer,
        store_id: None,
    }
}

pub fn merchant(user_id: i64, store_id: i64) -> Principal {
    Principal {
        user_id,
        role: Role::Merchant,
        store_id: Some(store_id),
    }
}

pub fn reviewer(user_id: i64) -> Principal {
    Principal {
        user_id,
        role: Role::Reviewer,
        store_id: None,
    }
}
