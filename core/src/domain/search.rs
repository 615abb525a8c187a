// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Search gateway.
//!
//! Documents in the index are derived from primary records by the async
//! pipeline; they are eventually consistent with the store and may lag a
//! write by the pipeline delay.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("search backend unreachable: {0}")]
    Network(String),

    #[error("search backend returned HTTP {0}: {1}")]
    Status(u16, String),

    #[error("failed to decode search response: {0}")]
    Decode(String),
}

/// One page of hits; `hits` are raw `_source` documents. This struct is
/// also the byte format the paged-read service caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub total: u64,
    pub hits: Vec<Value>,
}

#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Insert or replace a document under `doc_id`.
    async fn upsert(&self, index: &str, doc_id: &str, document: &Value) -> Result<(), SearchError>;

    /// Exact-term filter over one snake_case field, paged by offset.
    async fn search_by_term(
        &self,
        index: &str,
        field: &str,
        value: &str,
        from: u32,
        size: u32,
    ) -> Result<SearchPage, SearchError>;
}
