// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Elasticsearch adapter for the search gateway.
//!
//! Speaks the document API over plain HTTP: `PUT /{index}/_doc/{id}` for
//! upserts and `POST /{index}/_search` with a bool/filter/term query for
//! paged lookups. Term values are sent as strings; the index coerces them
//! for numeric fields.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::search::{SearchError, SearchGateway, SearchPage};

pub struct ElasticGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct EsSearchResponse {
    hits: EsHits,
}

#[derive(Deserialize)]
struct EsHits {
    total: EsTotal,
    hits: Vec<EsHit>,
}

#[derive(Deserialize)]
struct EsTotal {
    value: u64,
}

#[derive(Deserialize)]
struct EsHit {
    #[serde(rename = "_source")]
    source: Value,
}

impl ElasticGateway {
    /// `addresses` comes from configuration; requests go to the first node.
    pub fn new(addresses: &[String]) -> Self {
        let base_url = addresses
            .first()
            .map(|a| a.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "http://127.0.0.1:9200".to_string());

        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl SearchGateway for ElasticGateway {
    async fn upsert(&self, index: &str, doc_id: &str, document: &Value) -> Result<(), SearchError> {
        let url = format!("{}/{}/_doc/{}", self.base_url, index, doc_id);

        let response = self
            .client
            .put(&url)
            .json(document)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status(status, body));
        }

        Ok(())
    }

    async fn search_by_term(
        &self,
        index: &str,
        field: &str,
        value: &str,
        from: u32,
        size: u32,
    ) -> Result<SearchPage, SearchError> {
        let url = format!("{}/{}/_search", self.base_url, index);
        let query = json!({
            "query": {
                "bool": {
                    "filter": [
                        { "term": { field: { "value": value } } }
                    ]
                }
            },
            "from": from,
            "size": size,
        });

        let response = self
            .client
            .post(&url)
            .json(&query)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status(status, body));
        }

        let parsed: EsSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(SearchPage {
            total: parsed.hits.total.value,
            hits: parsed.hits.hits.into_iter().map(|h| h.source).collect(),
        })
    }
}
