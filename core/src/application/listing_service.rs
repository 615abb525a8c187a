// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cached paged reads over the search index.
//!
//! Read path: key → singleflight → cache → index → cache. The cache key
//! carries only the id and the page window, so concurrent identical reads
//! collapse onto one backend call process-wide. Reads are eventually
//! consistent: a just-written review stays invisible until the async
//! pipeline has indexed it, and an empty page may be cached for up to the
//! TTL.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::cache::CacheGateway;
use crate::domain::error::ServiceError;
use crate::domain::review::ReviewSummary;
use crate::domain::search::{SearchGateway, SearchPage};
use crate::infrastructure::singleflight::Singleflight;

const CACHE_TTL: Duration = Duration::from_secs(60);

/// Which review attribute a listing filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Store,
    User,
    Status,
}

impl ListTarget {
    fn field(self) -> &'static str {
        match self {
            ListTarget::Store => "store_id",
            ListTarget::User => "user_id",
            ListTarget::Status => "status",
        }
    }
}

impl std::str::FromStr for ListTarget {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" => Ok(ListTarget::Store),
            "user" => Ok(ListTarget::User),
            "status" => Ok(ListTarget::Status),
            other => Err(ServiceError::InvalidTarget(other.to_string())),
        }
    }
}

pub struct ListingService {
    cache: Arc<dyn CacheGateway>,
    search: Arc<dyn SearchGateway>,
    flights: Singleflight<Result<Vec<u8>, ServiceError>>,
}

impl ListingService {
    pub fn new(cache: Arc<dyn CacheGateway>, search: Arc<dyn SearchGateway>) -> Self {
        Self {
            cache,
            search,
            flights: Singleflight::new(),
        }
    }

    pub async fn list_by(
        &self,
        target: ListTarget,
        id: i64,
        page_from: u32,
        page_size: u32,
    ) -> Result<Vec<ReviewSummary>, ServiceError> {
        let key = format!("review:{id}:{page_from}:{page_size}");

        let cache = Arc::clone(&self.cache);
        let search = Arc::clone(&self.search);
        let flight_key = key.clone();
        let bytes = self
            .flights
            .run(&key, move || async move {
                Self::fetch(cache, search, target, flight_key).await
            })
            .await?;

        let page: SearchPage = serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::IndexFailed(format!("failed to decode page: {e}")))?;

        let mut list = Vec::with_capacity(page.hits.len());
        for hit in page.hits {
            match serde_json::from_value::<ReviewSummary>(hit) {
                Ok(summary) => list.push(summary),
                Err(err) => warn!(%err, "skipping undecodable search hit"),
            }
        }
        Ok(list)
    }

    /// The flight body: cache, then index, then best-effort cache fill.
    async fn fetch(
        cache: Arc<dyn CacheGateway>,
        search: Arc<dyn SearchGateway>,
        target: ListTarget,
        key: String,
    ) -> Result<Vec<u8>, ServiceError> {
        match cache.get(&key).await {
            Ok(Some(bytes)) => {
                debug!(%key, "listing served from cache");
                return Ok(bytes);
            }
            Ok(None) => {}
            // The cache is an accelerator: read failures degrade to the
            // index instead of surfacing.
            Err(err) => warn!(%key, %err, "cache read failed, falling through to index"),
        }

        let (index, id, from, size) = parse_key(&key)?;
        let page = search
            .search_by_term(&index, target.field(), &id, from, size)
            .await?;

        let bytes = serde_json::to_vec(&page)
            .map_err(|e| ServiceError::Internal(format!("failed to encode page: {e}")))?;

        if let Err(err) = cache.set(&key, &bytes, CACHE_TTL).await {
            warn!(%key, %err, "cache write failed");
        }
        Ok(bytes)
    }
}

/// Recover `(index, id, from, size)` from a `review:<id>:<from>:<size>` key.
fn parse_key(key: &str) -> Result<(String, String, u32, u32), ServiceError> {
    let parts: Vec<&str> = key.split(':').collect();
    if parts.len() < 4 {
        return Err(ServiceError::InvalidArguments(format!(
            "listing key format error: {key}"
        )));
    }
    let from: u32 = parts[2]
        .parse()
        .map_err(|_| ServiceError::InvalidArguments(format!("bad page offset in key {key}")))?;
    let size: u32 = parts[3]
        .parse()
        .map_err(|_| ServiceError::InvalidArguments(format!("bad page size in key {key}")))?;
    Ok((parts[0].to_string(), parts[1].to_string(), from, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        let (index, id, from, size) = parse_key("review:42:1:10").unwrap();
        assert_eq!(index, "review");
        assert_eq!(id, "42");
        assert_eq!(from, 1);
        assert_eq!(size, 10);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(parse_key("review:42:1").is_err());
        assert!(parse_key("review:42:x:10").is_err());
        assert!(parse_key("").is_err());
    }

    #[test]
    fn targets_map_to_index_fields() {
        assert_eq!(ListTarget::Store.field(), "store_id");
        assert_eq!(ListTarget::User.field(), "user_id");
        assert_eq!(ListTarget::Status.field(), "status");
    }

    #[test]
    fn unknown_targets_are_invalid() {
        assert_eq!("store".parse::<ListTarget>().unwrap(), ListTarget::Store);
        assert_eq!("user".parse::<ListTarget>().unwrap(), ListTarget::User);
        assert_eq!("status".parse::<ListTarget>().unwrap(), ListTarget::Status);
        assert!(matches!(
            "orders".parse::<ListTarget>(),
            Err(ServiceError::InvalidTarget(_))
        ));
    }
}
