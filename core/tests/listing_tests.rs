// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Read-path scenarios: cache-aside behavior and request coalescing.

mod support;

use std::sync::Arc;
use std::time::Duration;

use critiq_core::application::listing_service::ListTarget;
use critiq_core::presentation::api::AppState;
use critiq_core::presentation::dto::PageQuery;
use critiq_core::presentation::ops;
use serde_json::json;
use support::{harness, harness_with_search, CountingSearch};

fn indexed_review(review_id: i64, store_id: i64, content: &str) -> serde_json::Value {
    json!({
        "review_id": review_id,
        "order_id": 7,
        "user_id": 12,
        "store_id": store_id,
        "score": 5,
        "service_score": 4,
        "express_score": 4,
        "content": content,
        "anonymous": false,
        "has_reply": 0,
        "status": 20,
    })
}

#[tokio::test]
async fn cold_read_goes_to_the_index_and_fills_the_cache() {
    let h = harness();
    h.search
        .set_results(vec![indexed_review(1, 42, "great"), indexed_review(2, 42, "fine")]);

    let list = h
        .listings
        .list_by(ListTarget::Store, 42, 0, 10)
        .await
        .unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].review_id, 1);
    assert_eq!(h.search.search_calls(), 1);

    // The page landed in the cache under the composed key.
    assert!(h.cache.peek("review:42:0:10").is_some());

    // Field selection follows the target, the window passes through.
    let searches = h.search.searches();
    assert_eq!(searches[0].0, "review");
    assert_eq!(searches[0].1, "store_id");
    assert_eq!(searches[0].2, "42");
    assert_eq!(searches[0].3, 0);
    assert_eq!(searches[0].4, 10);
}

#[tokio::test]
async fn warm_read_is_served_from_the_cache() {
    let h = harness();
    h.search.set_results(vec![indexed_review(1, 42, "great")]);

    let first = h
        .listings
        .list_by(ListTarget::Store, 42, 0, 10)
        .await
        .unwrap();
    let second = h
        .listings
        .list_by(ListTarget::Store, 42, 0, 10)
        .await
        .unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(h.search.search_calls(), 1, "second read must not touch the index");
}

#[tokio::test]
async fn user_listings_filter_on_user_id() {
    let h = harness();
    h.search.set_results(vec![indexed_review(1, 42, "mine")]);

    h.listings.list_by(ListTarget::User, 12, 0, 10).await.unwrap();

    let searches = h.search.searches();
    assert_eq!(searches[0].1, "user_id");
    assert_eq!(searches[0].2, "12");
}

#[tokio::test]
async fn undecodable_hits_are_skipped_not_fatal() {
    let h = harness();
    h.search.set_results(vec![
        indexed_review(1, 42, "good"),
        json!({"status": "not-a-code"}),
    ]);

    let list = h
        .listings
        .list_by(ListTarget::Store, 42, 0, 10)
        .await
        .unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].review_id, 1);
}

#[tokio::test]
async fn empty_pages_are_cached_too() {
    let h = harness();
    h.search.set_results(vec![]);

    let list = h
        .listings
        .list_by(ListTarget::Store, 42, 0, 10)
        .await
        .unwrap();

    assert!(list.is_empty());
    // An empty result is a valid page and may hide later writes for a TTL.
    assert!(h.cache.peek("review:42:0:10").is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contended_cold_reads_coalesce_to_one_index_call() {
    let search = Arc::new(CountingSearch::with_delay(Duration::from_millis(100)));
    let h = harness_with_search(search);
    h.search.set_results(vec![indexed_review(1, 42, "great")]);

    let mut handles = Vec::new();
    for _ in 0..100 {
        let listings = Arc::clone(&h.listings);
        handles.push(tokio::spawn(async move {
            listings.list_by(ListTarget::Store, 42, 0, 10).await
        }));
    }

    let mut lengths = Vec::new();
    for handle in handles {
        let list = handle.await.unwrap().unwrap();
        lengths.push(list.len());
    }

    // All hundred callers observed the identical page...
    assert!(lengths.iter().all(|&len| len == 1));
    // ...and the index saw exactly one query.
    assert_eq!(h.search.search_calls(), 1);
}

#[tokio::test]
async fn pages_translate_to_zero_based_offsets() {
    let h = harness();
    h.search.set_results(vec![
        indexed_review(1, 42, "newest"),
        indexed_review(2, 42, "older"),
    ]);
    let state = AppState {
        reviews: Arc::clone(&h.reviews),
        listings: Arc::clone(&h.listings),
        agent: Arc::clone(&h.agent),
    };

    // The default first page must not skip the most recent hit.
    let page_one = ops::list_reviews(&state, ListTarget::Store, 42, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(page_one.list.len(), 2);
    assert_eq!(page_one.list[0].review_id, 1);

    // Page 2 of size 10 is offset 10, not 2.
    ops::list_reviews(
        &state,
        ListTarget::Store,
        43,
        PageQuery { page: 2, size: 10 },
    )
    .await
    .unwrap();

    let searches = h.search.searches();
    assert_eq!(searches[0].3, 0);
    assert_eq!(searches[1].3, 10);
}
