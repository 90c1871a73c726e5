// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{harness, trip, Behavior, MockAdapter};
use searchrs::domain::models::search_query::SearchQuery;
use searchrs::domain::search::adapter::AdapterFeature;
use searchrs::engines::circuit_breaker::CircuitState;
use searchrs::infrastructure::search::engine_manager::EngineManagerConfig;
use searchrs::utils::errors::SearchServiceError;
use std::sync::Arc;
use std::time::Duration;

fn query(raw: &str) -> SearchQuery {
    SearchQuery::new(raw, 1, Vec::<String>::new()).unwrap()
}

/// 一个适配器成功、一个熔断，第二次请求命中缓存且不调用任何适配器
#[tokio::test]
async fn test_partial_failure_then_cache_hit() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(2)));
    let b = Arc::new(MockAdapter::new("beta", Behavior::Results(5)));
    let h = harness(EngineManagerConfig::default(), vec![a.clone(), b.clone()]);
    trip(&h.breakers, "beta");

    let first = h.manager.search(&query("cats")).await.unwrap();
    assert_eq!(first.engines_used, vec!["alpha".to_string()]);
    assert_eq!(first.engines_failed, vec!["beta".to_string()]);
    assert_eq!(first.results.len(), 2);
    assert!(!first.cached);
    assert_eq!(b.calls(), 0);

    let second = h.manager.search(&query("cats")).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.results, first.results);
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 0);
    assert_eq!(h.cache.stats().hits, 1);
}

#[tokio::test]
async fn test_cache_key_ignores_engine_order_and_case() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(1)));
    let b = Arc::new(MockAdapter::new("beta", Behavior::Results(1)));
    let h = harness(EngineManagerConfig::default(), vec![a.clone(), b.clone()]);

    let q1 = SearchQuery::new("Big  Cats", 1, ["alpha", "beta"]).unwrap();
    let q2 = SearchQuery::new("big cats", 1, ["BETA", "alpha"]).unwrap();

    h.manager.search(&q1).await.unwrap();
    let cached = h.manager.search(&q2).await.unwrap();

    assert!(cached.cached);
    assert_eq!(cached.query, "big cats");
    assert_eq!(a.calls(), 1);

    // other page is a different key
    let q3 = SearchQuery::new("big cats", 2, ["alpha", "beta"]).unwrap();
    assert!(!h.manager.search(&q3).await.unwrap().cached);
}

#[tokio::test]
async fn test_bang_selects_engine() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(1)));
    let b = Arc::new(MockAdapter::new("beta", Behavior::Results(1)));
    let h = harness(EngineManagerConfig::default(), vec![a.clone(), b.clone()]);

    let q = h
        .manager
        .parse_query("!b  dogs", 1, &["alpha".to_string()])
        .unwrap();
    let response = h.manager.search(&q).await.unwrap();

    assert_eq!(response.query, "!b  dogs");
    assert_eq!(response.search_query, "dogs");
    assert_eq!(response.engines_used, vec!["beta".to_string()]);
    assert_eq!(a.calls(), 0);
}

#[tokio::test]
async fn test_no_adapters_available() {
    let h = harness(EngineManagerConfig::default(), Vec::new());
    assert_eq!(
        h.manager.search(&query("cats")).await.unwrap_err(),
        SearchServiceError::NoAdaptersAvailable
    );
    assert!(matches!(
        h.manager.search_stream(&query("cats")),
        Err(SearchServiceError::NoAdaptersAvailable)
    ));
}

/// 所有候选都熔断时仍返回正常响应
#[tokio::test]
async fn test_all_circuits_open_is_not_an_error() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(1)));
    let h = harness(EngineManagerConfig::default(), vec![a.clone()]);
    trip(&h.breakers, "alpha");

    let response = h.manager.search(&query("cats")).await.unwrap();
    assert!(response.results.is_empty());
    assert!(response.engines_used.is_empty());
    assert_eq!(response.engines_failed, vec!["alpha".to_string()]);
    assert_eq!(a.calls(), 0);
}

#[tokio::test]
async fn test_repeated_failures_open_circuit() {
    let bad = Arc::new(MockAdapter::new("alpha", Behavior::Fail));
    let good = Arc::new(MockAdapter::new("beta", Behavior::Results(1)));
    let h = harness(EngineManagerConfig::default(), vec![bad.clone(), good]);

    for i in 0..3 {
        let q = query(&format!("cats {}", i));
        h.manager.search(&q).await.unwrap();
    }
    assert_eq!(h.breakers.get("alpha").state(), CircuitState::Open);
    assert_eq!(bad.calls(), 3);

    h.manager.search(&query("cats again")).await.unwrap();
    assert_eq!(bad.calls(), 3);

    h.manager.reset_circuits();
    assert_eq!(h.breakers.get("alpha").state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_slow_adapter_times_out_and_counts_as_failure() {
    let slow = Arc::new(MockAdapter::new("alpha", Behavior::Hang));
    let fast = Arc::new(MockAdapter::new("beta", Behavior::Results(3)));
    let config = EngineManagerConfig {
        engine_timeout: Duration::from_millis(500),
        ..Default::default()
    };
    let h = harness(config, vec![slow, fast]);

    let response = h.manager.search(&query("cats")).await.unwrap();
    assert_eq!(response.engines_used, vec!["beta".to_string()]);
    assert_eq!(response.engines_failed, vec!["alpha".to_string()]);
    assert_eq!(h.breakers.get("alpha").failure_count(), 1);
}

#[tokio::test]
async fn test_pagination_hint() {
    let paged = Arc::new(
        MockAdapter::new("alpha", Behavior::Results(2)).with_feature(AdapterFeature::Pagination),
    );
    let flat = Arc::new(MockAdapter::new("beta", Behavior::Results(1)));
    let h = harness(EngineManagerConfig::default(), vec![paged, flat]);

    let q = SearchQuery::new("cats", 3, Vec::<String>::new()).unwrap();
    let response = h.manager.search(&q).await.unwrap();
    assert_eq!(response.pagination.page, 3);
    assert_eq!(response.pagination.limit, 24);
    assert_eq!(response.pagination.total, 3);
    assert_eq!(response.pagination.pages, 4);

    let q = SearchQuery::new("cats", 1, ["beta"]).unwrap();
    let response = h.manager.search(&q).await.unwrap();
    assert_eq!(response.pagination.pages, 1);
}

#[tokio::test]
async fn test_cache_disabled() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(1)));
    let config = EngineManagerConfig {
        cache_enabled: false,
        ..Default::default()
    };
    let h = harness(config, vec![a.clone()]);

    h.manager.search(&query("cats")).await.unwrap();
    let second = h.manager.search(&query("cats")).await.unwrap();
    assert!(!second.cached);
    assert_eq!(a.calls(), 2);
    assert_eq!(h.cache.size(), 0);
}
