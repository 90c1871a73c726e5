// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{harness, trip, Behavior, MockAdapter};
use searchrs::domain::models::search_query::SearchQuery;
use searchrs::domain::models::video::{StreamEvent, VideoResult};
use searchrs::engines::circuit_breaker::CircuitState;
use searchrs::infrastructure::search::engine_manager::EngineManagerConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn query(raw: &str) -> SearchQuery {
    SearchQuery::new(raw, 1, Vec::<String>::new()).unwrap()
}

async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn done_counts(events: &[StreamEvent]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for event in events {
        if let StreamEvent::Done { engine, .. } = event {
            *counts.entry(engine.clone()).or_insert(0) += 1;
        }
    }
    counts
}

fn results(events: &[StreamEvent]) -> Vec<&VideoResult> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Result { result } => Some(result),
            _ => None,
        })
        .collect()
}

/// 每个适配器恰好一个 done 事件，然后通道关闭
#[tokio::test]
async fn test_one_done_per_engine_then_close() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(2)));
    let b = Arc::new(MockAdapter::new("beta", Behavior::Fail));
    let g = Arc::new(MockAdapter::new("gamma", Behavior::Results(3)));
    let h = harness(EngineManagerConfig::default(), vec![a, b, g.clone()]);
    trip(&h.breakers, "gamma");

    let events = drain(h.manager.search_stream(&query("cats")).unwrap()).await;

    let counts = done_counts(&events);
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|c| *c == 1));
    assert_eq!(results(&events).len(), 2);
    assert_eq!(g.calls(), 0);
    assert!(!counts.contains_key(StreamEvent::ALL_ENGINES));
}

/// 适配器的结果都在它自己的 done 之前
#[tokio::test]
async fn test_results_precede_their_done() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(3)));
    let b = Arc::new(
        MockAdapter::new("beta", Behavior::Results(2)).with_delay(Duration::from_millis(30)),
    );
    let h = harness(EngineManagerConfig::default(), vec![a, b]);

    let events = drain(h.manager.search_stream(&query("cats")).unwrap()).await;

    for engine in ["alpha", "beta"] {
        let done_at = events
            .iter()
            .position(|e| matches!(e, StreamEvent::Done { engine: n, .. } if n == engine))
            .unwrap();
        let last_result = events
            .iter()
            .rposition(|e| matches!(e, StreamEvent::Result { result } if result.source == engine))
            .unwrap();
        assert!(last_result < done_at, "{} result after its done", engine);
    }
    assert_eq!(events.len(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_stream_timeout_emits_done() {
    let hang = Arc::new(MockAdapter::new("alpha", Behavior::Hang));
    let ok = Arc::new(MockAdapter::new("beta", Behavior::Results(1)));
    let config = EngineManagerConfig {
        engine_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let h = harness(config, vec![hang, ok]);

    let events = drain(h.manager.search_stream(&query("cats")).unwrap()).await;

    assert_eq!(done_counts(&events).len(), 2);
    assert_eq!(results(&events).len(), 1);
    assert_eq!(h.breakers.get("alpha").failure_count(), 1);
}

#[tokio::test]
async fn test_stream_dedupes_when_enabled() {
    let a = Arc::new(MockAdapter::new(
        "alpha",
        Behavior::Urls(vec!["https://shared.example.com/v/1", "https://alpha.example.com/v/2"]),
    ));
    let b = Arc::new(
        MockAdapter::new(
            "beta",
            Behavior::Urls(vec!["https://www.shared.example.com/v/1/?utm_source=beta"]),
        )
        .with_delay(Duration::from_millis(30)),
    );
    let h = harness(
        EngineManagerConfig {
            dedupe_results: true,
            ..Default::default()
        },
        vec![a, b],
    );

    let events = drain(h.manager.search_stream(&query("cats")).unwrap()).await;
    let found = results(&events);
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|r| r.source == "alpha"));
    assert_eq!(done_counts(&events).len(), 2);
}

#[tokio::test]
async fn test_stream_is_not_cached() {
    let a = Arc::new(MockAdapter::new("alpha", Behavior::Results(1)));
    let h = harness(EngineManagerConfig::default(), vec![a.clone()]);

    drain(h.manager.search_stream(&query("cats")).unwrap()).await;
    drain(h.manager.search_stream(&query("cats")).unwrap()).await;

    assert_eq!(a.calls(), 2);
    assert_eq!(h.cache.size(), 0);
}

/// 接收端丢弃后适配器任务被取消
#[tokio::test]
async fn test_dropping_receiver_cancels_adapters() {
    let hang = Arc::new(MockAdapter::new("alpha", Behavior::Hang));
    let h = harness(
        EngineManagerConfig {
            engine_timeout: Duration::from_secs(60),
            ..Default::default()
        },
        vec![hang.clone()],
    );

    let rx = h.manager.search_stream(&query("cats")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hang.calls(), 1);
    drop(rx);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let breaker = h.breakers.get("alpha");
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 0);
    // the adapter's Arc is released once its task is aborted
    assert_eq!(Arc::strong_count(&hang), 2);
}
