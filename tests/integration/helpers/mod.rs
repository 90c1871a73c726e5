// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum_test::TestServer;
use searchrs::domain::models::video::VideoResult;
use searchrs::domain::search::adapter::{AdapterError, AdapterFeature, SearchAdapter};
use searchrs::domain::search::bang::{Bang, BangParser};
use searchrs::domain::services::search_service::SearchService;
use searchrs::engines::circuit_breaker::{CircuitBreakerRegistry, CircuitConfig};
use searchrs::infrastructure::cache::search_cache::{SearchCache, SearchCacheConfig};
use searchrs::infrastructure::search::engine_manager::{EngineManager, EngineManagerConfig};
use searchrs::presentation::routes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 模拟适配器的行为
#[derive(Clone, Debug)]
pub enum Behavior {
    /// 返回 n 条结果
    Results(usize),
    /// 返回指向固定 URL 的结果
    Urls(Vec<&'static str>),
    /// 返回网络错误
    Fail,
    /// 一直挂起，直到被超时或取消
    Hang,
}

pub struct MockAdapter {
    name: String,
    tier: u8,
    delay: Duration,
    behavior: Behavior,
    features: Vec<AdapterFeature>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockAdapter {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            tier: 1,
            delay: Duration::from_millis(10),
            behavior,
            features: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_feature(mut self, feature: AdapterFeature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> u8 {
        self.tier
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<VideoResult>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match &self.behavior {
            Behavior::Results(n) => Ok((0..*n)
                .map(|i| {
                    VideoResult::new(
                        &self.name,
                        &self.name,
                        format!("{} #{}", query, i),
                        format!("https://{}.example.com/p{}/v{}", self.name, page, i),
                    )
                    .with_duration("10:00")
                })
                .collect()),
            Behavior::Urls(urls) => Ok(urls
                .iter()
                .map(|url| VideoResult::new(&self.name, &self.name, query, *url))
                .collect()),
            Behavior::Fail => Err(AdapterError::Network("connection refused".to_string())),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
        }
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        self.features.contains(&feature)
    }
}

/// 测试环境：管理器及其共享组件
pub struct TestHarness {
    pub manager: Arc<EngineManager>,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub cache: Arc<SearchCache>,
}

pub fn test_bangs() -> BangParser {
    BangParser::new(vec![
        Bang::new("a", "alpha", "Alpha"),
        Bang::new("b", "beta", "Beta"),
        Bang::new("g", "gamma", "Gamma"),
    ])
}

pub fn harness(config: EngineManagerConfig, adapters: Vec<Arc<MockAdapter>>) -> TestHarness {
    let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitConfig {
        failure_threshold: 3,
        success_threshold: 1,
        timeout: Duration::from_secs(30),
        half_open_max_probes: 1,
    }));
    let cache = Arc::new(SearchCache::new(SearchCacheConfig::default()));

    let mut manager = EngineManager::new(
        config,
        Arc::new(test_bangs()),
        breakers.clone(),
        cache.clone(),
    );
    for adapter in adapters {
        manager.register_adapter(adapter);
    }

    TestHarness {
        manager: Arc::new(manager),
        breakers,
        cache,
    }
}

/// 打开指定适配器的熔断器
pub fn trip(breakers: &CircuitBreakerRegistry, name: &str) {
    let breaker = breakers.get(name);
    for _ in 0..breaker.config().failure_threshold {
        breaker.record_failure();
    }
}

pub fn test_server(harness: &TestHarness) -> TestServer {
    let app = routes::app(SearchService::new(harness.manager.clone()));
    TestServer::new(app).unwrap()
}
