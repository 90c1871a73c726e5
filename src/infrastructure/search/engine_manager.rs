// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::FutureExt;
use metrics::{counter, histogram};
use serde::Serialize;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::models::search_query::SearchQuery;
use crate::domain::models::video::{Pagination, SearchResponse, StreamEvent, VideoResult};
use crate::domain::search::adapter::{AdapterError, AdapterFeature, SearchAdapter};
use crate::domain::search::bang::BangParser;
use crate::engines::circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry, CircuitSnapshot};
use crate::infrastructure::cache::search_cache::{CacheKey, SearchCache};
use crate::infrastructure::search::deduplicator::ResultDeduplicator;
use crate::utils::errors::SearchServiceError;

/// 引擎管理器配置
#[derive(Debug, Clone, PartialEq)]
pub struct EngineManagerConfig {
    /// 单个适配器的超时时间
    pub engine_timeout: Duration,
    /// 分页信息中的每页条数
    pub results_per_page: u32,
    /// 是否按规范化 URL 去重
    pub dedupe_results: bool,
    /// 流式通道容量
    pub stream_buffer: usize,
    /// 是否启用缓存
    pub cache_enabled: bool,
}

impl Default for EngineManagerConfig {
    fn default() -> Self {
        Self {
            engine_timeout: Duration::from_secs(10),
            results_per_page: 24,
            dedupe_results: false,
            stream_buffer: 256,
            cache_enabled: true,
        }
    }
}

/// 缓存读取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// 先读缓存，成功后写回
    ReadWrite,
    /// 跳过读取，成功后仍写回
    WriteOnly,
}

/// 适配器信息（用于列表接口）
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: String,
    pub display_name: String,
    pub tier: u8,
    pub available: bool,
    pub features: Vec<AdapterFeature>,
    pub circuit: CircuitSnapshot,
}

/// 一个候选适配器的调度决定
enum Dispatch {
    Skip { name: String, reason: &'static str },
    Run {
        adapter: Arc<dyn SearchAdapter>,
        breaker: Arc<CircuitBreaker>,
    },
}

/// 单个适配器任务的结果
struct AdapterOutcome {
    name: String,
    paginates: bool,
    result: Result<Vec<VideoResult>, AdapterError>,
}

/// 引擎管理器
///
/// 持有已注册的适配器，把一次查询并发分发给多个适配器，
/// 结合熔断器和超时保护自身，并通过缓存避免重复请求
pub struct EngineManager {
    adapters: Vec<Arc<dyn SearchAdapter>>,
    bangs: Arc<BangParser>,
    breakers: Arc<CircuitBreakerRegistry>,
    cache: Arc<SearchCache>,
    config: EngineManagerConfig,
}

impl EngineManager {
    pub fn new(
        config: EngineManagerConfig,
        bangs: Arc<BangParser>,
        breakers: Arc<CircuitBreakerRegistry>,
        cache: Arc<SearchCache>,
    ) -> Self {
        Self {
            adapters: Vec::new(),
            bangs,
            breakers,
            cache,
            config,
        }
    }

    /// 注册适配器，同名适配器会被替换
    pub fn register_adapter(&mut self, adapter: Arc<dyn SearchAdapter>) {
        let name = adapter.name().to_string();
        if let Some(pos) = self.adapters.iter().position(|a| a.name() == name) {
            warn!(engine = %name, "Adapter registered twice, replacing");
            self.adapters[pos] = adapter;
        } else {
            self.adapters.push(adapter);
        }
        info!(engine = %name, "Search adapter registered");
    }

    pub fn register_adapters(&mut self, adapters: Vec<Arc<dyn SearchAdapter>>) {
        for adapter in adapters {
            self.register_adapter(adapter);
        }
    }

    pub fn adapters(&self) -> &[Arc<dyn SearchAdapter>] {
        &self.adapters
    }

    pub fn adapter(&self, name: &str) -> Option<Arc<dyn SearchAdapter>> {
        self.adapters.iter().find(|a| a.name() == name).cloned()
    }

    pub fn bangs(&self) -> &BangParser {
        &self.bangs
    }

    pub fn breakers(&self) -> &CircuitBreakerRegistry {
        &self.breakers
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineManagerConfig {
        &self.config
    }

    /// 解析原始查询（含 bang）
    pub fn parse_query(
        &self,
        raw: &str,
        page: u32,
        engines: &[String],
    ) -> Result<SearchQuery, SearchServiceError> {
        SearchQuery::parse(raw, page, engines, &self.bangs)
    }

    /// 所有适配器的信息，按层级排序
    pub fn engine_infos(&self) -> Vec<EngineInfo> {
        self.sorted_by_tier(self.adapters.iter().cloned().collect())
            .into_iter()
            .map(|adapter| EngineInfo {
                name: adapter.name().to_string(),
                display_name: adapter.display_name().to_string(),
                tier: adapter.tier(),
                available: adapter.is_available(),
                features: AdapterFeature::ALL
                    .into_iter()
                    .filter(|f| adapter.supports_feature(*f))
                    .collect(),
                circuit: self.breakers.get(adapter.name()).snapshot(),
            })
            .collect()
    }

    pub fn reset_circuits(&self) {
        self.breakers.reset_all();
    }

    fn sorted_by_tier(&self, mut adapters: Vec<Arc<dyn SearchAdapter>>) -> Vec<Arc<dyn SearchAdapter>> {
        adapters.sort_by_key(|a| a.tier());
        adapters
    }

    /// 解析候选适配器
    ///
    /// 显式选择时按选择顺序，未知名称忽略；否则取所有可用适配器，按层级排序
    fn resolve_candidates(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<Arc<dyn SearchAdapter>>, SearchServiceError> {
        let candidates: Vec<Arc<dyn SearchAdapter>> = if query.engines().is_empty() {
            self.sorted_by_tier(
                self.adapters
                    .iter()
                    .filter(|a| a.is_available())
                    .cloned()
                    .collect(),
            )
        } else {
            query
                .engines()
                .iter()
                .filter_map(|name| {
                    let adapter = self.adapter(name);
                    if adapter.is_none() {
                        debug!(engine = %name, "Unknown engine in selection, ignoring");
                    }
                    adapter
                })
                .collect()
        };

        if candidates.is_empty() {
            warn!(query = %query.query(), "No adapters available for query");
            return Err(SearchServiceError::NoAdaptersAvailable);
        }
        Ok(candidates)
    }

    /// 为每个候选适配器决定跳过还是执行
    fn plan(&self, query: &SearchQuery) -> Result<Vec<Dispatch>, SearchServiceError> {
        let candidates = self.resolve_candidates(query)?;

        Ok(candidates
            .into_iter()
            .map(|adapter| {
                let name = adapter.name().to_string();
                if !adapter.is_available() {
                    return Dispatch::Skip {
                        name,
                        reason: "unavailable",
                    };
                }
                let breaker = self.breakers.get(&name);
                if !breaker.allow_request() {
                    return Dispatch::Skip {
                        name,
                        reason: "circuit open",
                    };
                }
                Dispatch::Run { adapter, breaker }
            })
            .collect())
    }

    fn cache_key(query: &SearchQuery) -> CacheKey {
        CacheKey::new(query.query(), query.page(), query.engines())
    }

    /// 阻塞式聚合搜索
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchServiceError> {
        self.search_with(query, CacheMode::ReadWrite).await
    }

    /// 跳过缓存读取的聚合搜索，成功结果仍会写回缓存
    pub async fn search_uncached(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchResponse, SearchServiceError> {
        self.search_with(query, CacheMode::WriteOnly).await
    }

    pub async fn search_with(
        &self,
        query: &SearchQuery,
        mode: CacheMode,
    ) -> Result<SearchResponse, SearchServiceError> {
        counter!("search_requests_total", "mode" => "blocking").increment(1);
        let started = Instant::now();
        let key = Self::cache_key(query);

        if self.config.cache_enabled && mode == CacheMode::ReadWrite {
            if let Some(mut cached) = self.cache.get(&key) {
                info!(query = %query.query(), page = query.page(), "Serving search from cache");
                cached.query = query.raw().to_string();
                cached.search_query = query.query().to_string();
                cached.cached = true;
                return Ok(cached);
            }
        }

        let plan = self.plan(query)?;

        let mut engines_used: Vec<String> = Vec::new();
        let mut engines_failed: Vec<String> = Vec::new();
        let mut results: Vec<VideoResult> = Vec::new();
        let mut has_more = false;
        let mut pending: HashSet<String> = HashSet::new();
        let mut tasks: JoinSet<AdapterOutcome> = JoinSet::new();

        for dispatch in plan {
            match dispatch {
                Dispatch::Skip { name, reason } => {
                    debug!(engine = %name, reason, "Skipping adapter");
                    engines_failed.push(name);
                }
                Dispatch::Run { adapter, breaker } => {
                    pending.insert(adapter.name().to_string());
                    tasks.spawn(run_adapter(
                        adapter,
                        breaker,
                        query.query().to_string(),
                        query.page(),
                        self.config.engine_timeout,
                    ));
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Adapter task did not complete");
                    continue;
                }
            };
            pending.remove(&outcome.name);

            match outcome.result {
                Ok(found) => {
                    has_more |= outcome.paginates && !found.is_empty();
                    results.extend(found);
                    engines_used.push(outcome.name);
                }
                Err(_) => engines_failed.push(outcome.name),
            }
        }
        // tasks that never reported back
        engines_failed.extend(pending);

        if self.config.dedupe_results {
            results = ResultDeduplicator::new().dedupe(results);
        }

        let total = results.len() as u32;
        let response = SearchResponse {
            query: query.raw().to_string(),
            search_query: query.query().to_string(),
            results,
            engines_used,
            engines_failed,
            search_time_ms: started.elapsed().as_millis() as u64,
            cached: false,
            pagination: Pagination {
                page: query.page(),
                limit: self.config.results_per_page,
                total,
                pages: if has_more {
                    query.page() + 1
                } else {
                    query.page()
                },
            },
        };

        info!(
            query = %query.query(),
            page = query.page(),
            results = response.results.len(),
            used = response.engines_used.len(),
            failed = response.engines_failed.len(),
            elapsed_ms = response.search_time_ms,
            "Search completed"
        );

        if self.config.cache_enabled && !response.engines_used.is_empty() {
            self.cache.set(key, response.clone());
        }

        Ok(response)
    }

    /// 流式搜索
    ///
    /// 每个适配器的结果一解析完就以 `result` 事件发出，随后发出该适配器的 `done` 事件。
    /// 所有适配器都发出 `done` 后通道关闭；接收端被丢弃时中止所有进行中的适配器任务。
    /// 终止标记 `{done, engine: "all"}` 由调用方在通道关闭后发出。
    pub fn search_stream(
        &self,
        query: &SearchQuery,
    ) -> Result<mpsc::Receiver<StreamEvent>, SearchServiceError> {
        counter!("search_requests_total", "mode" => "stream").increment(1);
        let plan = self.plan(query)?;

        let buffer = self.config.stream_buffer.max(1);
        let (tx, rx) = mpsc::channel::<StreamEvent>(buffer);
        let (inner_tx, mut inner_rx) = mpsc::channel::<StreamEvent>(buffer);

        let mut skipped: Vec<String> = Vec::new();
        let mut pending: HashSet<String> = HashSet::new();
        let mut tasks: JoinSet<()> = JoinSet::new();

        for dispatch in plan {
            match dispatch {
                Dispatch::Skip { name, reason } => {
                    debug!(engine = %name, reason, "Skipping adapter");
                    skipped.push(name);
                }
                Dispatch::Run { adapter, breaker } => {
                    let name = adapter.name().to_string();
                    pending.insert(name.clone());
                    let events = inner_tx.clone();
                    let search = run_adapter(
                        adapter,
                        breaker,
                        query.query().to_string(),
                        query.page(),
                        self.config.engine_timeout,
                    );
                    tasks.spawn(async move {
                        let outcome = search.await;
                        if let Ok(found) = outcome.result {
                            for video in found {
                                if events.send(StreamEvent::result(video)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        let _ = events.send(StreamEvent::done(name)).await;
                    });
                }
            }
        }
        drop(inner_tx);

        let dedupe = self.config.dedupe_results;
        let query_text = query.query().to_string();

        tokio::spawn(async move {
            for name in skipped {
                if tx.send(StreamEvent::done(name)).await.is_err() {
                    tasks.abort_all();
                    return;
                }
            }

            let mut dedup = dedupe.then(ResultDeduplicator::new);
            while !pending.is_empty() {
                tokio::select! {
                    _ = tx.closed() => {
                        debug!(query = %query_text, "Stream receiver dropped, aborting adapters");
                        tasks.abort_all();
                        return;
                    }
                    event = inner_rx.recv() => {
                        let Some(event) = event else {
                            break;
                        };
                        match &event {
                            StreamEvent::Done { engine, .. } => {
                                pending.remove(engine);
                            }
                            StreamEvent::Result { result } => {
                                if let Some(dedup) = dedup.as_mut() {
                                    if !dedup.admit(result) {
                                        continue;
                                    }
                                }
                            }
                        }
                        if tx.send(event).await.is_err() {
                            tasks.abort_all();
                            return;
                        }
                    }
                }
            }

            // adapters whose task ended without reporting
            for name in pending {
                if tx.send(StreamEvent::done(name)).await.is_err() {
                    break;
                }
            }
            debug!(query = %query_text, "Stream finished");
        });

        Ok(rx)
    }
}

/// 在超时和 panic 保护下执行一次适配器搜索，并把结果记录到熔断器
async fn run_adapter(
    adapter: Arc<dyn SearchAdapter>,
    breaker: Arc<CircuitBreaker>,
    query: String,
    page: u32,
    timeout: Duration,
) -> AdapterOutcome {
    let name = adapter.name().to_string();
    let paginates = adapter.supports_feature(AdapterFeature::Pagination);
    let started = Instant::now();

    let guarded = AssertUnwindSafe(tokio::time::timeout(timeout, adapter.search(&query, page)))
        .catch_unwind()
        .await;

    let result = match guarded {
        Ok(Ok(Ok(found))) => Ok(found),
        Ok(Ok(Err(e))) => Err(e),
        Ok(Err(_)) => Err(AdapterError::Timeout(timeout.as_millis() as u64)),
        Err(panic) => Err(AdapterError::Panicked(panic_message(panic.as_ref()))),
    };

    let elapsed = started.elapsed();
    histogram!("engine_search_duration_seconds", "engine" => name.clone())
        .record(elapsed.as_secs_f64());

    match &result {
        Ok(found) => {
            breaker.record_success();
            counter!("engine_requests_total", "engine" => name.clone(), "outcome" => "success")
                .increment(1);
            info!(
                engine = %name,
                results = found.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Adapter returned results"
            );
        }
        Err(e) => {
            breaker.record_failure();
            counter!("engine_requests_total", "engine" => name.clone(), "outcome" => "failure")
                .increment(1);
            warn!(engine = %name, error = %e, "Adapter failed");
        }
    }

    AdapterOutcome {
        name,
        paginates,
        result,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
