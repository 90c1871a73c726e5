// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, gauge};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::models::video::SearchResponse;

/// 搜索缓存配置
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCacheConfig {
    /// 条目存活时间
    pub ttl: Duration,
    /// 最大条目数
    pub max_size: usize,
}

impl Default for SearchCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_size: 1000,
        }
    }
}

/// 缓存键
///
/// 结构化键直接作为哈希表键使用；引擎集合排序存储，与选择顺序无关
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    page: u32,
    engines: BTreeSet<String>,
}

impl CacheKey {
    pub fn new<I, S>(query: &str, page: u32, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self {
            query,
            page,
            engines: engines
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn engines(&self) -> impl Iterator<Item = &str> {
        self.engines.iter().map(String::as_str)
    }

    /// 键的 SHA-256 摘要（用于日志）
    ///
    /// 每个字段带长度前缀，避免拼接歧义
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.query.len() as u64).to_be_bytes());
        hasher.update(self.query.as_bytes());
        hasher.update(self.page.to_be_bytes());
        hasher.update((self.engines.len() as u64).to_be_bytes());
        for engine in &self.engines {
            hasher.update((engine.len() as u64).to_be_bytes());
            hasher.update(engine.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub stores: u64,
    pub entries: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: SearchResponse,
    created_at: Instant,
}

/// 搜索结果缓存
///
/// - 读取时惰性过期：过期条目只被屏蔽，不在读取路径上删除
/// - 写入时容量满则批量淘汰最旧的约 10%（至少 1 个）
/// - 后台任务每 `ttl / 2` 清理一次过期条目
#[derive(Debug)]
pub struct SearchCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    config: SearchCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    stores: AtomicU64,
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(SearchCacheConfig::default())
    }
}

impl SearchCache {
    pub fn new(config: SearchCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            stores: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SearchCacheConfig {
        &self.config
    }

    /// 获取缓存值，过期或不存在时返回 None
    pub fn get(&self, key: &CacheKey) -> Option<SearchResponse> {
        let entries = self.entries.read();
        let hit = entries
            .get(key)
            .filter(|entry| entry.created_at.elapsed() <= self.config.ttl)
            .map(|entry| entry.response.clone());

        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            counter!("search_cache_hits_total").increment(1);
            debug!(key = %key.fingerprint(), "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            counter!("search_cache_misses_total").increment(1);
        }
        hit
    }

    /// 写入缓存值
    ///
    /// `max_size` 为 0 时不保存任何内容
    pub fn set(&self, key: CacheKey, response: SearchResponse) {
        if self.config.max_size == 0 {
            return;
        }
        let mut entries = self.entries.write();

        if !entries.contains_key(&key) && entries.len() >= self.config.max_size {
            let evicted = Self::evict_oldest(&mut entries);
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            counter!("search_cache_evictions_total").increment(evicted as u64);
            debug!(evicted, "Evicted oldest cache entries");
        }

        entries.insert(
            key,
            CacheEntry {
                response,
                created_at: Instant::now(),
            },
        );
        self.stores.fetch_add(1, Ordering::Relaxed);
        gauge!("search_cache_entries").set(entries.len() as f64);
    }

    /// 按创建时间淘汰最旧的约 10% 条目（至少 1 个）
    fn evict_oldest(entries: &mut HashMap<CacheKey, CacheEntry>) -> usize {
        if entries.is_empty() {
            return 0;
        }
        let to_evict = (entries.len() / 10).max(1);

        let mut by_age: Vec<(Instant, CacheKey)> = entries
            .iter()
            .map(|(key, entry)| (entry.created_at, key.clone()))
            .collect();
        by_age.sort_by_key(|(created_at, _)| *created_at);

        for (_, key) in by_age.into_iter().take(to_evict) {
            entries.remove(&key);
        }
        to_evict
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        gauge!("search_cache_entries").set(0.0);
        info!("Search cache cleared");
    }

    /// 当前条目数（包括已过期但尚未清理的）
    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    /// 删除所有过期条目，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let ttl = self.config.ttl;
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() <= ttl);
        let removed = before - entries.len();
        gauge!("search_cache_entries").set(entries.len() as f64);
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            entries: self.size(),
        }
    }

    /// 启动后台清理任务
    ///
    /// 任务只持有弱引用，缓存被释放后自动退出
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let period = (self.config.ttl / 2).max(Duration::from_millis(1));
        let cache: Weak<SearchCache> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                cache.purge_expired();
            }
            debug!("Cache sweeper stopped");
        })
    }
}
