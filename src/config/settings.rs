// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::search::adapter::AdapterFeature;
use crate::domain::search::bang::Bang;
use crate::engines::circuit_breaker::CircuitConfig;
use crate::infrastructure::cache::search_cache::SearchCacheConfig;
use crate::infrastructure::search::engine_manager::EngineManagerConfig;

/// 应用程序配置设置
///
/// 包含服务器、搜索、缓存、熔断器、指标以及 bang 和抓取适配器定义
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 搜索分发配置
    pub search: SearchSettings,
    /// 缓存配置
    pub cache: CacheSettings,
    /// 熔断器配置
    pub circuit_breaker: CircuitBreakerSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
    /// 额外的 bang 定义
    #[serde(default)]
    pub bangs: Vec<BangSettings>,
    /// 抓取适配器定义
    #[serde(default)]
    pub adapters: Vec<ScrapeAdapterSettings>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 搜索配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// 单个适配器超时（毫秒）
    pub engine_timeout_ms: u64,
    pub results_per_page: u32,
    pub dedupe_results: bool,
    /// 流式事件通道容量
    pub stream_buffer: usize,
}

/// 缓存配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub enabled: bool,
    /// 条目存活时间（秒）
    pub ttl_secs: u64,
    pub max_size: usize,
}

/// 熔断器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    /// 断开后等待多久进入半开（秒）
    pub timeout_secs: u64,
    pub half_open_max_probes: u32,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    /// Prometheus 导出地址
    pub listen_addr: String,
}

/// 一条 bang 定义
#[derive(Debug, Clone, Deserialize)]
pub struct BangSettings {
    pub code: String,
    pub engine: String,
    pub display_name: String,
}

impl From<&BangSettings> for Bang {
    fn from(settings: &BangSettings) -> Self {
        Bang::new(&settings.code, &settings.engine, &settings.display_name)
    }
}

/// 抓取适配器定义
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeAdapterSettings {
    pub name: String,
    pub display_name: String,
    #[serde(default = "default_tier")]
    pub tier: u8,
    /// 搜索页 URL 模板，支持 `{query}` 与 `{page}`
    pub search_url: String,
    pub selectors: SelectorSettings,
    #[serde(default)]
    pub features: Vec<AdapterFeature>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// 抓取适配器的 CSS 选择器
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorSettings {
    /// 每个结果的容器
    pub item: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub views: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

fn default_tier() -> u8 {
    3
}

fn default_enabled() -> bool {
    true
}

impl From<&CircuitBreakerSettings> for CircuitConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        CircuitConfig {
            failure_threshold: settings.failure_threshold,
            success_threshold: settings.success_threshold,
            timeout: Duration::from_secs(settings.timeout_secs),
            half_open_max_probes: settings.half_open_max_probes,
        }
    }
}

impl From<&CacheSettings> for SearchCacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        SearchCacheConfig {
            ttl: Duration::from_secs(settings.ttl_secs),
            max_size: settings.max_size,
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 以及 `SEARCHRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SEARCHRS").separator("__"));

        builder.build()?.try_deserialize::<Self>()?.checked()
    }

    /// 只从内置默认值和指定文件加载
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Self>()?
            .checked()
    }

    /// 拒绝会破坏缓存容量上限或让清理任务空转的取值
    fn checked(self) -> Result<Self, ConfigError> {
        if self.cache.max_size == 0 {
            return Err(ConfigError::Message(
                "cache.max_size must be greater than 0".to_string(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Message(
                "cache.ttl_secs must be greater than 0".to_string(),
            ));
        }
        Ok(self)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("search.engine_timeout_ms", 10_000)?
            .set_default("search.results_per_page", 24)?
            .set_default("search.dedupe_results", false)?
            .set_default("search.stream_buffer", 256)?
            .set_default("cache.enabled", true)?
            .set_default("cache.ttl_secs", 300)?
            .set_default("cache.max_size", 1000)?
            .set_default("circuit_breaker.failure_threshold", 5)?
            .set_default("circuit_breaker.success_threshold", 2)?
            .set_default("circuit_breaker.timeout_secs", 30)?
            .set_default("circuit_breaker.half_open_max_probes", 1)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }

    pub fn engine_manager_config(&self) -> EngineManagerConfig {
        EngineManagerConfig {
            engine_timeout: Duration::from_millis(self.search.engine_timeout_ms),
            results_per_page: self.search.results_per_page,
            dedupe_results: self.search.dedupe_results,
            stream_buffer: self.search.stream_buffer,
            cache_enabled: self.cache.enabled,
        }
    }

    pub fn extra_bangs(&self) -> Vec<Bang> {
        self.bangs.iter().map(Bang::from).collect()
    }
}
