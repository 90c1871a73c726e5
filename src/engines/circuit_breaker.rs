// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, gauge};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 熔断器配置
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitConfig {
    /// 连续失败多少次后打开
    pub failure_threshold: u32,
    /// 半开状态下成功多少次后关闭
    pub success_threshold: u32,
    /// 打开状态持续时间
    pub timeout: Duration,
    /// 半开状态下同时允许的探测请求数
    pub half_open_max_probes: u32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(30),
            half_open_max_probes: 1,
        }
    }
}

/// 熔断器状态枚举
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// 关闭状态
    Closed,
    /// 打开状态
    Open,
    /// 半开状态
    HalfOpen,
}

impl CircuitState {
    fn metric_value(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::Open => 1.0,
            CircuitState::HalfOpen => 0.5,
        }
    }
}

/// 熔断器拒绝或内部调用失败
#[derive(Debug, Error, PartialEq)]
pub enum CircuitError<E> {
    #[error("circuit open")]
    Open,
    #[error("{0}")]
    Inner(E),
}

/// 熔断器快照
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    /// 距离打开时刻的毫秒数
    pub open_for_ms: Option<u64>,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
    probes_in_flight: u32,
    last_probe_at: Option<Instant>,
}

/// 单个适配器的熔断器
///
/// 状态转换：
/// - Closed: 连续失败达到阈值后打开
/// - Open: 超时之前拒绝所有请求，超时后的第一次请求转为半开并作为探测
/// - HalfOpen: 探测令牌限制同时进行的探测数，成功达到阈值后关闭，任意一次失败重新打开
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                probes_in_flight: 0,
                last_probe_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    pub fn success_count(&self) -> u32 {
        self.inner.lock().success_count
    }

    pub fn opened_at(&self) -> Option<Instant> {
        self.inner.lock().opened_at
    }

    /// 是否允许请求通过
    ///
    /// 返回 true 时调用方必须在完成后调用 `record_success` 或 `record_failure`
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened| now.saturating_duration_since(opened))
                    .unwrap_or(self.config.timeout);
                if elapsed >= self.config.timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    inner.probes_in_flight = 1;
                    inner.last_probe_at = Some(now);
                    self.update_status_metric(CircuitState::HalfOpen);
                    info!(engine = %self.name, "Circuit half-open, probing");
                    true
                } else {
                    counter!("circuit_breaker_rejected_total", "engine" => self.name.clone())
                        .increment(1);
                    false
                }
            }
            CircuitState::HalfOpen => {
                // a probe that never reported back stops holding its token after `timeout`
                let stale = inner
                    .last_probe_at
                    .map(|at| now.saturating_duration_since(at) >= self.config.timeout)
                    .unwrap_or(true);
                if stale {
                    inner.probes_in_flight = 0;
                }

                if inner.probes_in_flight < self.config.half_open_max_probes.max(1) {
                    inner.probes_in_flight += 1;
                    inner.last_probe_at = Some(now);
                    true
                } else {
                    counter!("circuit_breaker_rejected_total", "engine" => self.name.clone())
                        .increment(1);
                    false
                }
            }
        }
    }

    /// 记录成功
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        counter!("circuit_breaker_successes_total", "engine" => self.name.clone()).increment(1);

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.opened_at = None;
                    inner.probes_in_flight = 0;
                    inner.last_probe_at = None;
                    self.update_status_metric(CircuitState::Closed);
                    info!(engine = %self.name, "Circuit closed");
                }
            }
            // late result from a call admitted before the circuit opened
            CircuitState::Open => {}
        }
    }

    /// 记录失败
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        counter!("circuit_breaker_failures_total", "engine" => self.name.clone()).increment(1);

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    self.trip(&mut inner);
                    warn!(
                        engine = %self.name,
                        failures = inner.failure_count,
                        "Circuit opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                self.trip(&mut inner);
                warn!(engine = %self.name, "Probe failed, circuit reopened");
            }
            CircuitState::Open => {
                debug!(engine = %self.name, "Failure recorded while open");
            }
        }
    }

    fn trip(&self, inner: &mut Inner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.success_count = 0;
        inner.probes_in_flight = 0;
        inner.last_probe_at = None;
        self.update_status_metric(CircuitState::Open);
    }

    /// 通过熔断器执行调用
    ///
    /// 熔断器拒绝时不调用 `f`，直接返回 `CircuitError::Open`
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.allow_request() {
            return Err(CircuitError::Open);
        }

        match f().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitError::Inner(e))
            }
        }
    }

    /// 强制关闭并清零计数
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.opened_at = None;
        inner.probes_in_flight = 0;
        inner.last_probe_at = None;
        self.update_status_metric(CircuitState::Closed);
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock();
        CircuitSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            open_for_ms: match inner.state {
                CircuitState::Closed => None,
                _ => inner
                    .opened_at
                    .map(|opened| opened.elapsed().as_millis() as u64),
            },
        }
    }

    fn update_status_metric(&self, status: CircuitState) {
        gauge!("circuit_breaker_status", "engine" => self.name.clone()).set(status.metric_value());
    }
}

/// 熔断器注册表
///
/// 每个适配器名称对应一个熔断器，首次访问时按默认配置创建，进程生命周期内保留
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    default_config: CircuitConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(default_config: CircuitConfig) -> Self {
        Self {
            breakers: RwLock::new(HashMap::new()),
            default_config,
        }
    }

    pub fn default_config(&self) -> &CircuitConfig {
        &self.default_config
    }

    /// 获取（必要时创建）指定适配器的熔断器
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.read().get(name) {
            return breaker.clone();
        }

        let mut breakers = self.breakers.write();
        breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.default_config.clone())))
            .clone()
    }

    /// 所有熔断器的快照，按名称排序
    pub fn get_all(&self) -> Vec<CircuitSnapshot> {
        let mut snapshots: Vec<CircuitSnapshot> = self
            .breakers
            .read()
            .values()
            .map(|breaker| breaker.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn reset_all(&self) {
        let breakers = self.breakers.read();
        for breaker in breakers.values() {
            breaker.reset();
        }
        info!(count = breakers.len(), "All circuits reset");
    }

    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
