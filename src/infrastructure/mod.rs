// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 缓存（cache）：带 TTL 的搜索结果缓存
/// - 指标（metrics）：Prometheus 导出
/// - 搜索（search）：引擎管理器、结果去重与抓取适配器
pub mod cache;
pub mod metrics;
pub mod search;
