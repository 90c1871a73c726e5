// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 搜索服务模块
///
/// 并发分发查询到各个适配器并聚合结果
pub mod deduplicator;
pub mod engine_manager;
pub mod scrape_adapter;

pub use engine_manager::{CacheMode, EngineInfo, EngineManager, EngineManagerConfig};
