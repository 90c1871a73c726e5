// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, http::StatusCode, Json};

use crate::{
    domain::services::search_service::SearchService,
    infrastructure::{cache::search_cache::CacheStats, search::engine_manager::EngineInfo},
};

/// 适配器列表，包含熔断器快照
pub async fn list_engines(Extension(service): Extension<SearchService>) -> Json<Vec<EngineInfo>> {
    Json(service.engines())
}

/// 重置所有熔断器
pub async fn reset_circuits(Extension(service): Extension<SearchService>) -> StatusCode {
    service.reset_circuits();
    StatusCode::NO_CONTENT
}

pub async fn cache_stats(Extension(service): Extension<SearchService>) -> Json<CacheStats> {
    Json(service.cache_stats())
}
