// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use validator::Validate;

use crate::application::dto::search_request::{AutocompleteParams, SearchParams};
use crate::domain::models::search_query::SearchQuery;
use crate::domain::models::video::{SearchResponse, StreamEvent};
use crate::domain::search::bang::{Bang, BangSuggestion};
use crate::infrastructure::cache::search_cache::CacheStats;
use crate::infrastructure::search::engine_manager::{CacheMode, EngineInfo, EngineManager};
use crate::utils::errors::SearchServiceError;

/// 搜索服务
///
/// HTTP 层与引擎管理器之间的薄层：校验参数、解析 bang，再交给管理器分发
#[derive(Clone)]
pub struct SearchService {
    manager: Arc<EngineManager>,
}

impl SearchService {
    pub fn new(manager: Arc<EngineManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &EngineManager {
        &self.manager
    }

    fn query_from(&self, params: &SearchParams) -> Result<SearchQuery, SearchServiceError> {
        params
            .validate()
            .map_err(|e| SearchServiceError::Validation(e.to_string()))?;
        self.manager
            .parse_query(&params.q, params.page(), &params.engine_list())
    }

    pub async fn search(&self, params: SearchParams) -> Result<SearchResponse, SearchServiceError> {
        let query = self.query_from(&params)?;
        info!(
            query = %query.query(),
            page = query.page(),
            engines = ?query.engines(),
            from_bang = query.from_bang(),
            "Search request"
        );

        let mode = if params.skip_cache() {
            CacheMode::WriteOnly
        } else {
            CacheMode::ReadWrite
        };
        self.manager.search_with(&query, mode).await
    }

    pub fn search_stream(
        &self,
        params: SearchParams,
    ) -> Result<mpsc::Receiver<StreamEvent>, SearchServiceError> {
        let query = self.query_from(&params)?;
        info!(query = %query.query(), page = query.page(), "Streaming search request");
        self.manager.search_stream(&query)
    }

    pub fn bangs(&self) -> Vec<Bang> {
        self.manager.bangs().list().to_vec()
    }

    pub fn autocomplete(
        &self,
        params: AutocompleteParams,
    ) -> Result<Vec<BangSuggestion>, SearchServiceError> {
        params
            .validate()
            .map_err(|e| SearchServiceError::Validation(e.to_string()))?;
        Ok(self.manager.bangs().autocomplete(&params.q, params.limit()))
    }

    pub fn engines(&self) -> Vec<EngineInfo> {
        self.manager.engine_infos()
    }

    pub fn reset_circuits(&self) {
        info!("Resetting all circuit breakers");
        self.manager.reset_circuits();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.manager.cache().stats()
    }
}
