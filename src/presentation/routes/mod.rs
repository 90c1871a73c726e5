// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::search_service::SearchService;
use crate::presentation::handlers::{bang_handler, engine_handler, search_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route("/api/v1/search", get(search_handler::search))
        .route("/api/v1/search/stream", get(search_handler::search_stream))
        .route("/api/v1/bangs", get(bang_handler::list_bangs))
        .route("/api/v1/bangs/autocomplete", get(bang_handler::autocomplete))
        .route("/api/v1/engines", get(engine_handler::list_engines))
        .route("/api/v1/engines/reset", post(engine_handler::reset_circuits))
        .route("/api/v1/cache/stats", get(engine_handler::cache_stats));

    Router::new().merge(public_routes).merge(api_routes)
}

/// 组装完整应用：路由 + 服务扩展 + 请求追踪
pub fn app(service: SearchService) -> Router {
    routes()
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
