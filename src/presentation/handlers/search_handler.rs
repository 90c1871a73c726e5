// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};

use crate::{
    application::dto::search_request::SearchParams,
    domain::{
        models::video::{SearchResponse, StreamEvent},
        services::search_service::SearchService,
    },
    presentation::errors::AppError,
};

/// 处理阻塞式搜索请求
///
/// 等待所有适配器完成（或超时）后一次性返回聚合结果
pub async fn search(
    Extension(service): Extension<SearchService>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = service.search(params).await?;
    Ok(Json(response))
}

/// 处理流式搜索请求（SSE）
///
/// 每个事件的 data 是一个 JSON 对象：`{"result": {...}}` 或 `{"done": true, "engine": "..."}`，
/// 最后以 `{"done": true, "engine": "all"}` 结束。客户端断开后进行中的适配器任务会被取消
pub async fn search_stream(
    Extension(service): Extension<SearchService>,
    Query(params): Query<SearchParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let rx = service.search_stream(params)?;

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .chain(stream::once(async { StreamEvent::all_done() }))
    .map(|event| Event::default().json_data(&event));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
