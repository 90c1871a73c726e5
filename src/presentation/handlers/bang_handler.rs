// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    Json,
};

use crate::{
    application::dto::search_request::AutocompleteParams,
    domain::{
        search::bang::{Bang, BangSuggestion},
        services::search_service::SearchService,
    },
    presentation::errors::AppError,
};

/// 列出所有 bang
pub async fn list_bangs(Extension(service): Extension<SearchService>) -> Json<Vec<Bang>> {
    Json(service.bangs())
}

/// bang 自动补全
pub async fn autocomplete(
    Extension(service): Extension<SearchService>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<Vec<BangSuggestion>>, AppError> {
    Ok(Json(service.autocomplete(params)?))
}
