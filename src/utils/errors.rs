// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 请求级错误
///
/// 只有这些情况会让边界层返回非 2xx 响应；单个适配器的失败不在此列
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error("No search engines available")]
    NoAdaptersAvailable,
}
