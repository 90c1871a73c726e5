// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 搜索接口的查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct SearchParams {
    #[serde(default)]
    #[validate(length(min = 1, max = 512, message = "Query must be 1-512 characters"))]
    pub q: String,
    #[validate(range(min = 1, max = 1000))]
    pub page: Option<u32>,
    /// 逗号分隔的适配器名称
    pub engines: Option<String>,
    /// "1" 或 "true" 时跳过缓存读取
    pub nocache: Option<String>,
}

impl SearchParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn engine_list(&self) -> Vec<String> {
        self.engines
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn skip_cache(&self) -> bool {
        matches!(
            self.nocache.as_deref().map(str::trim),
            Some("1") | Some("true") | Some("TRUE") | Some("True")
        )
    }
}

/// bang 自动补全参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

impl AutocompleteParams {
    pub const DEFAULT_LIMIT: usize = 8;

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}
