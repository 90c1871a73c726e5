// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utils::parsing::{parse_duration, parse_views};

/// 单条视频搜索结果
///
/// 由适配器创建，之后只读
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VideoResult {
    /// URL + 来源的稳定哈希
    pub id: String,
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub duration: String,
    pub duration_seconds: i64,
    pub views: String,
    pub views_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    /// 适配器名称
    pub source: String,
    /// 适配器展示名称
    pub source_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VideoResult {
    pub fn new(
        source: impl Into<String>,
        source_display: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let url = url.into();
        Self {
            id: Self::make_id(&url, &source),
            title: title.into(),
            url,
            source,
            source_display: source_display.into(),
            ..Default::default()
        }
    }

    /// 生成结果 ID
    ///
    /// 同一 URL 在不同来源下会得到不同的 ID
    pub fn make_id(url: &str, source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update([0u8]);
        hasher.update(url.as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = thumbnail.into();
        self
    }

    pub fn with_preview_url(mut self, preview_url: impl Into<String>) -> Self {
        self.preview_url = Some(preview_url.into());
        self
    }

    /// 设置时长展示字符串，同时解析出秒数
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        let duration = duration.into();
        self.duration_seconds = parse_duration(&duration);
        self.duration = duration;
        self
    }

    /// 设置播放量展示字符串，同时解析出数值
    pub fn with_views(mut self, views: impl Into<String>) -> Self {
        let views = views.into();
        self.views_count = parse_views(&views);
        self.views = views;
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 分页信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub pages: u32,
}

/// 一次搜索请求的完整响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResponse {
    /// 用户输入的原始查询
    pub query: String,
    /// 去掉 bang 之后实际发送给适配器的查询
    pub search_query: String,
    /// 按到达顺序排列的结果
    pub results: Vec<VideoResult>,
    pub engines_used: Vec<String>,
    pub engines_failed: Vec<String>,
    pub search_time_ms: u64,
    pub cached: bool,
    pub pagination: Pagination,
}

/// 流式搜索事件
///
/// 序列化为 `{"result": {...}}` 或 `{"done": true, "engine": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StreamEvent {
    Result { result: VideoResult },
    Done { done: bool, engine: String },
}

impl StreamEvent {
    pub const ALL_ENGINES: &'static str = "all";

    pub fn result(result: VideoResult) -> Self {
        StreamEvent::Result { result }
    }

    pub fn done(engine: impl Into<String>) -> Self {
        StreamEvent::Done {
            done: true,
            engine: engine.into(),
        }
    }

    /// 整个流结束的终止标记
    pub fn all_done() -> Self {
        Self::done(Self::ALL_ENGINES)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StreamEvent::Done { .. })
    }
}
