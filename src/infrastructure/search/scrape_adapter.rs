// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::config::settings::ScrapeAdapterSettings;
use crate::domain::models::video::VideoResult;
use crate::domain::search::adapter::{AdapterError, AdapterFeature, SearchAdapter};
use crate::utils::url_utils::{absolutize, fill_search_template};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// 图片懒加载常用的属性，按优先级排列
const IMAGE_ATTRS: &[&str] = &["data-src", "data-thumb", "data-original", "src"];
const PREVIEW_ATTRS: &[&str] = &["data-preview", "data-mediabook", "data-src", "src", "href"];

/// 编译后的选择器
struct Selectors {
    item: Selector,
    title: Selector,
    url: Selector,
    thumbnail: Option<Selector>,
    preview: Option<Selector>,
    duration: Option<Selector>,
    views: Option<Selector>,
    rating: Option<Selector>,
    quality: Option<Selector>,
}

fn compile(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|e| AdapterError::Parse(format!("invalid selector '{}': {:?}", css, e)))
}

fn compile_opt(css: &Option<String>) -> Result<Option<Selector>, AdapterError> {
    css.as_deref().map(compile).transpose()
}

/// 基于 CSS 选择器的通用抓取适配器
///
/// 按配置中的 URL 模板抓取搜索页，再用选择器提取视频条目
pub struct ScrapeAdapter {
    name: String,
    display_name: String,
    tier: u8,
    search_url: String,
    features: Vec<AdapterFeature>,
    enabled: bool,
    selectors: Selectors,
    client: reqwest::Client,
}

impl ScrapeAdapter {
    pub fn new(settings: &ScrapeAdapterSettings) -> Result<Self, AdapterError> {
        let s = &settings.selectors;
        let selectors = Selectors {
            item: compile(&s.item)?,
            title: compile(&s.title)?,
            url: compile(&s.url)?,
            thumbnail: compile_opt(&s.thumbnail)?,
            preview: compile_opt(&s.preview)?,
            duration: compile_opt(&s.duration)?,
            views: compile_opt(&s.views)?,
            rating: compile_opt(&s.rating)?,
            quality: compile_opt(&s.quality)?,
        };

        // 模板必须能生成合法 URL
        Url::parse(&fill_search_template(&settings.search_url, "probe", 1))
            .map_err(|e| AdapterError::Parse(format!("invalid search_url: {}", e)))?;

        let client = reqwest::Client::builder()
            .user_agent(
                settings
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .build()
            .map_err(|e| AdapterError::Network(e.to_string()))?;

        Ok(Self {
            name: settings.name.trim().to_lowercase(),
            display_name: settings.display_name.clone(),
            tier: settings.tier.clamp(1, 5),
            search_url: settings.search_url.clone(),
            features: settings.features.clone(),
            enabled: settings.enabled,
            selectors,
            client,
        })
    }

    /// 给定查询和页码时实际请求的 URL
    pub fn search_url(&self, query: &str, page: u32) -> Result<Url, AdapterError> {
        Url::parse(&fill_search_template(&self.search_url, query, page))
            .map_err(|e| AdapterError::Parse(e.to_string()))
    }

    /// 解析搜索结果页（用于单元测试）
    ///
    /// 缺少标题或链接的条目会被跳过
    pub fn parse_results(&self, html: &str, base: &Url) -> Vec<VideoResult> {
        let document = Html::parse_document(html);
        let sel = &self.selectors;

        document
            .select(&sel.item)
            .filter_map(|item| {
                let title = select_text(item, &sel.title)?;
                let url = item
                    .select(&sel.url)
                    .next()
                    .and_then(|e| e.value().attr("href"))
                    .and_then(|href| absolutize(base, href))?;

                let mut video = VideoResult::new(&self.name, &self.display_name, title, url);

                if let Some(thumb) = select_attr(item, sel.thumbnail.as_ref(), IMAGE_ATTRS, base) {
                    video = video.with_thumbnail(thumb);
                }
                if let Some(preview) = select_attr(item, sel.preview.as_ref(), PREVIEW_ATTRS, base) {
                    video = video.with_preview_url(preview);
                }
                if let Some(duration) = sel.duration.as_ref().and_then(|s| select_text(item, s)) {
                    video = video.with_duration(duration);
                }
                if let Some(views) = sel.views.as_ref().and_then(|s| select_text(item, s)) {
                    video = video.with_views(views);
                }
                if let Some(rating) = sel
                    .rating
                    .as_ref()
                    .and_then(|s| select_text(item, s))
                    .and_then(|r| parse_rating(&r))
                {
                    video = video.with_rating(rating);
                }
                if let Some(quality) = sel.quality.as_ref().and_then(|s| select_text(item, s)) {
                    video = video.with_quality(quality);
                }
                Some(video)
            })
            .collect()
    }
}

fn select_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text = scope
        .select(selector)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn select_attr(
    scope: ElementRef<'_>,
    selector: Option<&Selector>,
    attrs: &[&str],
    base: &Url,
) -> Option<String> {
    let element = scope.select(selector?).next()?;
    attrs
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .find_map(|value| absolutize(base, value))
}

/// "85%" / "4.5" 形式的评分
fn parse_rating(raw: &str) -> Option<f32> {
    let cleaned = raw.trim().trim_end_matches('%').trim();
    cleaned.parse::<f32>().ok().filter(|r| r.is_finite() && *r >= 0.0)
}

#[async_trait]
impl SearchAdapter for ScrapeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn tier(&self) -> u8 {
        self.tier
    }

    fn is_available(&self) -> bool {
        self.enabled
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<VideoResult>, AdapterError> {
        let url = self.search_url(query, page)?;
        debug!(engine = %self.name, url = %url, "Fetching search page");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Upstream(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))?;

        Ok(self.parse_results(&html, &url))
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        self.features.contains(&feature)
    }
}
