// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use url::Url;

use crate::domain::models::video::VideoResult;

/// 会被忽略的跟踪参数前缀
const TRACKING_PARAMS: &[&str] = &["utm_", "ref", "fbclid", "gclid", "src"];

/// 规范化 URL，用于跨适配器去重
///
/// 小写 scheme/host，去掉 `www.`、片段、跟踪参数和结尾斜杠。
/// 无法解析的 URL 原样去掉首尾空白后返回。
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| {
            let name = name.to_ascii_lowercase();
            !TRACKING_PARAMS.iter().any(|p| name.starts_with(p))
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let host = url
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_string())
        .unwrap_or_default();
    let path = url.path().trim_end_matches('/').to_string();

    match url.query() {
        Some(query) => format!("{}://{}{}?{}", url.scheme(), host, path, query),
        None => format!("{}://{}{}", url.scheme(), host, path),
    }
}

/// 结果去重器，先到先得
#[derive(Debug, Default)]
pub struct ResultDeduplicator {
    seen_urls: HashSet<String>,
}

impl ResultDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第一次见到该 URL 时返回 true
    pub fn admit(&mut self, result: &VideoResult) -> bool {
        self.seen_urls.insert(canonical_url(&result.url))
    }

    pub fn dedupe(&mut self, results: Vec<VideoResult>) -> Vec<VideoResult> {
        results.into_iter().filter(|r| self.admit(r)).collect()
    }
}
