// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::form_urlencoded::byte_serialize;
use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 解析页面中抓到的链接或图片地址
///
/// 空值、`javascript:`、`data:` 以及无法解析的地址返回 None
pub fn absolutize(base_url: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "#" {
        return None;
    }
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("data:") {
        return None;
    }
    resolve_url(base_url, raw).ok().map(|u| u.to_string())
}

/// 填充搜索 URL 模板中的 `{query}` 与 `{page}` 占位符
pub fn fill_search_template(template: &str, query: &str, page: u32) -> String {
    let encoded: String = byte_serialize(query.as_bytes()).collect();
    template
        .replace("{query}", &encoded)
        .replace("{page}", &page.to_string())
}
