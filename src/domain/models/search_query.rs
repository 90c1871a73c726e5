// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::search::bang::BangParser;
use crate::utils::errors::SearchServiceError;

/// 一次请求的查询，构建后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    query: String,
    page: u32,
    engines: Vec<String>,
    from_bang: bool,
}

impl SearchQuery {
    /// 不做 bang 解析，直接构建查询
    ///
    /// `engines` 为空表示使用所有可用适配器
    pub fn new<I, S>(query: &str, page: u32, engines: I) -> Result<Self, SearchServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaned = query.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            return Err(SearchServiceError::EmptyQuery);
        }
        Ok(Self {
            raw: query.to_string(),
            query: cleaned,
            page: page.max(1),
            engines: normalize_engines(engines),
            from_bang: false,
        })
    }

    /// 解析原始查询中的 bang
    ///
    /// bang 选出的适配器优先于显式的 `engines` 参数
    pub fn parse<I, S>(
        raw: &str,
        page: u32,
        explicit_engines: I,
        bangs: &BangParser,
    ) -> Result<Self, SearchServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = bangs.parse(raw);
        if parsed.query.is_empty() {
            return Err(SearchServiceError::EmptyQuery);
        }

        let (engines, from_bang) = if parsed.engines.is_empty() {
            (normalize_engines(explicit_engines), false)
        } else {
            (parsed.engines, true)
        };

        Ok(Self {
            raw: raw.to_string(),
            query: parsed.query,
            page: page.max(1),
            engines,
            from_bang,
        })
    }

    /// 用户输入的原始文本
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 发送给适配器的查询
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn engines(&self) -> &[String] {
        &self.engines
    }

    pub fn from_bang(&self) -> bool {
        self.from_bang
    }
}

fn normalize_engines<I, S>(engines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for engine in engines {
        let name = engine.as_ref().trim().to_lowercase();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
