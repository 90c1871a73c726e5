// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bang 定义：`!code` 选择一个适配器
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bang {
    /// 短码，不含 `!`，小写
    pub code: String,
    /// 对应的适配器名称
    pub engine: String,
    /// 展示名称
    pub display_name: String,
}

impl Bang {
    pub fn new(
        code: impl Into<String>,
        engine: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            code: normalize_code(&code.into()),
            engine: engine.into(),
            display_name: display_name.into(),
        }
    }
}

/// 自动补全候选
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BangSuggestion {
    /// 带 `!` 前缀的完整 bang，例如 `!ph`
    pub bang: String,
    pub engine: String,
    pub display_name: String,
}

/// Bang 解析结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedBangs {
    /// 去掉 bang 之后的查询
    pub query: String,
    /// 按首次出现顺序去重后的适配器名称
    pub engines: Vec<String>,
    pub has_bang: bool,
}

const DEFAULT_BANGS: &[(&str, &str, &str)] = &[
    ("ph", "pornhub", "Pornhub"),
    ("xv", "xvideos", "XVideos"),
    ("xh", "xhamster", "xHamster"),
    ("xn", "xnxx", "XNXX"),
    ("rt", "redtube", "RedTube"),
    ("yp", "youporn", "YouPorn"),
    ("sb", "spankbang", "SpankBang"),
    ("ep", "eporner", "Eporner"),
    ("t8", "tube8", "Tube8"),
    ("mo", "motherless", "Motherless"),
    ("tnf", "tnaflix", "TNAFlix"),
    ("em", "empflix", "EMPFlix"),
    ("hq", "hqporner", "HQPorner"),
    ("ym", "youjizz", "YouJizz"),
    ("dx", "drtuber", "DrTuber"),
    ("sx", "sunporno", "SunPorno"),
    ("tx", "txxx", "TXXX"),
    ("hc", "hclips", "HClips"),
    ("fq", "fapster", "Fapster"),
    ("pt", "porntrex", "PornTrex"),
];

fn normalize_code(code: &str) -> String {
    code.trim().trim_start_matches('!').to_lowercase()
}

/// Bang 解析器
///
/// 进程启动时构建一次的不可变表，所有方法都是纯函数
#[derive(Debug, Clone)]
pub struct BangParser {
    bangs: Vec<Bang>,
    by_code: HashMap<String, usize>,
}

impl Default for BangParser {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl BangParser {
    /// 从给定条目构建解析器，重复短码以第一次出现的为准
    pub fn new(bangs: impl IntoIterator<Item = Bang>) -> Self {
        let mut table = Vec::new();
        let mut by_code = HashMap::new();
        for bang in bangs {
            if bang.code.is_empty() || by_code.contains_key(&bang.code) {
                continue;
            }
            by_code.insert(bang.code.clone(), table.len());
            table.push(bang);
        }
        Self {
            bangs: table,
            by_code,
        }
    }

    /// 内置 bang 表
    pub fn with_defaults() -> Self {
        Self::new(Self::default_bangs())
    }

    pub fn default_bangs() -> Vec<Bang> {
        DEFAULT_BANGS
            .iter()
            .map(|(code, engine, display)| Bang::new(*code, *engine, *display))
            .collect()
    }

    /// 内置表加上额外条目
    pub fn with_extra(extra: impl IntoIterator<Item = Bang>) -> Self {
        Self::new(Self::default_bangs().into_iter().chain(extra))
    }

    /// 查找短码（大小写不敏感，可带 `!`）
    pub fn resolve(&self, code: &str) -> Option<&Bang> {
        self.by_code
            .get(&normalize_code(code))
            .map(|idx| &self.bangs[*idx])
    }

    /// 解析查询中的 bang
    ///
    /// 命中的 `!token` 从查询中移除；未知的 `!token` 原样保留
    pub fn parse(&self, query: &str) -> ParsedBangs {
        let mut kept: Vec<&str> = Vec::new();
        let mut engines: Vec<String> = Vec::new();
        let mut has_bang = false;

        for token in query.split_whitespace() {
            let bang = token
                .strip_prefix('!')
                .filter(|code| !code.is_empty())
                .and_then(|code| self.resolve(code));

            match bang {
                Some(bang) => {
                    has_bang = true;
                    if !engines.contains(&bang.engine) {
                        engines.push(bang.engine.clone());
                    }
                }
                None => kept.push(token),
            }
        }

        ParsedBangs {
            query: kept.join(" "),
            engines,
            has_bang,
        }
    }

    /// 全部 bang，顺序稳定
    pub fn list(&self) -> &[Bang] {
        &self.bangs
    }

    /// 按前缀补全 bang
    ///
    /// 排序：整体前缀 > 单词前缀 > 子串，同级时展示名称短的在前
    pub fn autocomplete(&self, prefix: &str, limit: usize) -> Vec<BangSuggestion> {
        if limit == 0 {
            return Vec::new();
        }
        let needle = normalize_code(prefix);

        let mut ranked: Vec<(u8, usize, usize, &Bang)> = self
            .bangs
            .iter()
            .enumerate()
            .filter_map(|(idx, bang)| {
                match_rank(bang, &needle).map(|rank| (rank, bang.display_name.len(), idx, bang))
            })
            .collect();
        ranked.sort_by_key(|(rank, len, idx, _)| (*rank, *len, *idx));

        ranked
            .into_iter()
            .take(limit)
            .map(|(_, _, _, bang)| BangSuggestion {
                bang: format!("!{}", bang.code),
                engine: bang.engine.clone(),
                display_name: bang.display_name.clone(),
            })
            .collect()
    }
}

fn match_rank(bang: &Bang, needle: &str) -> Option<u8> {
    if needle.is_empty() {
        return Some(0);
    }
    let display = bang.display_name.to_lowercase();

    if bang.code.starts_with(needle) || display.starts_with(needle) {
        return Some(0);
    }
    if display
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_' || c == '.')
        .any(|word| word.starts_with(needle))
    {
        return Some(1);
    }
    if bang.code.contains(needle) || display.contains(needle) {
        return Some(2);
    }
    None
}
